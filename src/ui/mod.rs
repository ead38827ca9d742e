//! Concrete presentations

pub mod headless;
pub mod terminal;

pub use headless::HeadlessPresentation;
pub use terminal::TerminalPresentation;
