pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{LifyError, Result};
pub use types::{Bounds, EntityId, Rect, Vec2};
