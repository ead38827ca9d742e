//! Scene layer: presentation seam, input bindings, the background
//! population task and the state machine that sequences them.

pub mod controller;
pub mod input;
pub mod population;
pub mod presentation;
pub mod runner;

pub use controller::{Phase, SceneController, SceneSettings};
pub use input::{BindingTable, Command, Key, KeyPattern, QUIT_KEY};
pub use population::{PopulationPlan, PopulationReport, PopulationTask, QuitSignal, TaskStatus};
pub use presentation::{Color, DrawId, DrawStack, Drawable, Layer, Presentation, Sprite, Surface, Text};
pub use runner::FramePump;
