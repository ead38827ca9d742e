//! Lify - life simulation visualizer core

pub mod board;
pub mod core;
pub mod entity;
pub mod scene;
pub mod spatial;
pub mod ui;
