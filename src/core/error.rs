use thiserror::Error;

use crate::core::types::EntityId;

#[derive(Error, Debug)]
pub enum LifyError {
    #[error("Failed to load asset {name:?}: {reason}")]
    AssetLoad { name: String, reason: String },

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Position ({x}, {y}) is outside board bounds {width}x{height}")]
    OutOfBounds {
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    },

    #[error("Duplicate entity id: {0}")]
    DuplicateId(EntityId),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, LifyError>;
