//! Process configuration
//!
//! Everything the binary needs before the first scene starts: window
//! settings, world size, population parameters, the viewport and the asset
//! manifest. Every field has a default, so an empty (or missing) TOML file
//! yields a runnable configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::board::assets::{AssetKind, AssetSpec};
use crate::core::error::{LifyError, Result};
use crate::core::types::{Bounds, Vec2, MAX_EXTENT};

/// Logical name of the font used for status text
pub const ASSET_FONT_INFO: &str = "font_info";

/// Logical name of the herb sprite
pub const ASSET_HERB_1: &str = "herb_1";

/// Smallest accepted spatial hash cell, in world units
pub const MIN_CELL_SIZE: f32 = 1.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ui: UiConfig,
    pub board: BoardConfig,
    pub population: PopulationConfig,
    pub viewport: ViewportConfig,
    pub assets: AssetsConfig,
}

/// Window and frame pump settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Screen width in pixels; also the viewport width
    pub width: u32,
    /// Screen height in pixels; also the viewport height
    pub height: u32,
    pub fullscreen: bool,
    pub title: String,
    /// Input/update ticks per second
    pub frame_rate: u32,
    /// Redraws per second
    pub draw_frame_rate: u32,
    /// Only redraw when something changed since the last frame
    pub track_input_changes: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fullscreen: true,
            title: "Lify Simulator".to_string(),
            frame_rate: 60,
            draw_frame_rate: 60,
            track_input_changes: true,
        }
    }
}

/// World extents and spatial index tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: u32,
    pub height: u32,
    /// Size of each cell in the spatial hash grid (world units)
    ///
    /// Roughly a few sprite widths. Smaller cells mean more empty cells
    /// visited per range query; larger cells mean more entities filtered.
    pub cell_size: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 6000,
            height: 4000,
            cell_size: 64.0,
        }
    }
}

impl BoardConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

/// Initial population generated during the loading phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub count: usize,
    /// Fixed seed for reproducible worlds; a random seed is drawn when absent
    pub seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            seed: None,
        }
    }
}

/// Top-left corner of the world window shown while running
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub x: f32,
    pub y: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            x: 2000.0,
            y: 300.0,
        }
    }
}

impl ViewportConfig {
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Asset manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory the entry paths are relative to
    pub root: PathBuf,
    pub entries: Vec<AssetSpec>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            entries: vec![
                AssetSpec::new(ASSET_FONT_INFO, AssetKind::Font, "fonts/info.ttf"),
                AssetSpec::new(ASSET_HERB_1, AssetKind::Image, "images/herb_1.png"),
            ],
        }
    }
}

impl AppConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.ui.width == 0 || self.ui.height == 0 {
            return Err(LifyError::Config(format!(
                "screen size must be non-zero, got {}x{}",
                self.ui.width, self.ui.height
            )));
        }

        if self.ui.frame_rate == 0 || self.ui.draw_frame_rate == 0 {
            return Err(LifyError::Config("frame rates must be positive".into()));
        }

        if self.board.bounds().is_empty() {
            return Err(LifyError::Config(format!(
                "board size must be non-zero, got {}x{}",
                self.board.width, self.board.height
            )));
        }

        if self.board.width > MAX_EXTENT || self.board.height > MAX_EXTENT {
            return Err(LifyError::Config(format!(
                "board size {}x{} exceeds the {} limit per axis",
                self.board.width, self.board.height, MAX_EXTENT
            )));
        }

        if !(self.board.cell_size.is_finite() && self.board.cell_size >= MIN_CELL_SIZE) {
            return Err(LifyError::Config(format!(
                "cell_size must be at least {}, got {}",
                MIN_CELL_SIZE, self.board.cell_size
            )));
        }

        let mut names = HashSet::new();
        for entry in &self.assets.entries {
            if !names.insert(entry.name.as_str()) {
                return Err(LifyError::Config(format!(
                    "duplicate asset name '{}'",
                    entry.name
                )));
            }
        }

        Ok(())
    }
}
