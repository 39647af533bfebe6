//! User-facing configuration.
//!
//! Everything here deserializes from TOML with `#[serde(default)]`, so a
//! partial file only overrides what it names. File discovery and hot reload
//! live in the renderer crate; this module only parses.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::{AntialiasingMode, MiscSettings};

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub font: FontConfig,
    pub atlas: AtlasConfig,
    pub misc: MiscSettings,
}

/// Font configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: Option<String>,
    pub size: f32,
    /// OpenType features to enable/disable during text shaping.
    ///
    /// Each string is a 4-character feature tag, optionally prefixed with `-`
    /// to disable. `"-liga"` also turns off ligature overlap splitting.
    pub features: Vec<String>,
    pub antialiasing: AntialiasingMode,
    pub color_glyphs: bool,
    /// Draw box drawing, block and braille characters procedurally.
    pub builtin_glyphs: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: None,
            size: 14.0,
            features: vec!["calt".to_owned(), "liga".to_owned()],
            antialiasing: AntialiasingMode::Grayscale,
            color_glyphs: true,
            builtin_glyphs: true,
        }
    }
}

/// Atlas growth tuning.
///
/// The atlas area is `clamp(min(target * viewport_headroom,
/// max(cell * font_cells, packed * growth_factor)), min_area, max²)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Smallest atlas area in texels.
    pub min_area: u64,
    /// Caps the device limit on either texture dimension.
    pub max_dimension: Option<u32>,
    /// Cells worth of glyphs the atlas should hold at minimum.
    pub font_cells: u64,
    /// Multiplier applied to the current atlas area on a reset.
    pub growth_factor: u64,
    /// Ceiling relative to the render target area.
    pub viewport_headroom: f64,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            min_area: 1024 * 1024,
            max_dimension: None,
            font_cells: 95,
            growth_factor: 2,
            viewport_headroom: 1.25,
        }
    }
}

/// Errors from reading or parsing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
