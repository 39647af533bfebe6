//! Render settings and the generation counters that version them.
//!
//! The compositor never diffs settings by value. Each independently
//! invalidated group lives in a [`Generational`] wrapper whose counter bumps
//! on every write; the [`InvalidationTracker`](crate::invalidation) compares
//! counters once per frame.

use std::ops::Deref;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Monotonic change counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A value paired with the generation of its last write.
#[derive(Debug, Clone, Default)]
pub struct Generational<T> {
    generation: Generation,
    value: T,
}

impl<T> Generational<T> {
    pub fn new(value: T) -> Self {
        Self {
            generation: Generation::default().next(),
            value,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Mutable access; counts as a change even if nothing is modified.
    pub fn write(&mut self) -> &mut T {
        self.generation = self.generation.next();
        &mut self.value
    }

    pub fn set(&mut self, value: T) {
        *self.write() = value;
    }
}

impl<T> Deref for Generational<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Text antialiasing mode requested from the rasterizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntialiasingMode {
    #[default]
    Grayscale,
    /// Subpixel (per-channel) coverage.
    ClearType,
    Aliased,
}

/// Vertical position and thickness of a decoration line, in pixels from the
/// top of the cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecorationMetric {
    pub position: i32,
    pub height: u32,
}

impl DecorationMetric {
    pub const fn new(position: i32, height: u32) -> Self {
        Self { position, height }
    }
}

/// DECDLD-style downloadable font: one `u16` bit row per scanline, most
/// significant bit leftmost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftFont {
    pub cell_width: u32,
    pub cell_height: u32,
    pub rows: Vec<u16>,
}

/// Font metrics and rendering options. A write here invalidates every cached
/// glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSettings {
    /// Em size in pixels.
    pub font_size: f32,
    pub cell_width: u32,
    pub cell_height: u32,
    /// Baseline offset from the top of the cell.
    pub baseline: i32,
    /// Distance from the baseline to the bottom of the cell.
    pub descender: i32,
    /// Advance of a single-width glyph.
    pub advance_width: i32,
    pub underline: DecorationMetric,
    pub strikethrough: DecorationMetric,
    pub double_underline: [DecorationMetric; 2],
    /// Width of gridlines.
    pub thin_line_width: u32,
    pub antialiasing: AntialiasingMode,
    /// OpenType feature toggles, as in `"liga"` / `"-liga"`.
    pub features: Vec<String>,
    pub color_glyphs: bool,
    pub soft_font: Option<SoftFont>,
}

impl FontSettings {
    pub fn cell_area(&self) -> u64 {
        u64::from(self.cell_width) * u64::from(self.cell_height)
    }

    /// Ligatures are on unless `liga` is explicitly disabled.
    pub fn ligatures_enabled(&self) -> bool {
        !self.features.iter().any(|f| f.trim() == "-liga")
    }
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            cell_width: 10,
            cell_height: 20,
            baseline: 16,
            descender: 4,
            advance_width: 10,
            underline: DecorationMetric::new(17, 1),
            strikethrough: DecorationMetric::new(10, 1),
            double_underline: [DecorationMetric::new(16, 1), DecorationMetric::new(18, 1)],
            thin_line_width: 1,
            antialiasing: AntialiasingMode::Grayscale,
            features: vec!["calt".to_owned(), "liga".to_owned()],
            color_glyphs: true,
            soft_font: None,
        }
    }
}

/// Settings that affect the composite pass but not glyph geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscSettings {
    /// Packed `0xAABBGGRR` clear color.
    pub background: u32,
    pub custom_shader_path: Option<PathBuf>,
    /// Texture handed to the custom shader.
    pub shader_image_path: Option<PathBuf>,
    /// Built-in CRT-style post effect.
    pub retro_effect: bool,
}

impl MiscSettings {
    /// Post effects sample the whole target, so partial presents are off.
    pub fn has_custom_shader(&self) -> bool {
        self.custom_shader_path.is_some() || self.retro_effect
    }
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            background: 0xff00_0000,
            custom_shader_path: None,
            shader_image_path: None,
            retro_effect: false,
        }
    }
}

/// Everything the compositor reads each frame.
#[derive(Debug, Clone)]
pub struct Settings {
    pub font: Generational<FontSettings>,
    pub misc: Generational<MiscSettings>,
    target_size: (u32, u32),
    viewport_cell_count: (u16, u16),
    revision: Generation,
}

impl Settings {
    pub fn new(font: FontSettings, target_size: (u32, u32)) -> Self {
        let cols = (target_size.0 / font.cell_width.max(1)).min(u32::from(u16::MAX)) as u16;
        let rows = (target_size.1 / font.cell_height.max(1)).min(u32::from(u16::MAX)) as u16;
        Self {
            font: Generational::new(font),
            misc: Generational::new(MiscSettings::default()),
            target_size,
            viewport_cell_count: (cols, rows),
            revision: Generation::default().next(),
        }
    }

    /// Overall generation: changes whenever any group changes.
    pub fn generation(&self) -> Generation {
        Generation(self.revision.get() + self.font.generation().get() + self.misc.generation().get())
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.target_size
    }

    pub fn set_target_size(&mut self, size: (u32, u32)) {
        if self.target_size != size {
            self.target_size = size;
            self.revision = self.revision.next();
        }
    }

    pub fn target_area(&self) -> u64 {
        u64::from(self.target_size.0) * u64::from(self.target_size.1)
    }

    /// `(columns, rows)` of the viewport.
    pub fn viewport_cell_count(&self) -> (u16, u16) {
        self.viewport_cell_count
    }

    pub fn set_viewport_cell_count(&mut self, count: (u16, u16)) {
        if self.viewport_cell_count != count {
            self.viewport_cell_count = count;
            self.revision = self.revision.next();
        }
    }
}
