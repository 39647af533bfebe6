//! Interfaces to the collaborators the compositor drives: the glyph
//! rasterizer and the GPU.

use crate::cell::CellGrid;
use crate::error::{RasterError, Result};
use crate::registry::FaceId;
use crate::settings::{AntialiasingMode, MiscSettings};
use crate::warning::RenderWarning;

/// Texture dimension limit assumed when a sink does not report one.
pub const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 16384;

/// What the compositor asks the rasterizer for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphRequest {
    pub face: FaceId,
    pub glyph_index: u32,
    /// Em size in pixels before rendition scaling.
    pub em_size: f32,
    /// Rendition multipliers; the bitmap must already be scaled.
    pub scale: (u32, u32),
    pub antialiasing: AntialiasingMode,
    pub color_glyphs: bool,
}

/// Pixel box of a rasterized glyph, relative to the pen position on the
/// baseline (y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl GlyphBounds {
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphContent {
    /// One coverage byte per pixel.
    Mask,
    /// RGBA per-channel coverage.
    SubpixelMask,
    /// Premultiplied RGBA color (emoji).
    Color,
}

/// A rasterized glyph: its box and its pixels, row-major, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterizedGlyph {
    pub bounds: GlyphBounds,
    pub content: GlyphContent,
    pub pixels: Vec<u8>,
}

impl RasterizedGlyph {
    pub fn atlas_pixels(&self) -> AtlasPixels<'_> {
        match self.content {
            GlyphContent::Mask => AtlasPixels::Alpha(&self.pixels),
            GlyphContent::SubpixelMask => AtlasPixels::Subpixel(&self.pixels),
            GlyphContent::Color => AtlasPixels::Rgba(&self.pixels),
        }
    }
}

/// Turns a face handle and glyph index into pixels.
pub trait Rasterizer {
    /// `Ok(None)` means the glyph has no ink (whitespace).
    fn rasterize(
        &mut self,
        request: &GlyphRequest,
    ) -> std::result::Result<Option<RasterizedGlyph>, RasterError>;
}

/// Destination rectangle inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Pixel data for an atlas upload, tagged with its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasPixels<'a> {
    Alpha(&'a [u8]),
    Subpixel(&'a [u8]),
    Rgba(&'a [u8]),
}

impl AtlasPixels<'_> {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Alpha(_) => 1,
            Self::Subpixel(_) | Self::Rgba(_) => 4,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Self::Alpha(d) | Self::Subpixel(d) | Self::Rgba(d) => d,
        }
    }
}

/// The GPU side of the renderer: owns the atlas texture, the cell table and
/// the composite pass.
pub trait GpuSink {
    fn max_texture_dimension(&self) -> u32 {
        DEFAULT_MAX_TEXTURE_DIMENSION
    }

    /// (Re)create the atlas texture. Previous contents are discarded.
    fn create_atlas(&mut self, width: u32, height: u32) -> Result<()>;

    fn upload_atlas_region(&mut self, region: AtlasRegion, pixels: AtlasPixels<'_>) -> Result<()>;

    fn bind_cell_table(&mut self, cells: &CellGrid) -> Result<()>;

    /// Composite the bound cell table into the render target.
    fn dispatch_composite(&mut self) -> Result<()>;

    /// Apply post-effect settings. Failures degrade to no effect.
    fn apply_misc(&mut self, _misc: &MiscSettings) -> std::result::Result<(), RenderWarning> {
        Ok(())
    }

    fn resize_cell_table(&mut self, _cols: u16, _rows: u16) -> Result<()> {
        Ok(())
    }
}

/// Sink that discards everything, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct VoidSink;

impl GpuSink for VoidSink {
    fn create_atlas(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn upload_atlas_region(&mut self, _region: AtlasRegion, _pixels: AtlasPixels<'_>) -> Result<()> {
        Ok(())
    }

    fn bind_cell_table(&mut self, _cells: &CellGrid) -> Result<()> {
        Ok(())
    }

    fn dispatch_composite(&mut self) -> Result<()> {
        Ok(())
    }
}
