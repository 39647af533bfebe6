//! Glyph atlas cache and per-frame cell composition.
//!
//! This crate owns the pieces of a text renderer that sit between shaping
//! and the GPU: a skyline rectangle packer, the atlas store that sizes and
//! resets it, per-face glyph caches, generation-based invalidation, and the
//! frame compositor that turns shaped rows into a cell table. Rasterization
//! and GPU submission are reached through the traits in [`sink`]; this crate
//! contains no font parsing and no graphics API code.

#![deny(unsafe_code)]

pub mod atlas;
pub mod builtin;
pub mod cell;
pub mod compositor;
pub mod config;
pub mod decoration;
pub mod error;
pub mod glyph;
pub mod invalidation;
pub mod observer;
pub mod packer;
pub mod registry;
pub mod row;
pub mod settings;
pub mod sink;
pub mod warning;

#[cfg(test)]
mod testing;

pub use atlas::{AtlasState, AtlasStore, atlas_dimensions};
pub use cell::{Cell, CellGrid, GlyphBox};
pub use compositor::{DirtyRect, Frame, FrameCompositor, OverlapSegment};
pub use config::{AtlasConfig, Config, ConfigError, FontConfig};
pub use decoration::{DecorationQuad, GridLineRange, GridLines, LineShading};
pub use error::{RasterError, RenderError, Result};
pub use glyph::{Epoch, GlyphCache, GlyphEntry, LineRendition, ShadingType};
pub use invalidation::{Changes, InvalidationKind, InvalidationTracker};
pub use observer::{DirtyRectHistory, FrameDump, FrameObserver};
pub use packer::RectPacker;
pub use registry::{FaceId, FontFaceEntry, FontFaceRegistry};
pub use row::{FontMapping, FramePayload, GlyphOffset, ShapedRow};
pub use settings::{
    AntialiasingMode, DecorationMetric, FontSettings, Generation, Generational, MiscSettings,
    Settings, SoftFont,
};
pub use sink::{
    AtlasPixels, AtlasRegion, GlyphBounds, GlyphContent, GlyphRequest, GpuSink, RasterizedGlyph,
    Rasterizer, VoidSink,
};
pub use warning::{RenderWarning, WarningKind};
