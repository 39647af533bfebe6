//! Shaped text rows: the compositor's per-frame input.

use std::ops::Range;

use crate::decoration::GridLineRange;
use crate::glyph::LineRendition;
use crate::registry::FaceId;

/// A run of glyphs that share one face.
///
/// `face == None` marks builtin glyphs, whose indices are Unicode code
/// points (UTF-16 surrogate pairs are accepted and combined).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMapping {
    pub face: Option<FaceId>,
    pub glyphs_from: usize,
    pub glyphs_to: usize,
}

/// Shaper-provided nudge for one glyph, in unscaled pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphOffset {
    pub advance_offset: f32,
    pub ascender_offset: f32,
}

/// One viewport row after shaping.
///
/// `glyph_indices`, `glyph_advances` and `glyph_offsets` are parallel;
/// missing advances or offsets count as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedRow {
    pub line_rendition: LineRendition,
    pub mappings: Vec<FontMapping>,
    pub glyph_indices: Vec<u32>,
    pub glyph_advances: Vec<f32>,
    pub glyph_offsets: Vec<GlyphOffset>,
    pub grid_line_ranges: Vec<GridLineRange>,
}

impl ShapedRow {
    /// Append a run of glyphs from `face`.
    pub fn push_run(
        &mut self,
        face: Option<FaceId>,
        glyphs: impl IntoIterator<Item = (u32, f32, GlyphOffset)>,
    ) {
        let from = self.glyph_indices.len();
        for (index, advance, offset) in glyphs {
            self.glyph_indices.push(index);
            self.glyph_advances.push(advance);
            self.glyph_offsets.push(offset);
        }
        let to = self.glyph_indices.len();
        if to > from {
            self.mappings.push(FontMapping {
                face,
                glyphs_from: from,
                glyphs_to: to,
            });
        }
    }

    pub fn advance(&self, index: usize) -> f32 {
        self.glyph_advances.get(index).copied().unwrap_or(0.0)
    }

    pub fn offset(&self, index: usize) -> GlyphOffset {
        self.glyph_offsets.get(index).copied().unwrap_or_default()
    }
}

/// Everything one frame composes.
#[derive(Debug, Clone)]
pub struct FramePayload<'a> {
    /// Top to bottom; rows past the viewport height are ignored.
    pub rows: &'a [ShapedRow],
    /// Row-major per-cell colors, packed `0xAABBGGRR`.
    pub background: &'a [u32],
    pub foreground: &'a [u32],
    /// Rows whose content changed since the last present.
    pub invalidated_rows: Range<u16>,
}
