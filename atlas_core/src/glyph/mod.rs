//! Glyph placements and the per-rendition caches that hold them.

use std::collections::HashMap;

use crate::settings::FontSettings;

/// How a row is scaled: normal, double width, or one half of a
/// double-height pair (DECDWL / DECDHL).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LineRendition {
    #[default]
    SingleWidth = 0,
    DoubleWidth = 1,
    DoubleHeightTop = 2,
    DoubleHeightBottom = 3,
}

impl LineRendition {
    pub const ALL: [Self; 4] = [
        Self::SingleWidth,
        Self::DoubleWidth,
        Self::DoubleHeightTop,
        Self::DoubleHeightBottom,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_double_height(self) -> bool {
        matches!(self, Self::DoubleHeightTop | Self::DoubleHeightBottom)
    }

    /// Horizontal and vertical pixel multipliers.
    pub fn scale(self) -> (u32, u32) {
        match self {
            Self::SingleWidth => (1, 1),
            Self::DoubleWidth => (2, 1),
            Self::DoubleHeightTop | Self::DoubleHeightBottom => (2, 2),
        }
    }

    /// The other half of a double-height pair; other renditions map to
    /// themselves.
    pub fn sibling(self) -> Self {
        match self {
            Self::DoubleHeightTop => Self::DoubleHeightBottom,
            Self::DoubleHeightBottom => Self::DoubleHeightTop,
            other => other,
        }
    }
}

/// How the composite pass treats the texels of a glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShadingType {
    /// Whitespace: no geometry, never drawn.
    #[default]
    Default = 0,
    GrayscaleText = 1,
    ClearTypeText = 2,
    /// Color glyphs (emoji) whose texels are used as-is.
    Passthrough = 3,
    BuiltinGlyph = 4,
}

/// Atlas cache generation. Caches stamped with an older epoch read as empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// One rasterized glyph placed in the atlas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphEntry {
    pub glyph_index: u32,
    pub shading: ShadingType,
    /// Wide, off-center glyph (a coding ligature) that must be drawn in
    /// per-cell colored segments.
    pub overlap_split: bool,
    /// Top-left of the glyph box relative to the pen position on the baseline.
    pub offset: (i32, i32),
    pub size: (u32, u32),
    /// Top-left of the glyph box inside the atlas.
    pub texcoord: (u32, u32),
}

impl GlyphEntry {
    /// A whitespace entry carrying no geometry.
    pub fn blank(glyph_index: u32) -> Self {
        Self {
            glyph_index,
            ..Self::default()
        }
    }

    pub fn is_drawable(&self) -> bool {
        self.shading != ShadingType::Default
    }
}

/// Glyph index to [`GlyphEntry`] map for one face and one rendition.
///
/// The cache is stamped with the atlas epoch it was last written under.
/// Reads against a newer epoch see nothing, and the first write under a new
/// epoch drops the stale contents, so an atlas reset never has to visit
/// every cache.
#[derive(Debug, Default)]
pub struct GlyphCache {
    entries: HashMap<u32, GlyphEntry>,
    epoch: Epoch,
}

impl GlyphCache {
    /// The entry for `glyph_index` if it was resolved during `epoch`.
    pub fn lookup(&self, glyph_index: u32, epoch: Epoch) -> Option<&GlyphEntry> {
        if self.epoch == epoch {
            self.entries.get(&glyph_index)
        } else {
            None
        }
    }

    /// Get-or-create the slot for `glyph_index`. Fresh slots are blank.
    pub fn resolve(&mut self, glyph_index: u32, epoch: Epoch) -> &mut GlyphEntry {
        self.sync(epoch);
        self.entries
            .entry(glyph_index)
            .or_insert_with(|| GlyphEntry::blank(glyph_index))
    }

    pub fn insert(&mut self, entry: GlyphEntry, epoch: Epoch) {
        *self.resolve(entry.glyph_index, epoch) = entry;
    }

    /// Number of entries visible under `epoch`.
    pub fn len(&self, epoch: Epoch) -> usize {
        if self.epoch == epoch { self.entries.len() } else { 0 }
    }

    pub fn is_empty(&self, epoch: Epoch) -> bool {
        self.len(epoch) == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn sync(&mut self, epoch: Epoch) {
        if self.epoch != epoch {
            self.entries.clear();
            self.epoch = epoch;
        }
    }
}

/// Cut a double-height glyph into its top and bottom halves.
///
/// Both halves share the atlas allocation of `entry`: the top half keeps the
/// upper texcoord window, the bottom half starts where the top one ends. A
/// half left with no rows is turned into whitespace.
pub fn split_double_height(
    mut entry: GlyphEntry,
    font: &FontSettings,
) -> (GlyphEntry, GlyphEntry) {
    entry.offset.1 -= font.descender;

    let height = entry.size.1;
    let top_size = (-entry.offset.1 - font.baseline).clamp(0, height as i32) as u32;

    let mut top = entry;
    top.offset.1 += font.cell_height as i32;
    top.size.1 = top_size;

    let mut bottom = entry;
    bottom.offset.1 += top_size as i32;
    bottom.size.1 = height - top_size;
    bottom.texcoord.1 += top_size;

    for half in [&mut top, &mut bottom] {
        if half.size.1 == 0 {
            half.shading = ShadingType::Default;
        }
    }
    (top, bottom)
}

#[cfg(test)]
mod tests;
