//! The value a render pass produces.

use crate::cell::CellGrid;
use crate::decoration::DecorationQuad;
use crate::glyph::ShadingType;
use crate::invalidation::Changes;

/// Pixel rectangle `[left, right) x [top, bottom)` of the render target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl DirtyRect {
    /// The whole target.
    pub fn full(size: (u32, u32)) -> Self {
        Self {
            left: 0,
            top: 0,
            right: size.0,
            bottom: size.1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Smallest rect covering both; empty rects are ignored.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// One cell-wide slice of a ligature, drawn in that cell's foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapSegment {
    pub shading: ShadingType,
    pub position: (i32, i32),
    pub size: (u32, u32),
    pub texcoord: (u32, u32),
    pub color: u32,
}

/// Output of [`FrameCompositor::render`](super::FrameCompositor::render).
#[derive(Debug, Clone)]
pub struct Frame {
    pub cells: CellGrid,
    pub decorations: Vec<DecorationQuad>,
    /// In emission order; later segments overwrite earlier ones.
    pub overlap_segments: Vec<OverlapSegment>,
    pub dirty: DirtyRect,
    /// Changes seen at the start of this frame.
    pub changes: Changes,
    /// Mid-frame flushes forced by a full atlas.
    pub flushes: u32,
}
