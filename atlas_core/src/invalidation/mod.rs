//! Per-frame generation comparison.

use bitflags::bitflags;

use crate::settings::{Generation, Settings};

bitflags! {
    /// What changed since the previous frame.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Changes: u8 {
        /// Anything at all, including the render target size.
        const SETTINGS = 1 << 0;
        /// Font metrics or rendering options: every cached glyph is stale.
        const FONT = 1 << 1;
        /// Background color or post effects.
        const MISC = 1 << 2;
        const CELL_COUNT = 1 << 3;
    }
}

/// A kind of invalidation that can be forced from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationKind {
    Font,
    Misc,
    CellCount,
}

impl From<InvalidationKind> for Changes {
    fn from(kind: InvalidationKind) -> Self {
        match kind {
            InvalidationKind::Font => Self::FONT,
            InvalidationKind::Misc => Self::MISC,
            InvalidationKind::CellCount => Self::CELL_COUNT,
        }
    }
}

/// Remembers the generations seen last frame.
///
/// Nothing has been seen before the first poll, so it reports every kind.
#[derive(Debug, Default)]
pub struct InvalidationTracker {
    settings: Option<Generation>,
    font: Option<Generation>,
    misc: Option<Generation>,
    cell_count: Option<(u16, u16)>,
    forced: Changes,
}

impl InvalidationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force `kind` to be reported by the next [`poll`](Self::poll).
    pub fn invalidate(&mut self, kind: InvalidationKind) {
        self.forced |= Changes::from(kind);
    }

    /// Compare against `settings`, record what was seen and report the
    /// difference plus anything forced.
    pub fn poll(&mut self, settings: &Settings) -> Changes {
        let mut changes = std::mem::take(&mut self.forced);

        let generation = settings.generation();
        if self.settings.replace(generation) != Some(generation) {
            changes |= Changes::SETTINGS;
        }
        let font = settings.font.generation();
        if self.font.replace(font) != Some(font) {
            changes |= Changes::FONT;
        }
        let misc = settings.misc.generation();
        if self.misc.replace(misc) != Some(misc) {
            changes |= Changes::MISC;
        }
        let cells = settings.viewport_cell_count();
        if self.cell_count.replace(cells) != Some(cells) {
            changes |= Changes::CELL_COUNT;
        }
        changes
    }
}
