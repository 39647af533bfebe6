//! Hooks around [`FrameCompositor::render`](crate::FrameCompositor::render)
//! for developer tooling: dirty-rect overlays, grid dumps, shader reload.

use std::collections::VecDeque;
use std::fmt::Write as _;

use log::{Level, log_enabled, trace};

use crate::cell::CellGrid;
use crate::compositor::{DirtyRect, Frame};
use crate::decoration::{DecorationQuad, LineShading};
use crate::invalidation::Changes;

/// Runs before and after every frame.
pub trait FrameObserver {
    /// Extra invalidations to apply to the coming frame.
    fn before_frame(&mut self) -> Changes {
        Changes::empty()
    }

    fn after_frame(&mut self, frame: &mut Frame);
}

/// Outlines the dirty rects of the last few frames, so partial presents
/// can be checked by eye.
#[derive(Debug)]
pub struct DirtyRectHistory {
    rects: VecDeque<DirtyRect>,
    capacity: usize,
    color: u32,
}

impl DirtyRectHistory {
    pub fn new(capacity: usize, color: u32) -> Self {
        Self {
            rects: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            color,
        }
    }

    /// Remembered rects, oldest first.
    pub fn rects(&self) -> impl Iterator<Item = &DirtyRect> {
        self.rects.iter()
    }

    fn outline(&self, rect: &DirtyRect, out: &mut Vec<DecorationQuad>) {
        let (x, y) = (rect.left as i32, rect.top as i32);
        let (w, h) = (rect.width(), rect.height());
        let edges = [
            ((x, y), (w, 1)),
            ((x, y + h as i32 - 1), (w, 1)),
            ((x, y), (1, h)),
            ((x + w as i32 - 1, y), (1, h)),
        ];
        for (position, size) in edges {
            out.push(DecorationQuad {
                shading: LineShading::Solid,
                position,
                size,
                color: self.color,
                rendition_scale: (1, 1),
            });
        }
    }
}

impl FrameObserver for DirtyRectHistory {
    fn after_frame(&mut self, frame: &mut Frame) {
        if !frame.dirty.is_empty() {
            if self.rects.len() == self.capacity {
                self.rects.pop_front();
            }
            self.rects.push_back(frame.dirty);
        }
        for rect in &self.rects {
            self.outline(rect, &mut frame.decorations);
        }
    }
}

/// Dumps the cell grid at `trace` level every `interval` frames.
#[derive(Debug)]
pub struct FrameDump {
    interval: u64,
    frames: u64,
}

impl FrameDump {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            frames: 0,
        }
    }
}

impl FrameObserver for FrameDump {
    fn after_frame(&mut self, frame: &mut Frame) {
        self.frames += 1;
        if self.frames.is_multiple_of(self.interval) && log_enabled!(Level::Trace) {
            trace!("frame {}:\n{}", self.frames, dump_grid(&frame.cells));
        }
    }
}

/// One line per row: `#` glyph, `~` retired, `.` empty.
pub fn dump_grid(cells: &CellGrid) -> String {
    let mut out = String::with_capacity((usize::from(cells.cols()) + 1) * usize::from(cells.rows()));
    for row in 0..cells.rows() {
        for col in 0..cells.cols() {
            let mark = match cells.get(col, row) {
                Some(cell) if cell.has_glyph() => '#',
                Some(cell) if cell.is_retired() => '~',
                _ => '.',
            };
            out.push(mark);
        }
        out.push('\n');
    }
    let glyphs = cells.cells().iter().filter(|c| c.has_glyph()).count();
    let _ = write!(out, "{glyphs} glyphs, {} cells", cells.cells().len());
    out
}
