//! Skyline rectangle packer for the glyph atlas.
//!
//! The packer tracks the upper contour ("skyline") of everything placed so
//! far as a left-to-right list of horizontal segments. A new rectangle goes
//! wherever its top edge ends up lowest, ties broken by the least area wasted
//! underneath it. There is no free operation: glyphs share the lifetime of
//! the atlas epoch, so the only way to reclaim space is [`RectPacker::reset`].

/// A horizontal segment of the skyline at height `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    x: u32,
    y: u32,
    width: u32,
}

/// Deterministic skyline bottom-left packer over a fixed `width x height`
/// extent.
#[derive(Debug, Clone)]
pub struct RectPacker {
    width: u32,
    height: u32,
    skyline: Vec<Segment>,
    used_area: u64,
}

impl RectPacker {
    /// Create an empty packer. A zero extent rejects every non-empty request.
    pub fn new(width: u32, height: u32) -> Self {
        let mut packer = Self {
            width: 0,
            height: 0,
            skyline: Vec::new(),
            used_area: 0,
        };
        packer.reset(width, height);
        packer
    }

    /// Drop every placement and resize the extent.
    pub fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.used_area = 0;
        self.skyline.clear();
        if width > 0 {
            self.skyline.push(Segment { x: 0, y: 0, width });
        }
    }

    /// Place a `w x h` rectangle, returning its top-left corner.
    ///
    /// Empty requests succeed at the origin without consuming space.
    pub fn pack(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w == 0 || h == 0 {
            return Some((0, 0));
        }
        if w > self.width || h > self.height {
            return None;
        }

        let mut best: Option<(usize, u32, u64)> = None;
        for idx in 0..self.skyline.len() {
            let Some((y, waste)) = self.fit(idx, w, h) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, best_y, best_waste)) => {
                    y < best_y || (y == best_y && waste < best_waste)
                }
            };
            if better {
                best = Some((idx, y, waste));
            }
        }

        let (idx, y, _) = best?;
        let x = self.skyline[idx].x;
        self.place(idx, x, y, w, h);
        self.used_area += u64::from(w) * u64::from(h);
        Some((x, y))
    }

    /// Width of the packed extent.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the packed extent.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total extent area.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Sum of the areas of every successful placement since the last reset.
    pub fn used_area(&self) -> u64 {
        self.used_area
    }

    /// Whether nothing has been placed since the last reset.
    pub fn is_empty(&self) -> bool {
        self.used_area == 0
    }

    /// Lowest `y` at which a `w x h` rectangle fits with its left edge on
    /// segment `idx`, plus the area trapped underneath it.
    fn fit(&self, idx: usize, w: u32, h: u32) -> Option<(u32, u64)> {
        let x = self.skyline[idx].x;
        if x + w > self.width {
            return None;
        }

        let right = x + w;
        let mut y = 0;
        for seg in &self.skyline[idx..] {
            if seg.x >= right {
                break;
            }
            y = y.max(seg.y);
        }
        if y + h > self.height {
            return None;
        }

        let mut waste = 0u64;
        for seg in &self.skyline[idx..] {
            if seg.x >= right {
                break;
            }
            let covered = (seg.x + seg.width).min(right) - seg.x;
            waste += u64::from(y - seg.y) * u64::from(covered);
        }
        Some((y, waste))
    }

    /// Raise the skyline over `[x, x + w)` to `y + h`.
    fn place(&mut self, idx: usize, x: u32, y: u32, w: u32, h: u32) {
        let right = x + w;

        // Trim or drop the segments the new rectangle shadows.
        let mut end = idx;
        while end < self.skyline.len() && self.skyline[end].x < right {
            let seg = self.skyline[end];
            let seg_right = seg.x + seg.width;
            if seg_right > right {
                self.skyline[end] = Segment {
                    x: right,
                    y: seg.y,
                    width: seg_right - right,
                };
                break;
            }
            end += 1;
        }
        self.skyline.splice(
            idx..end,
            std::iter::once(Segment {
                x,
                y: y + h,
                width: w,
            }),
        );

        self.merge();
    }

    /// Coalesce neighbouring segments at the same height.
    fn merge(&mut self) {
        let mut i = 0;
        while i + 1 < self.skyline.len() {
            if self.skyline[i].y == self.skyline[i + 1].y {
                self.skyline[i].width += self.skyline[i + 1].width;
                self.skyline.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}
