//! Atlas sizing, allocation and reset.
//!
//! The store owns the atlas dimensions, the packer that carves them up and
//! the [`Epoch`] every glyph cache is validated against. Whenever the
//! dimensions change the packer is emptied and the epoch bumped in the same
//! step, so no cache can hand out a coordinate into a texture that has been
//! replaced.

use log::debug;

use crate::config::AtlasConfig;
use crate::error::Result;
use crate::glyph::Epoch;
use crate::packer::RectPacker;
use crate::sink::GpuSink;

/// Lifecycle of the atlas texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasState {
    /// Never sized; no texture exists yet.
    Empty,
    /// Freshly reset, nothing allocated.
    Ready,
    Populated,
}

/// Compute power-of-two atlas dimensions.
///
/// The area starts from the larger of "enough for `font_cells` cells" and
/// "`growth_factor` times what we have now", is capped at
/// `viewport_headroom` times the render target and then clamped to
/// `[min_area, max_dimension²]`. The result is the smallest `u x v` with
/// `u == v` or `u == 2 * v` covering that area.
pub fn atlas_dimensions(
    config: &AtlasConfig,
    max_dimension: u32,
    cell_area: u64,
    target_area: u64,
    packer_area: u64,
) -> (u32, u32) {
    let max_dimension = floor_pow2(max_dimension.max(1));
    let max_area = u64::from(max_dimension) * u64::from(max_dimension);
    let min_area = config.min_area.clamp(2, max_area.max(2));

    let by_font = cell_area.saturating_mul(config.font_cells);
    let by_growth = packer_area.saturating_mul(config.growth_factor);
    let by_target = (target_area as f64 * config.viewport_headroom) as u64;

    let area = by_font
        .max(by_growth)
        .min(by_target)
        .clamp(min_area, max_area.max(min_area));

    let index = 63 - (area - 1).leading_zeros();
    let u = 1u32 << ((index + 2) / 2);
    let v = 1u32 << ((index + 1) / 2);
    (u.min(max_dimension), v.min(max_dimension))
}

fn floor_pow2(n: u32) -> u32 {
    1 << (31 - n.leading_zeros())
}

/// Owner of the atlas texture size, its packer and its epoch.
#[derive(Debug)]
pub struct AtlasStore {
    config: AtlasConfig,
    size: (u32, u32),
    packer: RectPacker,
    epoch: Epoch,
    resets: u64,
}

impl AtlasStore {
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            config,
            size: (0, 0),
            packer: RectPacker::new(0, 0),
            epoch: Epoch::default(),
            resets: 0,
        }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Current `(width, height)`; `(0, 0)` before the first reset.
    pub fn dimensions(&self) -> (u32, u32) {
        self.size
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Number of resets since creation.
    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    pub fn state(&self) -> AtlasState {
        if self.size == (0, 0) {
            AtlasState::Empty
        } else if self.packer.is_empty() {
            AtlasState::Ready
        } else {
            AtlasState::Populated
        }
    }

    /// Recompute the dimensions and recreate the texture if they changed.
    ///
    /// A size change empties the packer and bumps the epoch in the same
    /// step; an unchanged size leaves every placement intact.
    pub fn ensure_sized<S: GpuSink + ?Sized>(
        &mut self,
        cell_area: u64,
        target_area: u64,
        sink: &mut S,
    ) -> Result<(u32, u32)> {
        let max_dimension = match self.config.max_dimension {
            Some(cap) => cap.min(sink.max_texture_dimension()),
            None => sink.max_texture_dimension(),
        };
        let size = atlas_dimensions(
            &self.config,
            max_dimension,
            cell_area,
            target_area,
            self.packer.area(),
        );
        if size != self.size {
            debug!(
                "atlas resize {}x{} -> {}x{}",
                self.size.0, self.size.1, size.0, size.1
            );
            sink.create_atlas(size.0, size.1)?;
            self.size = size;
            self.clear();
        }
        Ok(size)
    }

    /// Resize if needed, empty the packer and invalidate every glyph cache.
    pub fn reset<S: GpuSink + ?Sized>(
        &mut self,
        cell_area: u64,
        target_area: u64,
        sink: &mut S,
    ) -> Result<()> {
        let before = self.epoch;
        self.ensure_sized(cell_area, target_area, sink)?;
        if self.epoch == before {
            self.clear();
        }
        self.resets += 1;
        debug!(
            "atlas reset #{} at {}x{}, epoch {}",
            self.resets,
            self.size.0,
            self.size.1,
            self.epoch.get()
        );
        Ok(())
    }

    /// Carve out a `w x h` region. `None` means the atlas is full.
    pub fn allocate(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        self.packer.pack(w, h)
    }

    fn clear(&mut self) {
        self.packer.reset(self.size.0, self.size.1);
        self.epoch = self.epoch.next();
    }
}

#[cfg(test)]
mod tests;
