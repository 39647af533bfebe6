//! Font loading, rasterization and shaping.
//!
//! `FontCollection` owns font bytes and implements
//! [`Rasterizer`](atlas_core::Rasterizer) with swash; `shape_row` turns a
//! line of text into a [`ShapedRow`](atlas_core::ShapedRow) with rustybuzz.

mod collection;
mod shaper;

pub use collection::{FontCollection, MAX_FONT_SIZE, MIN_FONT_SIZE};
pub use shaper::{parse_features, shape_row};
