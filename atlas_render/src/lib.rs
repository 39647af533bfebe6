//! Reference adapters for `atlas_core`.
//!
//! - [`WgpuSink`]: offscreen wgpu compositing of the cell table.
//! - [`FontCollection`]: swash rasterization of registered font faces.
//! - [`shape_row`]: rustybuzz shaping into [`atlas_core::ShapedRow`].
//! - [`config`]: config file discovery and loading.
//! - [`ShaderHotReload`]: re-applies misc settings when shader files change.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod font;
pub mod gpu;
pub mod reload;
pub mod watcher;

pub use error::{RendererError, Result};
pub use font::{FontCollection, parse_features, shape_row};
pub use gpu::{GpuContext, WgpuSink};
pub use reload::ShaderHotReload;
pub use watcher::FileWatcher;
