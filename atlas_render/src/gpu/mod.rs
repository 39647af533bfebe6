//! GPU compositing: headless device, composite pipeline and the
//! [`GpuSink`](atlas_core::GpuSink) implementation.

mod context;
pub mod pipeline;
mod sink;

pub use context::GpuContext;
pub use sink::{ShaderResources, WgpuSink, expand_to_rgba, load_shader_resources};

#[cfg(test)]
mod tests;
