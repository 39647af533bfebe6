use std::path::PathBuf;

use thiserror::Error;

use atlas_core::FaceId;

/// Errors from setting up the GPU or loading fonts.
#[derive(Debug, Error)]
pub enum RendererError {
    /// No adapter matched the request.
    #[error("no usable GPU adapter: {0}")]
    NoAdapter(String),

    /// The adapter refused the device request.
    #[error("failed to create GPU device: {0}")]
    Device(String),

    #[error("failed to read font {path}: {source}")]
    FontIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The bytes are not a font, or the collection has no face at `index`.
    #[error("invalid font data (face index {index})")]
    InvalidFont { index: u32 },

    #[error("font face {0:?} is not loaded")]
    UnknownFace(FaceId),
}

pub type Result<T, E = RendererError> = std::result::Result<T, E>;
