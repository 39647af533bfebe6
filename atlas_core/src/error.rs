//! Error types for frame composition and rasterization.

use thiserror::Error;

use crate::registry::FaceId;

/// Errors that abort a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A glyph did not fit even after the atlas was flushed and reset.
    #[error(
        "glyph of {width}x{height} px does not fit an empty {atlas_width}x{atlas_height} atlas"
    )]
    AtlasExhausted {
        width: u32,
        height: u32,
        atlas_width: u32,
        atlas_height: u32,
    },

    /// The GPU sink rejected an operation.
    #[error("gpu sink error: {0}")]
    Gpu(String),
}

/// Errors reported by a [`Rasterizer`](crate::sink::Rasterizer).
///
/// These never abort a frame: the compositor turns them into warnings and
/// renders the glyph blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error("unknown font face {0:?}")]
    UnknownFace(FaceId),

    #[error("glyph {glyph} of face {face:?} could not be rasterized: {reason}")]
    Failed {
        face: FaceId,
        glyph: u32,
        reason: String,
    },
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
