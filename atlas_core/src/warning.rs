//! Out-of-band warnings raised while rendering.

use std::path::Path;

use thiserror::Error;

/// What kind of resource failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    RasterizationFailed,
    ShaderLoadFailed,
    ShaderImageLoadFailed,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RasterizationFailed => "rasterization failed",
            Self::ShaderLoadFailed => "custom shader could not be loaded",
            Self::ShaderImageLoadFailed => "shader image could not be loaded",
        }
    }
}

/// A recoverable problem surfaced to the embedder.
///
/// `context` names the resource (a file path, or a face and glyph) so the
/// message can be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {}", .kind.as_str(), .context)]
pub struct RenderWarning {
    pub kind: WarningKind,
    pub context: String,
}

impl RenderWarning {
    pub fn new(kind: WarningKind, context: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
        }
    }

    pub fn for_path(kind: WarningKind, path: &Path) -> Self {
        Self::new(kind, path.display().to_string())
    }
}
