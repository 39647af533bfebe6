//! Test doubles for the sink and rasterizer traits.

use std::collections::HashMap;

use crate::cell::CellGrid;
use crate::error::{RasterError, Result};
use crate::registry::FaceId;
use crate::settings::MiscSettings;
use crate::sink::{
    AtlasPixels, AtlasRegion, GlyphBounds, GlyphContent, GlyphRequest, GpuSink, RasterizedGlyph,
    Rasterizer,
};
use crate::warning::{RenderWarning, WarningKind};

/// Records every call so tests can assert on the traffic.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub max_dimension: Option<u32>,
    pub atlases: Vec<(u32, u32)>,
    pub uploads: Vec<(AtlasRegion, usize)>,
    pub bound: Vec<CellGrid>,
    pub dispatches: usize,
    pub misc_applied: usize,
    pub fail_misc: bool,
    pub cell_table_sizes: Vec<(u16, u16)>,
}

impl GpuSink for RecordingSink {
    fn max_texture_dimension(&self) -> u32 {
        self.max_dimension.unwrap_or(16384)
    }

    fn create_atlas(&mut self, width: u32, height: u32) -> Result<()> {
        self.atlases.push((width, height));
        Ok(())
    }

    fn upload_atlas_region(&mut self, region: AtlasRegion, pixels: AtlasPixels<'_>) -> Result<()> {
        assert_eq!(
            pixels.data().len(),
            region.width as usize * region.height as usize * pixels.bytes_per_pixel(),
            "upload size mismatch"
        );
        self.uploads.push((region, pixels.bytes_per_pixel()));
        Ok(())
    }

    fn bind_cell_table(&mut self, cells: &CellGrid) -> Result<()> {
        self.bound.push(cells.clone());
        Ok(())
    }

    fn dispatch_composite(&mut self) -> Result<()> {
        self.dispatches += 1;
        Ok(())
    }

    fn apply_misc(&mut self, misc: &MiscSettings) -> std::result::Result<(), RenderWarning> {
        self.misc_applied += 1;
        match (&misc.custom_shader_path, self.fail_misc) {
            (Some(path), true) => Err(RenderWarning::for_path(WarningKind::ShaderLoadFailed, path)),
            _ => Ok(()),
        }
    }

    fn resize_cell_table(&mut self, cols: u16, rows: u16) -> Result<()> {
        self.cell_table_sizes.push((cols, rows));
        Ok(())
    }
}

/// What the scripted rasterizer returns for a glyph index.
#[derive(Debug, Clone)]
pub enum Script {
    Blank,
    Fail,
    Mask(GlyphBounds),
    Color(GlyphBounds),
}

/// Rasterizer answering from a table; unknown glyphs get a 6x10 mask box.
#[derive(Debug, Default)]
pub struct ScriptedRasterizer {
    pub scripts: HashMap<u32, Script>,
    pub calls: Vec<GlyphRequest>,
}

impl ScriptedRasterizer {
    pub fn with(mut self, glyph: u32, script: Script) -> Self {
        self.scripts.insert(glyph, script);
        self
    }
}

pub fn bounds(left: i32, top: i32, right: i32, bottom: i32) -> GlyphBounds {
    GlyphBounds {
        left,
        top,
        right,
        bottom,
    }
}

impl Rasterizer for ScriptedRasterizer {
    fn rasterize(
        &mut self,
        request: &GlyphRequest,
    ) -> std::result::Result<Option<RasterizedGlyph>, RasterError> {
        self.calls.push(*request);
        let script = self
            .scripts
            .get(&request.glyph_index)
            .cloned()
            .unwrap_or(Script::Mask(bounds(1, -12, 7, -2)));
        let (bounds, content) = match script {
            Script::Blank => return Ok(None),
            Script::Fail => {
                return Err(RasterError::Failed {
                    face: request.face,
                    glyph: request.glyph_index,
                    reason: "scripted failure".to_owned(),
                });
            }
            Script::Mask(b) => (b, GlyphContent::Mask),
            Script::Color(b) => (b, GlyphContent::Color),
        };
        // Rendition scaling is the rasterizer's job.
        let bounds = GlyphBounds {
            left: bounds.left * request.scale.0 as i32,
            top: bounds.top * request.scale.1 as i32,
            right: bounds.right * request.scale.0 as i32,
            bottom: bounds.bottom * request.scale.1 as i32,
        };
        let bpp = if content == GlyphContent::Mask { 1 } else { 4 };
        let len = bounds.width() as usize * bounds.height() as usize * bpp;
        Ok(Some(RasterizedGlyph {
            bounds,
            content,
            pixels: vec![0xff; len],
        }))
    }
}

pub const FACE: FaceId = FaceId(1);
