//! Font data collection: owns raw bytes, rasterizes through swash and hands
//! out transient rustybuzz faces for shaping.

use std::path::Path;
use std::sync::Arc;

use log::{debug, trace};
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::{Format, Transform};
use swash::{CacheKey, FontRef};

use atlas_core::{
    AntialiasingMode, DecorationMetric, FaceId, FontConfig, FontSettings, GlyphBounds,
    GlyphContent, GlyphRequest, RasterError, RasterizedGlyph, Rasterizer,
};

use crate::error::{RendererError, Result};

/// Smallest and largest em size accepted, in pixels.
pub const MIN_FONT_SIZE: f32 = 4.0;
pub const MAX_FONT_SIZE: f32 = 200.0;

/// Per-face data: raw bytes plus swash identifiers for transient `FontRef`s.
struct FaceData {
    bytes: Arc<Vec<u8>>,
    /// Index within a .ttc collection (0 for single-font files).
    index: u32,
    /// Byte offset to the table directory (from `FontRef::from_index`).
    offset: u32,
    key: CacheKey,
}

fn font_ref(fd: &FaceData) -> FontRef<'_> {
    FontRef {
        data: &fd.bytes,
        offset: fd.offset,
        key: fd.key,
    }
}

/// Faces registered for rendering, addressed by sequential [`FaceId`]s.
pub struct FontCollection {
    faces: Vec<FaceData>,
    scale_context: ScaleContext,
    /// Em size in pixels used for shaping.
    size: f32,
    /// Route box drawing, block and braille characters to the builtin path.
    builtin_glyphs: bool,
}

impl FontCollection {
    pub fn new(size: f32) -> Self {
        Self {
            faces: Vec::new(),
            scale_context: ScaleContext::new(),
            size: size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            builtin_glyphs: true,
        }
    }

    /// Register the face at `index` of `bytes`.
    pub fn add_face(&mut self, bytes: Vec<u8>, index: u32) -> Result<FaceId> {
        let (offset, key) = {
            let fr = FontRef::from_index(&bytes, index as usize)
                .ok_or(RendererError::InvalidFont { index })?;
            (fr.offset, fr.key)
        };
        let id = FaceId(self.faces.len() as u32);
        self.faces.push(FaceData {
            bytes: Arc::new(bytes),
            index,
            offset,
            key,
        });
        debug!("font: registered face {id:?}");
        Ok(id)
    }

    pub fn load_file(&mut self, path: &Path, index: u32) -> Result<FaceId> {
        let bytes = std::fs::read(path).map_err(|source| RendererError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_face(bytes, index)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn builtin_glyphs(&self) -> bool {
        self.builtin_glyphs
    }

    /// Take the shaping size and builtin routing from `config`.
    pub fn apply_config(&mut self, config: &FontConfig) {
        self.size = config.size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.builtin_glyphs = config.builtin_glyphs;
    }

    fn face(&self, id: FaceId) -> Option<&FaceData> {
        self.faces.get(id.0 as usize)
    }

    /// Glyph index of `ch` in `face`, `None` if the face lacks it.
    pub fn glyph_index(&self, face: FaceId, ch: char) -> Option<u32> {
        let gid = font_ref(self.face(face)?).charmap().map(ch);
        (gid != 0).then_some(u32::from(gid))
    }

    /// Advance of `ch` in pixels at the shaping size.
    pub fn char_advance(&self, face: FaceId, ch: char) -> Option<f32> {
        let fr = font_ref(self.face(face)?);
        let gid = fr.charmap().map(ch);
        Some(fr.glyph_metrics(&[]).scale(self.size).advance_width(gid))
    }

    /// Transient rustybuzz face borrowing the stored bytes.
    pub fn shaping_face(&self, face: FaceId) -> Option<rustybuzz::Face<'_>> {
        let fd = self.face(face)?;
        rustybuzz::Face::from_slice(&fd.bytes, fd.index)
    }

    /// Cell metrics for `face` at `config.size`.
    ///
    /// The cell is as wide as `'0'` and as tall as ascent plus descent; the
    /// decoration lines come from the post and OS/2 tables, clamped into the
    /// cell.
    pub fn font_settings(&self, face: FaceId, config: &FontConfig) -> Result<FontSettings> {
        let fd = self.face(face).ok_or(RendererError::UnknownFace(face))?;
        let fr = font_ref(fd);
        let size = config.size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        let m = fr.metrics(&[]).scale(size);

        let ascent = m.ascent.ceil() as i32;
        let descent = m.descent.abs().ceil() as i32;
        let cell_height = (ascent + descent).max(1) as u32;
        let zero = fr.charmap().map('0');
        let cell_width = fr.glyph_metrics(&[]).scale(size).advance_width(zero).ceil().max(1.0) as u32;

        let stroke = m.stroke_size.round().max(1.0) as u32;
        let lowest = cell_height.saturating_sub(stroke) as i32;

        let underline = (ascent - m.underline_offset.round() as i32).clamp(0, lowest);
        let strike_offset = if m.strikeout_offset > 0.0 {
            m.strikeout_offset
        } else {
            m.x_height / 2.0
        };
        let strikethrough =
            (ascent - strike_offset.round() as i32 - stroke as i32 / 2).clamp(0, lowest);
        let second = (underline + stroke as i32).clamp(0, lowest);
        let first = (second - 2 * stroke as i32).max(0);

        Ok(FontSettings {
            font_size: size,
            cell_width,
            cell_height,
            baseline: ascent,
            descender: descent,
            advance_width: cell_width as i32,
            underline: DecorationMetric::new(underline, stroke),
            strikethrough: DecorationMetric::new(strikethrough, stroke),
            double_underline: [
                DecorationMetric::new(first, stroke),
                DecorationMetric::new(second, stroke),
            ],
            thin_line_width: stroke,
            antialiasing: config.antialiasing,
            features: config.features.clone(),
            color_glyphs: config.color_glyphs,
            soft_font: None,
        })
    }
}

impl Rasterizer for FontCollection {
    fn rasterize(
        &mut self,
        request: &GlyphRequest,
    ) -> std::result::Result<Option<RasterizedGlyph>, RasterError> {
        let fd = self
            .faces
            .get(request.face.0 as usize)
            .ok_or(RasterError::UnknownFace(request.face))?;
        let fr = font_ref(fd);
        let failed = |reason: &str| RasterError::Failed {
            face: request.face,
            glyph: request.glyph_index,
            reason: reason.to_owned(),
        };

        let glyph_count = u32::from(fr.metrics(&[]).glyph_count);
        if request.glyph_index >= glyph_count {
            return Err(failed("glyph index out of range"));
        }
        let gid = request.glyph_index as u16;

        let mut scaler = self
            .scale_context
            .builder(fr)
            .size(request.em_size)
            .hint(true)
            .build();

        let sources: &[Source] = if request.color_glyphs {
            &[
                Source::ColorOutline(0),
                Source::ColorBitmap(StrikeWith::BestFit),
                Source::Outline,
            ]
        } else {
            &[Source::Outline]
        };
        let format = match request.antialiasing {
            AntialiasingMode::ClearType => Format::Subpixel,
            AntialiasingMode::Grayscale | AntialiasingMode::Aliased => Format::Alpha,
        };
        let (sx, sy) = request.scale;
        let transform = ((sx, sy) != (1, 1)).then(|| Transform::scale(sx as f32, sy as f32));

        // No source at all means an empty glyph, not a failure.
        let Some(image) = Render::new(sources)
            .format(format)
            .transform(transform)
            .render(&mut scaler, gid)
        else {
            return Ok(None);
        };
        if image.placement.width == 0 || image.placement.height == 0 {
            return Ok(None);
        }
        trace!(
            "font: rasterized {:?}/{} at {}px: {}x{}",
            request.face, gid, request.em_size, image.placement.width, image.placement.height
        );

        let content = match image.content {
            swash::scale::image::Content::Mask => GlyphContent::Mask,
            swash::scale::image::Content::SubpixelMask => GlyphContent::SubpixelMask,
            swash::scale::image::Content::Color => GlyphContent::Color,
        };
        let mut pixels = image.data;
        if request.antialiasing == AntialiasingMode::Aliased && content == GlyphContent::Mask {
            threshold(&mut pixels);
        }

        // swash places `top` above the baseline with y up.
        let left = image.placement.left;
        let top = -image.placement.top;
        Ok(Some(RasterizedGlyph {
            bounds: GlyphBounds {
                left,
                top,
                right: left + image.placement.width as i32,
                bottom: top + image.placement.height as i32,
            },
            content,
            pixels,
        }))
    }
}

impl std::fmt::Debug for FontCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCollection")
            .field("faces", &self.faces.len())
            .field("size", &self.size)
            .field("builtin_glyphs", &self.builtin_glyphs)
            .finish_non_exhaustive()
    }
}

/// Hard edges for aliased text.
pub(crate) fn threshold(coverage: &mut [u8]) {
    for a in coverage {
        *a = if *a >= 128 { 0xff } else { 0 };
    }
}
