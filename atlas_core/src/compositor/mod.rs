//! Per-frame composition: shaped rows in, cell table out.
//!
//! [`FrameCompositor::render`] walks the visible rows, resolves every glyph
//! through the per-face caches (rasterizing and packing it into the atlas on
//! a miss) and points the cell under each glyph at its atlas position. The
//! finished [`CellGrid`] is bound to the sink, composited and handed back
//! inside a [`Frame`] together with decoration quads, ligature segments and
//! the dirty rect.
//!
//! When the atlas fills up mid-frame the cells gathered so far are flushed
//! to the GPU, marked retired and the atlas is reset, so the frame can keep
//! going with an empty texture.

mod frame;

use std::fmt;

use log::{debug, trace, warn};

pub use self::frame::{DirtyRect, Frame, OverlapSegment};
use crate::atlas::AtlasStore;
use crate::builtin::{Canvas, draw_builtin_glyph, draw_soft_font_glyph, is_soft_font_char};
use crate::cell::{CellGrid, GlyphBox};
use crate::config::AtlasConfig;
use crate::decoration::{DecorationMetrics, row_decorations};
use crate::error::{RenderError, Result};
use crate::glyph::{GlyphEntry, LineRendition, ShadingType, split_double_height};
use crate::invalidation::{Changes, InvalidationKind, InvalidationTracker};
use crate::observer::FrameObserver;
use crate::registry::{FaceId, FontFaceRegistry};
use crate::row::{FramePayload, ShapedRow};
use crate::settings::{AntialiasingMode, FontSettings, Settings};
use crate::sink::{AtlasPixels, AtlasRegion, GlyphContent, GlyphRequest, GpuSink, Rasterizer};
use crate::warning::{RenderWarning, WarningKind};

/// State derived from [`FontSettings`], rebuilt on every font change.
#[derive(Debug, Clone, Copy, Default)]
struct FontState {
    text_shading: ShadingType,
    /// Glyph box edges past which a wide glyph counts as a ligature.
    /// `None` when ligatures are disabled.
    ligature_triggers: Option<(i32, i32)>,
    decorations: DecorationMetrics,
}

impl FontState {
    fn new(font: &FontSettings) -> Self {
        let text_shading = match font.antialiasing {
            AntialiasingMode::ClearType => ShadingType::ClearTypeText,
            AntialiasingMode::Grayscale | AntialiasingMode::Aliased => ShadingType::GrayscaleText,
        };
        let half_cell = font.cell_width as i32 / 2;
        let ligature_triggers = font
            .ligatures_enabled()
            .then_some((-half_cell, font.advance_width + half_cell));
        Self {
            text_shading,
            ligature_triggers,
            decorations: DecorationMetrics::from_font(font),
        }
    }
}

type WarningHandler = Box<dyn FnMut(&RenderWarning)>;

/// Owns the atlas and glyph caches and composes frames against them.
pub struct FrameCompositor {
    atlas: AtlasStore,
    registry: FontFaceRegistry,
    tracker: InvalidationTracker,
    font: FontState,
    reset_pending: bool,
    observers: Vec<Box<dyn FrameObserver>>,
    on_warning: Option<WarningHandler>,
}

impl fmt::Debug for FrameCompositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCompositor")
            .field("atlas", &self.atlas)
            .field("faces", &self.registry.face_count())
            .field("reset_pending", &self.reset_pending)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl FrameCompositor {
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            atlas: AtlasStore::new(config),
            registry: FontFaceRegistry::new(),
            tracker: InvalidationTracker::new(),
            font: FontState::default(),
            reset_pending: false,
            observers: Vec::new(),
            on_warning: None,
        }
    }

    pub fn atlas(&self) -> &AtlasStore {
        &self.atlas
    }

    pub fn registry(&self) -> &FontFaceRegistry {
        &self.registry
    }

    /// Force `kind` to be treated as changed on the next frame.
    pub fn invalidate(&mut self, kind: InvalidationKind) {
        self.tracker.invalidate(kind);
    }

    /// Receive warnings as they happen. They are logged either way.
    pub fn set_warning_handler(&mut self, handler: impl FnMut(&RenderWarning) + 'static) {
        self.on_warning = Some(Box::new(handler));
    }

    pub fn add_observer(&mut self, observer: impl FrameObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Compose one frame and submit it to `sink`.
    pub fn render<S, R>(
        &mut self,
        settings: &Settings,
        payload: &FramePayload<'_>,
        sink: &mut S,
        rasterizer: &mut R,
    ) -> Result<Frame>
    where
        S: GpuSink + ?Sized,
        R: Rasterizer + ?Sized,
    {
        let mut changes = self.tracker.poll(settings);
        for observer in &mut self.observers {
            changes |= observer.before_frame();
        }
        self.apply_changes(changes, settings, sink)?;

        if self.reset_pending {
            self.atlas
                .reset(settings.font.cell_area(), settings.target_area(), sink)?;
            self.reset_pending = false;
        }

        let (cols, rows) = settings.viewport_cell_count();
        let mut frame = Frame {
            cells: CellGrid::from_colors(cols, rows, payload.background, payload.foreground),
            decorations: Vec::new(),
            overlap_segments: Vec::new(),
            dirty: DirtyRect::default(),
            changes,
            flushes: 0,
        };

        let mut overhang: Option<(i32, i32)> = None;
        for (y, row) in payload.rows.iter().take(usize::from(rows)).enumerate() {
            let y = y as u16;
            let extent = self.compose_row(settings, y, row, &mut frame, sink, rasterizer)?;
            row_decorations(&mut frame.decorations, &self.font.decorations, row, y);
            if payload.invalidated_rows.contains(&y) {
                if let Some((top, bottom)) = extent {
                    overhang = Some(match overhang {
                        Some((t, b)) => (t.min(top), b.max(bottom)),
                        None => (top, bottom),
                    });
                }
            }
        }

        frame.dirty = if changes.contains(Changes::SETTINGS) || settings.misc.has_custom_shader() {
            DirtyRect::full(settings.target_size())
        } else {
            dirty_rect(settings, payload, overhang)
        };

        sink.bind_cell_table(&frame.cells)?;
        sink.dispatch_composite()?;

        for observer in &mut self.observers {
            observer.after_frame(&mut frame);
        }
        Ok(frame)
    }

    fn apply_changes<S: GpuSink + ?Sized>(
        &mut self,
        changes: Changes,
        settings: &Settings,
        sink: &mut S,
    ) -> Result<()> {
        if changes.contains(Changes::FONT) {
            debug!("font settings changed, atlas reset pending");
            self.font = FontState::new(&settings.font);
            self.reset_pending = true;
        }
        if changes.contains(Changes::MISC) {
            if let Err(warning) = sink.apply_misc(&settings.misc) {
                self.warn(&warning);
            }
        }
        if changes.contains(Changes::CELL_COUNT) {
            let (cols, rows) = settings.viewport_cell_count();
            debug!("viewport is now {cols}x{rows} cells");
            sink.resize_cell_table(cols, rows)?;
        }
        Ok(())
    }

    /// Place the glyphs of row `y`. Returns the vertical pixel extent of
    /// everything drawn, if anything was.
    fn compose_row<S, R>(
        &mut self,
        settings: &Settings,
        y: u16,
        row: &ShapedRow,
        frame: &mut Frame,
        sink: &mut S,
        rasterizer: &mut R,
    ) -> Result<Option<(i32, i32)>>
    where
        S: GpuSink + ?Sized,
        R: Rasterizer + ?Sized,
    {
        let font = &*settings.font;
        let cell_w = font.cell_width.max(1) as i32;
        let cell_h = font.cell_height as i32;
        let rendition = row.line_rendition;
        let (scale_x, scale_y) = rendition.scale();

        let mut baseline_x = 0.0f32;
        let mut baseline_y = (i32::from(y) * cell_h + font.baseline) as f32;
        if rendition.is_double_height() {
            baseline_y /= 2.0;
        }

        let mut extent: Option<(i32, i32)> = None;
        for mapping in &row.mappings {
            let to = mapping.glyphs_to.min(row.glyph_indices.len());
            let mut x = mapping.glyphs_from;
            while x < to {
                let (glyph_index, units) = match mapping.face {
                    Some(_) => (row.glyph_indices[x], 1),
                    None => combine_surrogates(&row.glyph_indices[x..to]),
                };

                let entry = self.glyph_entry(settings, mapping.face, rendition, glyph_index, frame, sink, rasterizer)?;
                if entry.is_drawable() {
                    let offset = row.offset(x);
                    let l = ((baseline_x + offset.advance_offset) * scale_x as f32).round() as i32 + entry.offset.0;
                    let t = ((baseline_y - offset.ascender_offset) * scale_y as f32).round() as i32 + entry.offset.1;
                    let bottom = t + entry.size.1 as i32;
                    extent = Some(match extent {
                        Some((top, b)) => (top.min(t), b.max(bottom)),
                        None => (t, bottom),
                    });

                    let cx = (l + entry.size.0 as i32 / 2).div_euclid(cell_w);
                    // The row stays `y`: a box midpoint past the row band
                    // would address a row this pass is not composing.
                    if let Ok(col) = u16::try_from(cx) {
                        let origin = (l - cx * cell_w, t - i32::from(y) * cell_h);
                        let glyph_box = GlyphBox::new(origin, entry.size);
                        frame.cells.set_glyph(col, y, entry.texcoord, glyph_box);
                    }
                    if entry.overlap_split {
                        push_overlap_segments(frame, &entry, (l, t), y, cell_w);
                    }
                }

                for i in x..x + units {
                    baseline_x += row.advance(i);
                }
                x += units;
            }
        }

        Ok(extent)
    }

    /// Cached entry for a glyph, rasterizing and packing it on a miss.
    fn glyph_entry<S, R>(
        &mut self,
        settings: &Settings,
        face: Option<FaceId>,
        rendition: LineRendition,
        glyph_index: u32,
        frame: &mut Frame,
        sink: &mut S,
        rasterizer: &mut R,
    ) -> Result<GlyphEntry>
    where
        S: GpuSink + ?Sized,
        R: Rasterizer + ?Sized,
    {
        let epoch = self.atlas.epoch();
        if let Some(entry) = self.registry.resolve(face).glyphs(rendition).lookup(glyph_index, epoch) {
            return Ok(*entry);
        }

        let entry = match face {
            Some(face) => {
                self.rasterize_glyph(settings, face, rendition, glyph_index, frame, sink, rasterizer)?
            }
            None => self.draw_builtin(settings, rendition, glyph_index, frame, sink)?,
        };
        trace!(
            "glyph {glyph_index} of {face:?} ({rendition:?}): {:?} {}x{} at {:?}",
            entry.shading, entry.size.0, entry.size.1, entry.texcoord
        );

        // A flush while packing bumps the epoch; store under the new one.
        let epoch = self.atlas.epoch();
        let caches = self.registry.resolve(face);
        if rendition.is_double_height() {
            let (top, bottom) = split_double_height(entry, &settings.font);
            let (own, sibling) = if rendition == LineRendition::DoubleHeightTop {
                (top, bottom)
            } else {
                (bottom, top)
            };
            caches.glyphs_mut(rendition.sibling()).insert(sibling, epoch);
            caches.glyphs_mut(rendition).insert(own, epoch);
            Ok(own)
        } else {
            caches.glyphs_mut(rendition).insert(entry, epoch);
            Ok(entry)
        }
    }

    fn rasterize_glyph<S, R>(
        &mut self,
        settings: &Settings,
        face: FaceId,
        rendition: LineRendition,
        glyph_index: u32,
        frame: &mut Frame,
        sink: &mut S,
        rasterizer: &mut R,
    ) -> Result<GlyphEntry>
    where
        S: GpuSink + ?Sized,
        R: Rasterizer + ?Sized,
    {
        let font = &*settings.font;
        let (scale_x, scale_y) = rendition.scale();
        let request = GlyphRequest {
            face,
            glyph_index,
            em_size: font.font_size,
            scale: (scale_x, scale_y),
            antialiasing: font.antialiasing,
            color_glyphs: font.color_glyphs,
        };

        let glyph = match rasterizer.rasterize(&request) {
            Ok(Some(glyph)) if !glyph.bounds.is_empty() => glyph,
            Ok(_) => return Ok(GlyphEntry::blank(glyph_index)),
            Err(err) => {
                self.warn(&RenderWarning::new(
                    WarningKind::RasterizationFailed,
                    format!("face {} glyph {glyph_index}: {err}", face.0),
                ));
                return Ok(GlyphEntry::blank(glyph_index));
            }
        };

        let bounds = glyph.bounds;
        let size = (bounds.width(), bounds.height());
        let texcoord = self.allocate(settings, size, frame, sink)?;
        sink.upload_atlas_region(
            AtlasRegion {
                x: texcoord.0,
                y: texcoord.1,
                width: size.0,
                height: size.1,
            },
            glyph.atlas_pixels(),
        )?;

        let overlap_split = size.0 >= font.cell_width
            && self.font.ligature_triggers.is_some_and(|(left, right)| {
                bounds.left <= left * scale_x as i32 || bounds.right >= right * scale_x as i32
            });
        let shading = if glyph.content == GlyphContent::Color {
            ShadingType::Passthrough
        } else {
            self.font.text_shading
        };

        Ok(GlyphEntry {
            glyph_index,
            shading,
            overlap_split,
            offset: (bounds.left, bounds.top),
            size,
            texcoord,
        })
    }

    /// Box drawing, blocks and soft-font characters, drawn at the exact
    /// (rendition-scaled) cell size.
    fn draw_builtin<S: GpuSink + ?Sized>(
        &mut self,
        settings: &Settings,
        rendition: LineRendition,
        codepoint: u32,
        frame: &mut Frame,
        sink: &mut S,
    ) -> Result<GlyphEntry> {
        let font = &*settings.font;
        let (scale_x, scale_y) = rendition.scale();
        let size = (font.cell_width * scale_x, font.cell_height * scale_y);
        let baseline = font.baseline * scale_y as i32;

        let Some(c) = char::from_u32(codepoint) else {
            return Ok(GlyphEntry::blank(codepoint));
        };
        let mut canvas = Canvas::new(size.0, size.1);
        let (drawn, shading) = if is_soft_font_char(c) {
            let drawn = font
                .soft_font
                .as_ref()
                .is_some_and(|soft| draw_soft_font_glyph(soft, c, &mut canvas));
            (drawn, ShadingType::GrayscaleText)
        } else {
            (draw_builtin_glyph(c, &mut canvas), ShadingType::BuiltinGlyph)
        };
        if !drawn || canvas.is_blank() {
            return Ok(GlyphEntry::blank(codepoint));
        }

        let texcoord = self.allocate(settings, size, frame, sink)?;
        sink.upload_atlas_region(
            AtlasRegion {
                x: texcoord.0,
                y: texcoord.1,
                width: size.0,
                height: size.1,
            },
            AtlasPixels::Alpha(canvas.pixels()),
        )?;

        Ok(GlyphEntry {
            glyph_index: codepoint,
            shading,
            overlap_split: false,
            offset: (0, -baseline),
            size,
            texcoord,
        })
    }

    /// Pack `size` into the atlas. A full atlas is flushed and reset once
    /// before giving up.
    fn allocate<S: GpuSink + ?Sized>(
        &mut self,
        settings: &Settings,
        size: (u32, u32),
        frame: &mut Frame,
        sink: &mut S,
    ) -> Result<(u32, u32)> {
        if let Some(position) = self.atlas.allocate(size.0, size.1) {
            return Ok(position);
        }

        let (atlas_width, atlas_height) = self.atlas.dimensions();
        debug!(
            "atlas {atlas_width}x{atlas_height} full at {}x{} glyph, flushing",
            size.0, size.1
        );
        sink.bind_cell_table(&frame.cells)?;
        sink.dispatch_composite()?;
        frame.cells.retire_glyphs();
        // Their texels are about to be overwritten.
        frame.overlap_segments.clear();
        frame.flushes += 1;

        self.atlas
            .reset(settings.font.cell_area(), settings.target_area(), sink)?;
        self.atlas.allocate(size.0, size.1).ok_or_else(|| {
            let (atlas_width, atlas_height) = self.atlas.dimensions();
            RenderError::AtlasExhausted {
                width: size.0,
                height: size.1,
                atlas_width,
                atlas_height,
            }
        })
    }

    fn warn(&mut self, warning: &RenderWarning) {
        warn!("{warning}");
        if let Some(handler) = &mut self.on_warning {
            handler(warning);
        }
    }
}

/// Builtin runs carry UTF-16 code units; fold a surrogate pair into one
/// scalar. Returns the code point and how many units it used.
fn combine_surrogates(units: &[u32]) -> (u32, usize) {
    match units {
        [high @ 0xD800..=0xDBFF, low @ 0xDC00..=0xDFFF, ..] => {
            (0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00), 2)
        }
        [unit, ..] => (*unit, 1),
        [] => (0, 1),
    }
}

/// Slice a ligature at `(l, t)` into one segment per covered column, each
/// starting at the column's left edge and running to the glyph's end.
fn push_overlap_segments(frame: &mut Frame, entry: &GlyphEntry, (l, t): (i32, i32), y: u16, cell_w: i32) {
    let right = l + entry.size.0 as i32;
    let first = l.div_euclid(cell_w).max(0);
    let last = (right - 1).div_euclid(cell_w);
    for c in first..=last {
        let Some(cell) = u16::try_from(c).ok().and_then(|col| frame.cells.get(col, y)) else {
            break;
        };
        let left = l.max(c * cell_w);
        let color = cell.foreground;
        frame.overlap_segments.push(OverlapSegment {
            shading: entry.shading,
            position: (left, t),
            size: ((right - left) as u32, entry.size.1),
            texcoord: (entry.texcoord.0 + (left - l) as u32, entry.texcoord.1),
            color,
        });
    }
}

/// Invalidated rows across the full width, grown by whatever their glyphs
/// overhang, clamped to the target.
fn dirty_rect(settings: &Settings, payload: &FramePayload<'_>, overhang: Option<(i32, i32)>) -> DirtyRect {
    let (width, height) = settings.target_size();
    let cell_h = settings.font.cell_height as i64;
    let rows = &payload.invalidated_rows;

    let mut span = (!rows.is_empty())
        .then(|| (i64::from(rows.start) * cell_h, i64::from(rows.end) * cell_h));
    if let Some((top, bottom)) = overhang {
        let (top, bottom) = (i64::from(top), i64::from(bottom));
        span = Some(match span {
            Some((t, b)) => (t.min(top), b.max(bottom)),
            None => (top, bottom),
        });
    }

    match span {
        Some((top, bottom)) => {
            let clamp = |v: i64| v.clamp(0, i64::from(height)) as u32;
            DirtyRect {
                left: 0,
                top: clamp(top),
                right: width,
                bottom: clamp(bottom),
            }
        }
        None => DirtyRect::default(),
    }
}
