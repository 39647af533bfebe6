use std::path::PathBuf;

use atlas_core::{
    AtlasConfig, AtlasPixels, AtlasRegion, CellGrid, FaceId, FontSettings, FrameCompositor,
    FramePayload, GlyphBounds, GlyphContent, GlyphOffset, GlyphRequest, GpuSink, MiscSettings,
    RasterError, RasterizedGlyph, Rasterizer, RenderError, Settings, ShapedRow, WarningKind,
};

use super::pipeline::{UNIFORM_SIZE, uniform_bytes, workgroup_count};
use super::{GpuContext, WgpuSink, expand_to_rgba, load_shader_resources};
use crate::font::FontCollection;

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glyph_atlas_gpu_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// A sink on whatever adapter the host offers, or `None` on machines
/// without one.
fn sink(target: (u32, u32)) -> Option<WgpuSink> {
    let _ = env_logger::builder().is_test(true).try_init();
    let ctx = GpuContext::headless().ok()?;
    Some(WgpuSink::new(ctx, target, (10, 20)))
}

#[test]
fn masks_expand_to_four_channels() {
    let rgba = expand_to_rgba(AtlasPixels::Alpha(&[0, 0x80]));
    assert_eq!(&*rgba, &[0, 0, 0, 0, 0x80, 0x80, 0x80, 0x80]);
}

#[test]
fn rgba_passes_through() {
    let data = [1, 2, 3, 4];
    let rgba = expand_to_rgba(AtlasPixels::Rgba(&data));
    assert!(matches!(rgba, std::borrow::Cow::Borrowed(_)));
    assert_eq!(&*rgba, &data);
}

#[test]
fn workgroups_cover_partial_tiles() {
    assert_eq!(workgroup_count((800, 600)), (100, 75));
    assert_eq!(workgroup_count((801, 1)), (101, 1));
    assert_eq!(workgroup_count((0, 0)), (0, 0));
}

#[test]
fn uniform_layout_is_little_endian() {
    let bytes = uniform_bytes((0, 20), (80, 24), (800, 480), 0xff00_0000, 1);
    assert_eq!(bytes.len() as u64, UNIFORM_SIZE);
    // Zero cell size is bumped to 1 so the shader never divides by zero.
    assert_eq!(bytes[0..4], 1u32.to_le_bytes());
    assert_eq!(bytes[8..12], 80u32.to_le_bytes());
    assert_eq!(bytes[20..24], 480u32.to_le_bytes());
    assert_eq!(bytes[24..28], 0xff00_0000u32.to_le_bytes());
    assert_eq!(bytes[28..32], 1u32.to_le_bytes());
}

#[test]
fn no_shader_loads_nothing() {
    let resources = load_shader_resources(&MiscSettings::default()).expect("nothing to load");
    assert_eq!(resources.shader_source, None);
    assert_eq!(resources.image, None);
}

#[test]
fn missing_shader_warns_with_path() {
    let path = PathBuf::from("/no/such/post.wgsl");
    let misc = MiscSettings {
        custom_shader_path: Some(path.clone()),
        ..MiscSettings::default()
    };
    let warning = load_shader_resources(&misc).unwrap_err();
    assert_eq!(warning.kind, WarningKind::ShaderLoadFailed);
    assert_eq!(warning.context, path.display().to_string());
}

#[test]
fn missing_image_warns_with_path() {
    let shader = scratch_dir().join("ok.wgsl");
    std::fs::write(&shader, "// post").expect("write shader");
    let misc = MiscSettings {
        custom_shader_path: Some(shader),
        shader_image_path: Some(PathBuf::from("/no/such/noise.png")),
        ..MiscSettings::default()
    };
    let warning = load_shader_resources(&misc).unwrap_err();
    assert_eq!(warning.kind, WarningKind::ShaderImageLoadFailed);
    assert!(warning.context.ends_with("noise.png"));
}

#[test]
fn shader_and_image_load_from_disk() {
    let dir = scratch_dir();
    let shader = dir.join("post.wgsl");
    let image = dir.join("noise.bin");
    std::fs::write(&shader, "// post").expect("write shader");
    std::fs::write(&image, [7u8, 8, 9]).expect("write image");
    let misc = MiscSettings {
        custom_shader_path: Some(shader),
        shader_image_path: Some(image),
        ..MiscSettings::default()
    };
    let resources = load_shader_resources(&misc).expect("both exist");
    assert_eq!(resources.shader_source.as_deref(), Some("// post"));
    assert_eq!(resources.image, Some(vec![7, 8, 9]));
}

#[test]
fn dispatch_without_atlas_is_an_error() {
    let Some(mut sink) = sink((80, 40)) else {
        return;
    };
    sink.bind_cell_table(&CellGrid::new(8, 2)).expect("bind");
    assert!(matches!(sink.dispatch_composite(), Err(RenderError::Gpu(_))));
    assert_eq!(sink.dispatches(), 0);
}

#[test]
fn oversized_atlas_is_rejected() {
    let Some(mut sink) = sink((80, 40)) else {
        return;
    };
    let too_big = sink.max_texture_dimension() + 1;
    assert!(matches!(sink.create_atlas(too_big, 16), Err(RenderError::Gpu(_))));
}

#[test]
fn upload_size_is_checked() {
    let Some(mut sink) = sink((80, 40)) else {
        return;
    };
    let region = AtlasRegion {
        x: 0,
        y: 0,
        width: 2,
        height: 2,
    };
    assert!(sink.upload_atlas_region(region, AtlasPixels::Alpha(&[0; 4])).is_err());
    sink.create_atlas(64, 64).expect("atlas");
    sink.upload_atlas_region(region, AtlasPixels::Alpha(&[0; 4]))
        .expect("upload");
    assert!(sink.upload_atlas_region(region, AtlasPixels::Rgba(&[0; 4])).is_err());
}

#[test]
fn apply_misc_keeps_resources_until_failure() {
    let Some(mut sink) = sink((80, 40)) else {
        return;
    };
    let shader = scratch_dir().join("kept.wgsl");
    std::fs::write(&shader, "// kept").expect("write shader");
    let ok = MiscSettings {
        custom_shader_path: Some(shader),
        retro_effect: true,
        ..MiscSettings::default()
    };
    sink.apply_misc(&ok).expect("loads");
    assert_eq!(sink.shader_resources().shader_source.as_deref(), Some("// kept"));

    let broken = MiscSettings {
        custom_shader_path: Some(PathBuf::from("/no/such/post.wgsl")),
        ..MiscSettings::default()
    };
    let warning = sink.apply_misc(&broken).unwrap_err();
    assert_eq!(warning.kind, WarningKind::ShaderLoadFailed);
    assert_eq!(sink.shader_resources().shader_source, None);
}

#[test]
fn frames_composite_on_the_gpu() {
    let Some(mut sink) = sink((100, 40)) else {
        return;
    };
    let mut row = ShapedRow::default();
    row.push_run(
        None,
        "─│┼".chars().map(|c| (u32::from(c), 10.0, GlyphOffset::default())),
    );
    let rows = [row];
    let payload = FramePayload {
        rows: &rows,
        background: &[],
        foreground: &[],
        invalidated_rows: 0..2,
    };
    let settings = Settings::new(FontSettings::default(), (100, 40));
    let mut compositor = FrameCompositor::new(AtlasConfig::default());
    let mut fonts = FontCollection::new(16.0);

    let frame = compositor
        .render(&settings, &payload, &mut sink, &mut fonts)
        .expect("frame");
    assert_eq!(frame.cells.cols(), 10);
    assert_eq!(frame.cells.cells().iter().filter(|c| c.has_glyph()).count(), 3);
    assert_eq!(sink.dispatches(), 1);
    assert_eq!(sink.target_size(), (100, 40));

    sink.resize((200, 40), (10, 20));
    assert_eq!(sink.output().width(), 200);
    assert!(sink.context().max_texture_dimension() >= 2048);
}

/// Fully covered boxes: glyph 1 sits at (1,-12)..(7,-2) from the pen, any
/// other glyph at (2,-14)..(8,-4).
struct SolidBoxes;

impl Rasterizer for SolidBoxes {
    fn rasterize(
        &mut self,
        request: &GlyphRequest,
    ) -> Result<Option<RasterizedGlyph>, RasterError> {
        let bounds = if request.glyph_index == 1 {
            GlyphBounds { left: 1, top: -12, right: 7, bottom: -2 }
        } else {
            GlyphBounds { left: 2, top: -14, right: 8, bottom: -4 }
        };
        Ok(Some(RasterizedGlyph {
            bounds,
            content: GlyphContent::Mask,
            pixels: vec![0xff; 60],
        }))
    }
}

#[test]
fn glyphs_land_on_the_baseline_inside_their_box() {
    let Some(mut sink) = sink((40, 20)) else {
        return;
    };
    let mut row = ShapedRow::default();
    row.push_run(
        Some(FaceId(0)),
        [1, 2].map(|g| (g, 10.0, GlyphOffset::default())),
    );
    let rows = [row];
    let payload = FramePayload {
        rows: &rows,
        background: &[],
        foreground: &[],
        invalidated_rows: 0..1,
    };
    let settings = Settings::new(FontSettings::default(), (40, 20));
    let mut compositor = FrameCompositor::new(AtlasConfig::default());
    compositor
        .render(&settings, &payload, &mut sink, &mut SolidBoxes)
        .expect("frame");

    let pixels = sink.read_output().expect("readback");
    assert_eq!(pixels.len(), 40 * 20 * 4);
    // Baseline 16: the first box covers x 1..7, y 4..14 of cell 0; the
    // second x 12..18, y 2..12 of cell 1. The two are packed side by side
    // in the atlas, so sampling past either box would pick up the other.
    let inside = |x: usize, y: usize| {
        ((1..7).contains(&x) && (4..14).contains(&y))
            || ((12..18).contains(&x) && (2..12).contains(&y))
    };
    for y in 0..20 {
        for x in 0..40 {
            let i = (y * 40 + x) * 4;
            let expected: [u8; 4] = if inside(x, y) {
                [0xff, 0xff, 0xff, 0xff]
            } else {
                [0, 0, 0, 0xff]
            };
            assert_eq!(pixels[i..i + 4], expected, "pixel ({x}, {y})");
        }
    }
}
