//! Benchmarks for the atlas hot paths.
//!
//! - **pack**: filling a fresh atlas with glyph-sized rectangles, the cost
//!   paid once per atlas reset.
//! - **render/warm**: composing a full viewport whose glyphs are all cached,
//!   which is what nearly every frame looks like.
//!
//! Viewport sizes match the grid benches: 80x24, 120x50 and 240x80.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use atlas_core::{
    AtlasConfig, FaceId, FontSettings, FrameCompositor, FramePayload, GlyphBounds, GlyphContent,
    GlyphOffset, GlyphRequest, RasterError, RasterizedGlyph, Rasterizer, RectPacker, Settings,
    ShapedRow, VoidSink,
};

const SIZES: [(u16, u16); 3] = [(80, 24), (120, 50), (240, 80)];

/// Every glyph is a 6x10 solid mask; nothing is parsed.
struct BoxRasterizer;

impl Rasterizer for BoxRasterizer {
    fn rasterize(&mut self, request: &GlyphRequest) -> Result<Option<RasterizedGlyph>, RasterError> {
        if request.glyph_index == 0 {
            return Ok(None);
        }
        Ok(Some(RasterizedGlyph {
            bounds: GlyphBounds {
                left: 1,
                top: -12,
                right: 7,
                bottom: -2,
            },
            content: GlyphContent::Mask,
            pixels: vec![0xff; 60],
        }))
    }
}

/// Printable ASCII cycling through 95 glyph indices, every 8th a space.
fn text_rows(cols: u16, rows: u16) -> Vec<ShapedRow> {
    (0..rows)
        .map(|y| {
            let mut row = ShapedRow::default();
            row.push_run(
                Some(FaceId(1)),
                (0..cols).map(|x| {
                    let index = (u32::from(x) + u32::from(y)) % 95;
                    let index = if x % 8 == 7 { 0 } else { index + 1 };
                    (index, 10.0, GlyphOffset::default())
                }),
            );
            row
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack/fill_1024");
    for (w, h) in [(6u32, 10u32), (10, 20), (20, 20)] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &(w, h), |b, &(w, h)| {
            let mut packer = RectPacker::new(1024, 1024);
            b.iter(|| {
                packer.reset(1024, 1024);
                while packer.pack(black_box(w), black_box(h)).is_some() {}
                black_box(packer.used_area());
            });
        });
    }
    group.finish();
}

fn bench_render_warm(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/warm");
    for &(cols, rows) in &SIZES {
        let font = FontSettings::default();
        let settings = Settings::new(
            font.clone(),
            (u32::from(cols) * font.cell_width, u32::from(rows) * font.cell_height),
        );
        let shaped = text_rows(cols, rows);
        let payload = FramePayload {
            rows: &shaped,
            background: &[],
            foreground: &[],
            invalidated_rows: 0..rows,
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{cols}x{rows}")),
            &payload,
            |b, payload| {
                let mut compositor = FrameCompositor::new(AtlasConfig::default());
                let mut sink = VoidSink;
                let mut raster = BoxRasterizer;
                // Prime the caches.
                let _ = compositor.render(&settings, payload, &mut sink, &mut raster);
                b.iter(|| {
                    let frame = compositor.render(&settings, payload, &mut sink, &mut raster);
                    black_box(frame.is_ok());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pack, bench_render_warm);
criterion_main!(benches);
