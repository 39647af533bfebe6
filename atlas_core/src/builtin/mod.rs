//! Procedurally drawn glyphs: box drawing, block elements, braille,
//! Powerline separators and soft-font characters.
//!
//! These are rasterized on the CPU into a [`Canvas`] at the exact cell size
//! and uploaded into the atlas like any other glyph, so lines join
//! seamlessly across cells regardless of the loaded font.

mod canvas;
mod shapes;
mod soft_font;

pub use canvas::{Canvas, OPAQUE};
pub use soft_font::{SOFT_FONT_FIRST, SOFT_FONT_LAST, draw_soft_font_glyph, is_soft_font_char};

/// Whether `c` is drawn procedurally instead of through the font.
pub fn is_builtin_glyph(c: char) -> bool {
    matches!(c,
        '\u{2500}'..='\u{259F}' |  // Box Drawing, Block Elements
        '\u{2800}'..='\u{28FF}' |  // Braille Patterns
        '\u{E0B0}'..='\u{E0B4}' |  // Powerline separators
        '\u{E0B6}' |
        SOFT_FONT_FIRST..=SOFT_FONT_LAST
    )
}

/// Draw `c` into `canvas`, which spans exactly one glyph cell (already
/// scaled for the line rendition).
///
/// Returns `false` if `c` has no procedural form. Soft-font characters
/// need their pattern and go through [`draw_soft_font_glyph`] instead.
pub fn draw_builtin_glyph(c: char, canvas: &mut Canvas) -> bool {
    match c {
        '\u{2500}'..='\u{257F}' => draw_box_drawing(c, canvas),
        '\u{2580}'..='\u{259F}' => shapes::draw_block_element(c, canvas),
        '\u{2800}'..='\u{28FF}' => shapes::draw_braille(c, canvas),
        '\u{E0B0}'..='\u{E0B4}' | '\u{E0B6}' => shapes::draw_powerline(c, canvas),
        _ => false,
    }
}

/// Stroke weight of one arm of a box drawing character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weight {
    None,
    Light,
    Heavy,
    Double,
}

impl Weight {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Self::Light,
            2 => Self::Heavy,
            3 => Self::Double,
            _ => Self::None,
        }
    }
}

/// Arms of U+2500..U+257F, two bits each: left, right, up, down from the
/// high bits down. 0 none, 1 light, 2 heavy, 3 double. Dashed variants
/// are drawn solid; arcs and diagonals are handled separately.
#[rustfmt::skip]
const BOX_ARMS: [u8; 128] = [
    0x50, 0xa0, 0x05, 0x0a, 0x50, 0xa0, 0x05, 0x0a, // 2500
    0x50, 0xa0, 0x05, 0x0a, 0x11, 0x21, 0x12, 0x22, // 2508
    0x41, 0x81, 0x42, 0x82, 0x14, 0x24, 0x18, 0x28, // 2510
    0x44, 0x84, 0x48, 0x88, 0x15, 0x25, 0x19, 0x16, // 2518
    0x1a, 0x29, 0x26, 0x2a, 0x45, 0x85, 0x49, 0x46, // 2520
    0x4a, 0x89, 0x86, 0x8a, 0x51, 0x91, 0x61, 0xa1, // 2528
    0x52, 0x92, 0x62, 0xa2, 0x54, 0x94, 0x64, 0xa4, // 2530
    0x58, 0x98, 0x68, 0xa8, 0x55, 0x95, 0x65, 0xa5, // 2538
    0x59, 0x56, 0x5a, 0x99, 0x69, 0x96, 0x66, 0xa9, // 2540
    0xa6, 0x9a, 0x6a, 0xaa, 0x50, 0xa0, 0x05, 0x0a, // 2548
    0xf0, 0x0f, 0x13, 0x31, 0x33, 0x43, 0xc1, 0xc3, // 2550
    0x1c, 0x34, 0x3c, 0x4c, 0xc4, 0xcc, 0x1f, 0x35, // 2558
    0x3f, 0x4f, 0xc5, 0xcf, 0x53, 0xf1, 0xf3, 0x5c, // 2560
    0xf4, 0xfc, 0x5f, 0xf5, 0xff, 0x00, 0x00, 0x00, // 2568
    0x00, 0x00, 0x00, 0x00, 0x40, 0x04, 0x10, 0x01, // 2570
    0x80, 0x08, 0x20, 0x02, 0x60, 0x06, 0x90, 0x09, // 2578
];

/// `[left, right, up, down]` arm weights of a box drawing character.
fn box_arms(c: char) -> [Weight; 4] {
    let Some(&packed) = (c as usize)
        .checked_sub(0x2500)
        .and_then(|idx| BOX_ARMS.get(idx))
    else {
        return [Weight::None; 4];
    };
    [
        Weight::from_bits(packed >> 6),
        Weight::from_bits(packed >> 4),
        Weight::from_bits(packed >> 2),
        Weight::from_bits(packed),
    ]
}

/// Stroke thicknesses for a cell width: light is 1/8 of the cell, at
/// least a pixel; heavy is three lights, at most half the cell.
fn stroke_widths(w: f32) -> (f32, f32) {
    let light = (w / 8.0).round().max(1.0);
    (light, (light * 3.0).min(w / 2.0))
}

fn draw_box_drawing(c: char, canvas: &mut Canvas) -> bool {
    match c {
        '\u{256D}'..='\u{2570}' => return draw_arc_corner(c, canvas),
        '\u{2571}'..='\u{2573}' => return draw_diagonal(c, canvas),
        _ => {}
    }

    let [left, right, up, down] = box_arms(c);
    if [left, right, up, down].iter().all(|w| *w == Weight::None) {
        return false;
    }

    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let cx = (w / 2.0).floor();
    let cy = (h / 2.0).floor();
    let strokes = stroke_widths(w);

    horizontal_arm(canvas, left, 0.0, cx, cy, strokes);
    horizontal_arm(canvas, right, cx, w, cy, strokes);
    vertical_arm(canvas, up, 0.0, cy, cx, strokes);
    vertical_arm(canvas, down, cy, h, cx, strokes);
    true
}

/// Horizontal arm over `[x0, x1)` centered on row `cy`.
fn horizontal_arm(canvas: &mut Canvas, weight: Weight, x0: f32, x1: f32, cy: f32, (light, heavy): (f32, f32)) {
    let len = x1 - x0;
    if len <= 0.0 {
        return;
    }
    match weight {
        Weight::None => {}
        Weight::Light => canvas.fill_rect(x0, cy - (light / 2.0).floor(), len, light, OPAQUE),
        Weight::Heavy => canvas.fill_rect(x0, cy - (heavy / 2.0).floor(), len, heavy, OPAQUE),
        Weight::Double => {
            let gap = (light * 2.0).max(2.0);
            canvas.fill_rect(x0, cy - (gap / 2.0).floor() - light, len, light, OPAQUE);
            canvas.fill_rect(x0, cy + (gap / 2.0).ceil(), len, light, OPAQUE);
        }
    }
}

/// Vertical arm over `[y0, y1)` centered on column `cx`.
fn vertical_arm(canvas: &mut Canvas, weight: Weight, y0: f32, y1: f32, cx: f32, (light, heavy): (f32, f32)) {
    let len = y1 - y0;
    if len <= 0.0 {
        return;
    }
    match weight {
        Weight::None => {}
        Weight::Light => canvas.fill_rect(cx - (light / 2.0).floor(), y0, light, len, OPAQUE),
        Weight::Heavy => canvas.fill_rect(cx - (heavy / 2.0).floor(), y0, heavy, len, OPAQUE),
        Weight::Double => {
            let gap = (light * 2.0).max(2.0);
            canvas.fill_rect(cx - (gap / 2.0).floor() - light, y0, light, len, OPAQUE);
            canvas.fill_rect(cx + (gap / 2.0).ceil(), y0, light, len, OPAQUE);
        }
    }
}

/// Rounded corners (U+256D..U+2570), approximated by a quarter circle
/// joining the two light arms.
fn draw_arc_corner(c: char, canvas: &mut Canvas) -> bool {
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let cx = (w / 2.0).floor();
    let cy = (h / 2.0).floor();
    let strokes = stroke_widths(w);
    let (light, _) = strokes;
    let radius = cx.min(cy);

    // Which arms the corner has: (right, down).
    let (right, down) = match c {
        '\u{256D}' => (true, true),
        '\u{256E}' => (false, true),
        '\u{256F}' => (false, false),
        '\u{2570}' => (true, false),
        _ => return false,
    };
    let ox = if right { cx + radius } else { cx - radius };
    let oy = if down { cy + radius } else { cy - radius };

    if right {
        horizontal_arm(canvas, Weight::Light, ox, w, cy, strokes);
    } else {
        horizontal_arm(canvas, Weight::Light, 0.0, ox + 1.0, cy, strokes);
    }
    if down {
        vertical_arm(canvas, Weight::Light, oy, h, cx, strokes);
    } else {
        vertical_arm(canvas, Weight::Light, 0.0, oy + 1.0, cx, strokes);
    }

    // Walk the quarter circle between the two arm ends.
    let steps = (radius * 4.0).max(4.0) as u32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32 * std::f32::consts::FRAC_PI_2;
        let dx = radius * t.cos();
        let dy = radius * t.sin();
        let px = if right { ox - dx } else { ox + dx };
        let py = if down { oy - dy } else { oy + dy };
        canvas.fill_rect(px - (light / 2.0).floor(), py - (light / 2.0).floor(), light, light, OPAQUE);
    }
    true
}

/// Diagonals (U+2571..U+2573), one light-width run per scanline.
fn draw_diagonal(c: char, canvas: &mut Canvas) -> bool {
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let (light, _) = stroke_widths(w);
    let rising = matches!(c, '\u{2571}' | '\u{2573}');
    let falling = matches!(c, '\u{2572}' | '\u{2573}');

    for row in 0..canvas.height() {
        let frac = (row as f32 + 0.5) / h;
        if rising {
            canvas.fill_rect(w - w * frac - light / 2.0, row as f32, light, 1.0, OPAQUE);
        }
        if falling {
            canvas.fill_rect(w * frac - light / 2.0, row as f32, light, 1.0, OPAQUE);
        }
    }
    rising || falling
}
