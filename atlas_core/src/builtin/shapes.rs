//! Block elements, braille and Powerline separators.

use super::canvas::{Canvas, OPAQUE};

/// Quadrant coverage for U+2596..U+259F: bit 3 top-left, bit 2 top-right,
/// bit 1 bottom-left, bit 0 bottom-right.
const QUADRANTS: [u8; 10] = [
    0b0010, 0b0001, 0b1000, 0b1011, 0b1001, 0b1110, 0b1101, 0b0100, 0b0110, 0b0111,
];

/// Braille dots as `(column, row, bit)`.
#[rustfmt::skip]
const BRAILLE_DOTS: [(u32, u32, u32); 8] = [
    (0, 0, 0), (0, 1, 1), (0, 2, 2),
    (1, 0, 3), (1, 1, 4), (1, 2, 5),
    (0, 3, 6), (1, 3, 7),
];

fn shade_alpha(quarters: u32) -> u8 {
    (f32::from(OPAQUE) * quarters as f32 / 4.0).round() as u8
}

pub(super) fn draw_block_element(c: char, canvas: &mut Canvas) -> bool {
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let cp = c as u32;
    match c {
        '\u{2580}' => canvas.fill_rect(0.0, 0.0, w, (h / 2.0).round(), OPAQUE),
        '\u{2581}'..='\u{2587}' => {
            let bh = (h * (cp - 0x2580) as f32 / 8.0).round();
            canvas.fill_rect(0.0, h - bh, w, bh, OPAQUE);
        }
        '\u{2588}' => canvas.fill_rect(0.0, 0.0, w, h, OPAQUE),
        // Left 7/8 down to 1/8.
        '\u{2589}'..='\u{258F}' => {
            canvas.fill_rect(0.0, 0.0, (w * (0x2590 - cp) as f32 / 8.0).round(), h, OPAQUE);
        }
        '\u{2590}' => {
            let hw = (w / 2.0).round();
            canvas.fill_rect(w - hw, 0.0, hw, h, OPAQUE);
        }
        '\u{2591}'..='\u{2593}' => canvas.fill_rect(0.0, 0.0, w, h, shade_alpha(cp - 0x2590)),
        '\u{2594}' => canvas.fill_rect(0.0, 0.0, w, (h / 8.0).round(), OPAQUE),
        '\u{2595}' => {
            let bw = (w / 8.0).round();
            canvas.fill_rect(w - bw, 0.0, bw, h, OPAQUE);
        }
        '\u{2596}'..='\u{259F}' => {
            let mask = QUADRANTS[(cp - 0x2596) as usize];
            let hw = (w / 2.0).round();
            let hh = (h / 2.0).round();
            if mask & 0b1000 != 0 {
                canvas.fill_rect(0.0, 0.0, hw, hh, OPAQUE);
            }
            if mask & 0b0100 != 0 {
                canvas.fill_rect(hw, 0.0, w - hw, hh, OPAQUE);
            }
            if mask & 0b0010 != 0 {
                canvas.fill_rect(0.0, hh, hw, h - hh, OPAQUE);
            }
            if mask & 0b0001 != 0 {
                canvas.fill_rect(hw, hh, w - hw, h - hh, OPAQUE);
            }
        }
        _ => return false,
    }
    true
}

/// U+2800 has no dots and leaves the canvas blank.
pub(super) fn draw_braille(c: char, canvas: &mut Canvas) -> bool {
    let Some(bits) = (c as u32).checked_sub(0x2800).filter(|b| *b <= 0xff) else {
        return false;
    };
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let dot_w = (w / 5.0).round().max(2.0);
    let dot_h = (h / 10.0).round().max(2.0);

    for (col, row, bit) in BRAILLE_DOTS {
        if bits & (1 << bit) != 0 {
            let dx = w * (0.25 + col as f32 * 0.5) - dot_w / 2.0;
            let dy = h * ((row as f32 + 0.5) / 4.0) - dot_h / 2.0;
            canvas.fill_rect(dx, dy, dot_w, dot_h, OPAQUE);
        }
    }
    true
}

/// Solid and outlined triangle separators. The rounded variants
/// (U+E0B4, U+E0B6) share the solid shapes.
pub(super) fn draw_powerline(c: char, canvas: &mut Canvas) -> bool {
    let (pointing_right, solid) = match c {
        '\u{E0B0}' | '\u{E0B4}' => (true, true),
        '\u{E0B1}' => (true, false),
        '\u{E0B2}' | '\u{E0B6}' => (false, true),
        '\u{E0B3}' => (false, false),
        _ => return false,
    };

    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let mid = h / 2.0;
    let thin = (w / 8.0).round().max(1.0);

    for row in 0..canvas.height() {
        let frac = ((row as f32 + 0.5) - mid).abs() / mid;
        let reach = (w * (1.0 - frac)).round();
        if reach <= 0.0 {
            continue;
        }
        let y = row as f32;
        match (pointing_right, solid) {
            (true, true) => canvas.fill_rect(0.0, y, reach, 1.0, OPAQUE),
            (true, false) => canvas.fill_rect(reach - thin, y, thin, 1.0, OPAQUE),
            (false, true) => canvas.fill_rect(w - reach, y, reach, 1.0, OPAQUE),
            (false, false) => canvas.fill_rect(w - reach, y, thin, 1.0, OPAQUE),
        }
    }
    true
}
