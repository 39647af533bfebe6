//! DECDLD soft fonts mapped onto U+EF20..U+EF7F.

use super::canvas::{Canvas, OPAQUE};
use crate::settings::SoftFont;

pub const SOFT_FONT_FIRST: char = '\u{EF20}';
pub const SOFT_FONT_LAST: char = '\u{EF7F}';

pub fn is_soft_font_char(c: char) -> bool {
    (SOFT_FONT_FIRST..=SOFT_FONT_LAST).contains(&c)
}

/// Draw soft-font character `c`, scaling its pattern nearest-neighbor to
/// the canvas.
///
/// Returns `false` if `c` is outside the soft-font range or the pattern
/// holds too few rows for it.
pub fn draw_soft_font_glyph(font: &SoftFont, c: char, canvas: &mut Canvas) -> bool {
    if !is_soft_font_char(c) || font.cell_width == 0 || font.cell_height == 0 {
        return false;
    }
    let index = (c as u32 - SOFT_FONT_FIRST as u32) as usize;
    let height = font.cell_height as usize;
    let Some(rows) = font.rows.get(index * height..(index + 1) * height) else {
        return false;
    };

    let src_w = font.cell_width.min(16);
    let (dst_w, dst_h) = (canvas.width(), canvas.height());
    for y in 0..dst_h {
        let bits = rows[(y as usize * height) / dst_h as usize];
        for x in 0..dst_w {
            let sx = x * src_w / dst_w;
            if bits & (0x8000 >> sx) != 0 {
                canvas.put(x, y, OPAQUE);
            }
        }
    }
    true
}
