//! Gridlines, underlines and strikethrough.
//!
//! Decorations are closed-form rectangles, recomputed every frame from the
//! per-row ranges; nothing here touches the atlas.

use bitflags::bitflags;

use crate::glyph::LineRendition;
use crate::row::ShapedRow;
use crate::settings::{DecorationMetric, FontSettings};

bitflags! {
    /// Lines drawn over a range of cells.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct GridLines: u16 {
        const LEFT = 1 << 0;
        const TOP = 1 << 1;
        const RIGHT = 1 << 2;
        const BOTTOM = 1 << 3;
        const UNDERLINE = 1 << 4;
        const DOUBLE_UNDERLINE = 1 << 5;
        const CURLY_UNDERLINE = 1 << 6;
        const DOTTED_UNDERLINE = 1 << 7;
        const DASHED_UNDERLINE = 1 << 8;
        const HYPERLINK_UNDERLINE = 1 << 9;
        const STRIKETHROUGH = 1 << 10;
    }
}

/// `lines` drawn over columns `[from, to)` of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLineRange {
    pub lines: GridLines,
    pub from: u16,
    pub to: u16,
    pub gridline_color: u32,
    pub underline_color: u32,
}

/// Pattern the composite pass fills a decoration quad with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShading {
    Solid,
    Dotted,
    Dashed,
    Curly,
}

/// A decoration rectangle in target pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorationQuad {
    pub shading: LineShading,
    pub position: (i32, i32),
    pub size: (u32, u32),
    pub color: u32,
    /// Rendition multipliers, so patterned lines stretch with the text.
    pub rendition_scale: (u8, u8),
}

/// Line positions derived from the font, recomputed on font change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecorationMetrics {
    pub cell_width: u32,
    pub cell_height: u32,
    pub grid_left: DecorationMetric,
    pub grid_top: DecorationMetric,
    pub grid_right: DecorationMetric,
    pub grid_bottom: DecorationMetric,
    pub underline: DecorationMetric,
    pub strikethrough: DecorationMetric,
    pub double_underline: [DecorationMetric; 2],
    pub curly_underline: DecorationMetric,
}

impl DecorationMetrics {
    pub fn from_font(font: &FontSettings) -> Self {
        let thin = font.thin_line_width.max(1);
        let cell_w = font.cell_width;
        let cell_h = font.cell_height;

        // The curly line spans both double-underline strokes, at least 3px,
        // and is pulled up so it stays inside the cell.
        let [du_top, du_bottom] = font.double_underline;
        let curly_height = (du_bottom.position + du_bottom.height as i32 - du_top.position).max(3);
        let curly_position = du_top.position.min(cell_h as i32 - curly_height);

        Self {
            cell_width: cell_w,
            cell_height: cell_h,
            grid_left: DecorationMetric::new(0, thin),
            grid_top: DecorationMetric::new(0, thin),
            grid_right: DecorationMetric::new(cell_w as i32 - thin as i32, thin),
            grid_bottom: DecorationMetric::new(cell_h as i32 - thin as i32, thin),
            underline: font.underline,
            strikethrough: font.strikethrough,
            double_underline: font.double_underline,
            curly_underline: DecorationMetric::new(curly_position, curly_height as u32),
        }
    }
}

/// Append the decoration quads of row `y` to `out`.
pub fn row_decorations(
    out: &mut Vec<DecorationQuad>,
    metrics: &DecorationMetrics,
    row: &ShapedRow,
    y: u16,
) {
    let cell_w = metrics.cell_width as i32;
    let cell_h = metrics.cell_height as i32;
    let rendition = row.line_rendition;
    let (scale_x, scale_y) = rendition.scale();
    let h_shift = scale_x - 1;
    let v_shift = scale_y - 1;

    let row_top = i32::from(y) * cell_h;
    let row_bottom = row_top + cell_h;
    // The bottom half of a double-height pair draws the lower half of a
    // text cell that starts one row up.
    let text_cell_top = if rendition == LineRendition::DoubleHeightBottom {
        row_top - cell_h
    } else {
        row_top
    };
    let rendition_scale = (scale_x as u8, scale_y as u8);

    let vertical = |out: &mut Vec<DecorationQuad>, range: &GridLineRange, pos: DecorationMetric| {
        let step = cell_w << h_shift;
        let width = pos.height << h_shift;
        let end = i32::from(range.to) * cell_w;
        let mut x = i32::from(range.from) * cell_w + (pos.position << h_shift);
        while x < end && step > 0 {
            out.push(DecorationQuad {
                shading: LineShading::Solid,
                position: (x, row_top),
                size: (width, cell_h as u32),
                color: range.gridline_color,
                rendition_scale,
            });
            x += step;
        }
    };

    let horizontal = |out: &mut Vec<DecorationQuad>,
                      range: &GridLineRange,
                      pos: DecorationMetric,
                      shading: LineShading,
                      color: u32| {
        let left = i32::from(range.from) * cell_w;
        let width = i32::from(range.to.saturating_sub(range.from)) * cell_w;
        let top = (text_cell_top + (pos.position << v_shift)).max(row_top);
        let bottom =
            (text_cell_top + (pos.position << v_shift) + (pos.height << v_shift) as i32).min(row_bottom);
        if top < bottom && width > 0 {
            out.push(DecorationQuad {
                shading,
                position: (left, top),
                size: (width as u32, (bottom - top) as u32),
                color,
                rendition_scale,
            });
        }
    };

    for range in &row.grid_line_ranges {
        let lines = range.lines;
        if lines.contains(GridLines::LEFT) {
            vertical(out, range, metrics.grid_left);
        }
        if lines.contains(GridLines::RIGHT) {
            vertical(out, range, metrics.grid_right);
        }
        if lines.contains(GridLines::TOP) {
            horizontal(out, range, metrics.grid_top, LineShading::Solid, range.gridline_color);
        }
        if lines.contains(GridLines::BOTTOM) {
            horizontal(out, range, metrics.grid_bottom, LineShading::Solid, range.gridline_color);
        }
        // At most one underline style per range, first match wins.
        match lines {
            l if l.contains(GridLines::UNDERLINE) => {
                horizontal(out, range, metrics.underline, LineShading::Solid, range.underline_color);
            }
            l if l.intersects(GridLines::DOTTED_UNDERLINE | GridLines::HYPERLINK_UNDERLINE) => {
                horizontal(out, range, metrics.underline, LineShading::Dotted, range.underline_color);
            }
            l if l.contains(GridLines::DASHED_UNDERLINE) => {
                horizontal(out, range, metrics.underline, LineShading::Dashed, range.underline_color);
            }
            l if l.contains(GridLines::CURLY_UNDERLINE) => {
                horizontal(out, range, metrics.curly_underline, LineShading::Curly, range.underline_color);
            }
            l if l.contains(GridLines::DOUBLE_UNDERLINE) => {
                for pos in metrics.double_underline {
                    horizontal(out, range, pos, LineShading::Solid, range.underline_color);
                }
            }
            _ => {}
        }
        if lines.contains(GridLines::STRIKETHROUGH) {
            horizontal(out, range, metrics.strikethrough, LineShading::Solid, range.gridline_color);
        }
    }
}
