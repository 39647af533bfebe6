use super::{Cell, CellGrid, GlyphBox};

const CELL_BOX: GlyphBox = GlyphBox {
    origin: (0, 0),
    size: (10, 20),
};

#[test]
fn new_grid_has_no_glyphs() {
    let grid = CellGrid::new(4, 3);
    assert_eq!(grid.cells().len(), 12);
    assert!(grid.cells().iter().all(|c| !c.has_glyph() && !c.is_retired()));
}

#[test]
fn colors_are_row_major() {
    let bg: Vec<u32> = (0..6).collect();
    let fg: Vec<u32> = (100..106).collect();
    let grid = CellGrid::from_colors(3, 2, &bg, &fg);
    let cell = grid.get(1, 1).expect("in bounds");
    assert_eq!(cell.background, 4);
    assert_eq!(cell.foreground, 104);
}

#[test]
fn short_bitmaps_fall_back_to_defaults() {
    let grid = CellGrid::from_colors(2, 1, &[7], &[]);
    assert_eq!(grid.get(0, 0).map(|c| c.background), Some(7));
    assert_eq!(grid.get(1, 0).map(|c| c.background), Some(0xff00_0000));
    assert_eq!(grid.get(1, 0).map(|c| c.foreground), Some(0xffff_ffff));
}

#[test]
fn set_glyph_bounds_checked() {
    let mut grid = CellGrid::new(2, 2);
    assert!(grid.set_glyph(1, 1, (32, 64), CELL_BOX));
    assert!(!grid.set_glyph(2, 0, (0, 0), CELL_BOX));
    assert!(!grid.set_glyph(0, 2, (0, 0), CELL_BOX));
    let cell = grid.get(1, 1).expect("in bounds");
    assert_eq!((cell.glyph_x, cell.glyph_y), (32, 64));
    assert_eq!(cell.glyph_box, CELL_BOX);
}

#[test]
fn retire_only_touches_glyph_cells() {
    let mut grid = CellGrid::new(3, 1);
    grid.set_glyph(0, 0, (1, 1), CELL_BOX);
    grid.set_glyph(2, 0, (5, 5), CELL_BOX);
    assert_eq!(grid.retire_glyphs(), 2);
    assert!(grid.get(0, 0).is_some_and(Cell::is_retired));
    assert!(grid.get(1, 0).is_some_and(|c| !c.is_retired()));
    assert!(grid.get(2, 0).is_some_and(|c| !c.has_glyph()));
    assert!(grid.get(2, 0).is_some_and(|c| c.glyph_box == GlyphBox::default()));
}

#[test]
fn byte_layout_is_little_endian() {
    let mut grid = CellGrid::from_colors(1, 1, &[0x0102_0304], &[0x0a0b_0c0d]);
    grid.set_glyph(0, 0, (16, 32), GlyphBox::new((-2, 4), (6, 10)));
    let bytes = grid.to_bytes();
    assert_eq!(bytes.len(), Cell::SIZE);
    assert_eq!(&bytes[0..4], &[4, 3, 2, 1]);
    assert_eq!(&bytes[4..8], &[0x0d, 0x0c, 0x0b, 0x0a]);
    assert_eq!(&bytes[8..12], &16u32.to_le_bytes());
    assert_eq!(&bytes[12..16], &32u32.to_le_bytes());
    // Origin halves are two's complement i16.
    assert_eq!(&bytes[16..20], &[0xfe, 0xff, 4, 0]);
    assert_eq!(&bytes[20..24], &[6, 0, 10, 0]);
}

#[test]
fn glyph_box_saturates() {
    let b = GlyphBox::new((-100_000, 70_000), (u32::MAX, 3));
    assert_eq!(b.origin, (i16::MIN, i16::MAX));
    assert_eq!(b.size, (u16::MAX, 3));
}
