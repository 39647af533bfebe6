//! The per-frame cell table handed to the composite pass.

/// One viewport cell as the composite shader reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Packed `0xAABBGGRR`.
    pub background: u32,
    pub foreground: u32,
    /// Atlas position of the glyph, or [`Cell::NO_GLYPH`].
    pub glyph_x: u32,
    pub glyph_y: u32,
    /// Where the glyph box sits relative to the cell's top-left pixel.
    pub glyph_box: GlyphBox,
}

/// A glyph box placed in cell space. The origin may be negative or past the
/// cell edge for glyphs that overhang.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphBox {
    pub origin: (i16, i16),
    pub size: (u16, u16),
}

impl GlyphBox {
    /// Box of `size` at pixel `origin`, saturated into the packed range.
    pub fn new(origin: (i32, i32), size: (u32, u32)) -> Self {
        let sat_i = |v: i32| v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        let sat_u = |v: u32| v.min(u32::from(u16::MAX)) as u16;
        Self {
            origin: (sat_i(origin.0), sat_i(origin.1)),
            size: (sat_u(size.0), sat_u(size.1)),
        }
    }

    /// `x` in the low half, `y` in the high half.
    fn packed_origin(self) -> u32 {
        u32::from(self.origin.0 as u16) | (u32::from(self.origin.1 as u16) << 16)
    }

    fn packed_size(self) -> u32 {
        u32::from(self.size.0) | (u32::from(self.size.1) << 16)
    }
}

impl Cell {
    pub const NO_GLYPH: u32 = u32::MAX;
    /// `glyph_y` marker for cells already composited by a mid-frame flush;
    /// the composite pass leaves their pixels alone.
    pub const RETIRED: u32 = u32::MAX - 1;
    /// Bytes per cell in the GPU buffer.
    pub const SIZE: usize = 24;

    pub fn new(background: u32, foreground: u32) -> Self {
        Self {
            background,
            foreground,
            glyph_x: Self::NO_GLYPH,
            glyph_y: Self::NO_GLYPH,
            glyph_box: GlyphBox::default(),
        }
    }

    pub fn has_glyph(&self) -> bool {
        self.glyph_x != Self::NO_GLYPH
    }

    pub fn is_retired(&self) -> bool {
        self.glyph_y == Self::RETIRED
    }
}

/// Fixed `cols x rows` cell table, rebuilt every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl CellGrid {
    /// Grid with every cell blank.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self::from_colors(cols, rows, &[], &[])
    }

    /// Grid from row-major color bitmaps. Missing entries are transparent
    /// black on opaque black.
    pub fn from_colors(cols: u16, rows: u16, background: &[u32], foreground: &[u32]) -> Self {
        let len = usize::from(cols) * usize::from(rows);
        let cells = (0..len)
            .map(|i| {
                Cell::new(
                    background.get(i).copied().unwrap_or(0xff00_0000),
                    foreground.get(i).copied().unwrap_or(0xffff_ffff),
                )
            })
            .collect();
        Self { cols, rows, cells }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn index(&self, col: u16, row: u16) -> Option<usize> {
        (col < self.cols && row < self.rows)
            .then(|| usize::from(row) * usize::from(self.cols) + usize::from(col))
    }

    pub fn get(&self, col: u16, row: u16) -> Option<&Cell> {
        self.index(col, row).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, col: u16, row: u16) -> Option<&mut Cell> {
        self.index(col, row).map(|i| &mut self.cells[i])
    }

    /// Point a cell at the atlas texels at `texcoord`, drawn at `glyph_box`.
    /// Returns `false` outside the grid.
    pub fn set_glyph(&mut self, col: u16, row: u16, texcoord: (u32, u32), glyph_box: GlyphBox) -> bool {
        match self.get_mut(col, row) {
            Some(cell) => {
                cell.glyph_x = texcoord.0;
                cell.glyph_y = texcoord.1;
                cell.glyph_box = glyph_box;
                true
            }
            None => false,
        }
    }

    /// Mark every cell with a glyph as already composited.
    ///
    /// Called after a flush that precedes an atlas reset: those cells point
    /// at texels that are about to be overwritten.
    pub fn retire_glyphs(&mut self) -> usize {
        let mut retired = 0;
        for cell in &mut self.cells {
            if cell.has_glyph() {
                cell.glyph_x = Cell::NO_GLYPH;
                cell.glyph_y = Cell::RETIRED;
                cell.glyph_box = GlyphBox::default();
                retired += 1;
            }
        }
        retired
    }

    /// Little-endian GPU layout: six `u32`s per cell, the glyph box packed
    /// as two `i16` origin halves and two `u16` size halves.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.cells.len() * Cell::SIZE);
        for cell in &self.cells {
            bytes.extend_from_slice(&cell.background.to_le_bytes());
            bytes.extend_from_slice(&cell.foreground.to_le_bytes());
            bytes.extend_from_slice(&cell.glyph_x.to_le_bytes());
            bytes.extend_from_slice(&cell.glyph_y.to_le_bytes());
            bytes.extend_from_slice(&cell.glyph_box.packed_origin().to_le_bytes());
            bytes.extend_from_slice(&cell.glyph_box.packed_size().to_le_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests;
