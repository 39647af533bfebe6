//! Alpha-only drawing surface for procedurally built glyphs.

/// Full coverage.
pub const OPAQUE: u8 = 0xff;

/// A `width x height` coverage bitmap, one byte per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Coverage at `(x, y)`; zero outside the canvas.
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize]
        } else {
            0
        }
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }

    /// Fill a rectangle given in fractional pixels. Edges snap to the
    /// nearest pixel boundary and are clipped to the canvas; overlapping
    /// fills keep the stronger coverage.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, alpha: u8) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let x0 = x.round().max(0.0) as u32;
        let y0 = y.round().max(0.0) as u32;
        let x1 = ((x + w).round().max(0.0) as u32).min(self.width);
        let y1 = ((y + h).round().max(0.0) as u32).min(self.height);
        for py in y0..y1 {
            let row = (py * self.width) as usize;
            for px in x0..x1 {
                let p = &mut self.pixels[row + px as usize];
                *p = (*p).max(alpha);
            }
        }
    }

    /// Set one pixel, ignoring out-of-bounds writes.
    pub fn put(&mut self, x: u32, y: u32, alpha: u8) {
        if x < self.width && y < self.height {
            let p = &mut self.pixels[(y * self.width + x) as usize];
            *p = (*p).max(alpha);
        }
    }
}
