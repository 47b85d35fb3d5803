/// Braille Unicode canvas used as the 2D raster surface.
/// Each character cell holds a 2x4 dot grid, so a `w × h` cell canvas has a
/// `2w × 4h` pixel resolution. Patterns live at U+2800..U+28FF.
#[derive(Clone)]
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    /// Width in braille dots
    pub fn pixel_width(&self) -> usize {
        self.width * 2
    }

    /// Height in braille dots
    pub fn pixel_height(&self) -> usize {
        self.height * 4
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Dot bit for a pixel inside its cell:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    #[inline(always)]
    fn bit(x: usize, y: usize) -> u8 {
        match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            _ => 0x80,
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= Self::bit(x, y);
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let (cx, cy) = (x / 2, y / 4);
        cx < self.width
            && cy < self.height
            && self.cells[cy * self.width + cx] & Self::bit(x, y) != 0
    }

    /// Number of lit dots
    pub fn count(&self) -> usize {
        self.cells.iter().map(|c| c.count_ones() as usize).sum()
    }

    /// Convert the canvas to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.rows().collect::<Vec<_>>().join("\n")
    }

    /// Get a specific row as a string (for line-by-line rendering)
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(|i| self.row_to_string(i))
    }
}
