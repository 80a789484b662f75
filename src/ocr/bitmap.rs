//! Boolean pixel grids.
//!
//! The same type serves as the full-image mask produced by the color filter,
//! as a cropped component, and as a padded classifier input.

use image::{GrayImage, Luma};

/// A row-major grid of on/off cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bitmap {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Bitmap {
    /// Creates an all-off bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Builds a bitmap from text rows where `#` marks an on cell.
    ///
    /// Rows shorter than the longest one are padded with off cells.
    pub fn from_pattern(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut bitmap = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    bitmap.set(x as u32, y as u32, true);
                }
            }
        }
        bitmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell at (x, y); out-of-bounds reads are off.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[self.index(x, y)]
    }

    /// Sets the cell at (x, y). Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = value;
        }
    }

    /// Number of on cells.
    pub fn count_on(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Flattens the grid row-major into 0.0/1.0 classifier features.
    pub fn to_features(&self) -> Vec<f32> {
        self.cells
            .iter()
            .map(|&c| if c { 1.0 } else { 0.0 })
            .collect()
    }

    /// Renders the grid as a grayscale image: on cells white, off cells black.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255u8 } else { 0u8 }])
        })
    }

    /// Renders the grid back to `#`/`.` rows. Handy in test failure output.
    pub fn to_pattern(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.get(x, y) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
