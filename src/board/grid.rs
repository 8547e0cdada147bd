//! Downsampling the cropped board into a grid of tile categories.

use image::RgbImage;
use std::fmt;

use super::palette::Palette;
use super::TILE_SIZE;

/// A grid position (tile row and column).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Board reduced to one palette index per tile, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantizedGrid {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl QuantizedGrid {
    /// Builds a grid from nested rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|r| r.len() == cols),
            "grid rows must have equal length"
        );
        Self {
            rows: rows.len(),
            cols,
            cells: rows.concat(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Category at (row, col).
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.cols + col]
    }

    /// Row-major cell values.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// First cell holding `category`, in row-major order.
    pub fn find(&self, category: u8) -> Option<Cell> {
        self.cells
            .iter()
            .position(|&c| c == category)
            .map(|i| Cell::new(i / self.cols, i % self.cols))
    }
}

impl fmt::Display for QuantizedGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.cols.max(1)).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row.iter().map(u8::to_string).collect();
            write!(f, "[{}]", line.join(" "))?;
        }
        Ok(())
    }
}

/// Reduces the board image to a grid of palette indices.
///
/// Each tile is represented by a single pixel a quarter of a tile in from
/// its top-left corner, where the tile artwork is a solid color. Partial
/// tiles at the right or bottom edge sample the last pixel instead of
/// reading past the image.
pub fn quantize(board: &RgbImage, palette: &Palette) -> QuantizedGrid {
    let (width, height) = board.dimensions();
    let rows = height.div_ceil(TILE_SIZE) as usize;
    let cols = width.div_ceil(TILE_SIZE) as usize;

    let mut cells = Vec::with_capacity(rows * cols);
    for i in 0..rows as u32 {
        let y = (i * TILE_SIZE + TILE_SIZE / 4).min(height - 1);
        for j in 0..cols as u32 {
            let x = (j * TILE_SIZE + TILE_SIZE / 4).min(width - 1);
            cells.push(palette.classify(*board.get_pixel(x, y)));
        }
    }

    QuantizedGrid { rows, cols, cells }
}
