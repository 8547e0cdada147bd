//! Largest-region search with left/right turn alternation.
//!
//! Tiles above a cleared group keep falling for a moment, so consecutive
//! moves are taken from opposite halves of the board.

use super::grid::{Cell, QuantizedGrid};
use super::{BoardError, MIN_REGION_SIZE, POWER_TILE};

/// Number of passes over one snapshot before giving up. The second pass
/// searches the opposite half.
const SEARCH_ATTEMPTS: usize = 2;

/// Move chosen by the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// Cell to click.
    pub cell: Cell,
    /// Number of tiles in the region containing `cell`.
    pub region_size: usize,
    /// Palette index of the region.
    pub category: u8,
    /// True when a diamond was chosen; the board takes longer to settle.
    pub power_tile: bool,
}

/// Search state carried between moves.
#[derive(Clone, Debug)]
pub struct RegionSearch {
    /// true = right half is searched next
    current_side: bool,
    /// A diamond was seen on the previous move and is due now
    diamond_present: bool,
}

impl Default for RegionSearch {
    fn default() -> Self {
        Self {
            current_side: true,
            diamond_present: false,
        }
    }
}

impl RegionSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the right half is searched on the next call.
    pub fn current_side(&self) -> bool {
        self.current_side
    }

    /// Returns true if a diamond is due on the next call.
    pub fn diamond_present(&self) -> bool {
        self.diamond_present
    }

    /// Restores the start-of-session state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Picks the best cell to click on `grid`.
    ///
    /// The searched half flips on every call, whatever the outcome.
    pub fn best_move(&mut self, grid: &QuantizedGrid) -> Result<SearchResult, BoardError> {
        let result = self.choose(grid);
        self.current_side = !self.current_side;
        result
    }

    fn choose(&mut self, grid: &QuantizedGrid) -> Result<SearchResult, BoardError> {
        if let Some(cell) = grid.find(POWER_TILE) {
            // Taken on the second consecutive call that sees a diamond
            if self.diamond_present {
                self.diamond_present = false;
                crate::log(&format!("Diamond at ({}, {})", cell.row, cell.col));
                return Ok(SearchResult {
                    cell,
                    region_size: flood_count(grid, cell),
                    category: POWER_TILE,
                    power_tile: true,
                });
            }
            self.diamond_present = true;
        }

        let mut best = 0;
        for attempt in 0..SEARCH_ATTEMPTS {
            let right_half = self.current_side ^ (attempt % 2 == 1);
            let Some((cell, size)) = largest_region(grid, right_half) else {
                continue;
            };

            crate::log(&format!(
                "Best score: {} ({}, {}) on {} half",
                size,
                cell.row,
                cell.col,
                if right_half { "right" } else { "left" }
            ));

            if size >= MIN_REGION_SIZE {
                return Ok(SearchResult {
                    cell,
                    region_size: size,
                    category: grid.get(cell.row, cell.col),
                    power_tile: false,
                });
            }
            best = best.max(size);
        }

        Err(BoardError::Unsettled { best })
    }
}

/// Finds the largest region whose seed lies in one half of the columns.
///
/// Regions may extend into the other half. Equal sizes keep the first seed in
/// row-major order. Returns `None` if the half has no cells.
fn largest_region(grid: &QuantizedGrid, right_half: bool) -> Option<(Cell, usize)> {
    let mid = grid.cols() / 2;
    let columns = if right_half { mid..grid.cols() } else { 0..mid };

    let mut scratch: Vec<Option<u8>> = grid.cells().iter().copied().map(Some).collect();
    let mut best: Option<(Cell, usize)> = None;

    for row in 0..grid.rows() {
        for col in columns.clone() {
            let Some(target) = scratch[row * grid.cols() + col] else {
                continue;
            };
            let size = fill(&mut scratch, grid.rows(), grid.cols(), Cell::new(row, col), target);
            if best.is_none_or(|(_, best_size)| size > best_size) {
                best = Some((Cell::new(row, col), size));
            }
        }
    }

    best
}

/// Size of the 4-connected region of equal categories containing `seed`.
pub fn flood_count(grid: &QuantizedGrid, seed: Cell) -> usize {
    let mut scratch: Vec<Option<u8>> = grid.cells().iter().copied().map(Some).collect();
    let target = grid.get(seed.row, seed.col);
    fill(&mut scratch, grid.rows(), grid.cols(), seed, target)
}

/// Consumes the region of `target` cells reachable from `seed` and returns
/// its size. Consumed cells are set to `None`.
fn fill(scratch: &mut [Option<u8>], rows: usize, cols: usize, seed: Cell, target: u8) -> usize {
    let mut stack = vec![seed];
    let mut count = 0;

    while let Some(Cell { row, col }) = stack.pop() {
        let index = row * cols + col;
        if scratch[index] != Some(target) {
            continue;
        }
        scratch[index] = None;
        count += 1;

        if row + 1 < rows {
            stack.push(Cell::new(row + 1, col));
        }
        if col + 1 < cols {
            stack.push(Cell::new(row, col + 1));
        }
        if row > 0 {
            stack.push(Cell::new(row - 1, col));
        }
        if col > 0 {
            stack.push(Cell::new(row, col - 1));
        }
    }

    count
}
