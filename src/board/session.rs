//! Per-session move selection: capture in, click target out.

use image::RgbImage;
use std::time::Duration;

use super::cropper::{BoardCropper, BoardOffset};
use super::grid::{quantize, Cell, QuantizedGrid};
use super::palette::Palette;
use super::search::RegionSearch;
use super::{BoardError, CLICK_MARGIN, TILE_SIZE};

/// Absolute screen position in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

/// One move: where to click and how long to wait afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub cell: Cell,
    pub target: ScreenPoint,
    pub delay: Duration,
    pub power_tile: bool,
}

/// State of one play session.
///
/// Holds the cached board offset, the side to search next, and whether a
/// diamond is due. Only one decision may be in flight at a time.
pub struct Session {
    cropper: BoardCropper,
    search: RegionSearch,
    palette: Palette,
}

impl Session {
    /// Creates a session anchored on `reference`.
    pub fn new(reference: RgbImage) -> Self {
        Self {
            cropper: BoardCropper::new(reference),
            search: RegionSearch::new(),
            palette: Palette::default(),
        }
    }

    /// Cached board offset, once the board has been found.
    pub fn board_offset(&self) -> Option<BoardOffset> {
        self.cropper.offset()
    }

    /// Returns the session to its initial state.
    pub fn reset(&mut self) {
        self.cropper.reset();
        self.search.reset();
    }

    /// Reads the board from a full-screen capture without choosing a move.
    pub fn read_board(
        &mut self,
        screen: &RgbImage,
    ) -> Result<(QuantizedGrid, BoardOffset), BoardError> {
        let (board, offset) = self.cropper.crop(screen)?;
        Ok((quantize(&board, &self.palette), offset))
    }

    /// Chooses the next move from a full-screen capture.
    pub fn decide(
        &mut self,
        screen: &RgbImage,
        move_delay: Duration,
    ) -> Result<Decision, BoardError> {
        let (grid, offset) = self.read_board(screen)?;
        crate::log(&format!("Board:\n{}", grid));
        self.select_move(&grid, offset, move_delay)
    }

    /// Chooses the next move from an already quantized grid.
    ///
    /// After a diamond the board takes longer to clear, so the returned delay
    /// is doubled.
    pub fn select_move(
        &mut self,
        grid: &QuantizedGrid,
        offset: BoardOffset,
        move_delay: Duration,
    ) -> Result<Decision, BoardError> {
        let result = self.search.best_move(grid)?;
        crate::log(&format!(
            "Chose {} x{} at ({}, {})",
            self.palette.name(result.category),
            result.region_size,
            result.cell.row,
            result.cell.col
        ));

        let delay = if result.power_tile {
            move_delay * 2
        } else {
            move_delay
        };

        Ok(Decision {
            cell: result.cell,
            target: cell_to_screen(result.cell, offset),
            delay,
            power_tile: result.power_tile,
        })
    }
}

/// Screen position a few pixels inside the tile at `cell`.
pub fn cell_to_screen(cell: Cell, offset: BoardOffset) -> ScreenPoint {
    ScreenPoint {
        x: (offset.col + CLICK_MARGIN) as i32 + (cell.col as u32 * TILE_SIZE) as i32,
        y: (offset.row + CLICK_MARGIN) as i32 + (cell.row as u32 * TILE_SIZE) as i32,
    }
}
