//! Board recognition and move selection for Diamond Dash.
//!
//! This module provides:
//! - Anchor search inside a screen capture (`locator`)
//! - Board cropping with a cached offset (`cropper`)
//! - Tile color classification (`palette`)
//! - Downsampling the board into a category grid (`grid`)
//! - Largest-region search with turn alternation (`search`)
//! - The per-session move selector (`session`)
//!
//! Geometry and colors are fixed by the game's rendering (a 400x360 px
//! Flash board made of 40 px tiles) and are not configurable.

pub mod cropper;
pub mod grid;
pub mod locator;
pub mod palette;
pub mod search;
pub mod session;

pub use session::{Decision, Session};

use thiserror::Error;

/// Board width in pixels.
pub const BOARD_WIDTH: u32 = 400;

/// Board height in pixels.
pub const BOARD_HEIGHT: u32 = 360;

/// Edge length of one tile in pixels.
pub const TILE_SIZE: u32 = 40;

/// Offset from a tile's top-left corner to the point that gets clicked.
pub const CLICK_MARGIN: u32 = 20;

/// Palette index of the diamond (power tile).
pub const POWER_TILE: u8 = 0;

/// Regions smaller than this mean the board is still animating.
pub const MIN_REGION_SIZE: usize = 3;

/// Errors produced while reading the board or choosing a move.
#[derive(Debug, Error, PartialEq)]
pub enum BoardError {
    /// The anchor image is not on screen; the game is not showing a board.
    #[error("board anchor not found on screen")]
    PatternNotFound,

    /// No region reached the minimum size on any attempt.
    #[error("board not settled (largest region: {best} cells)")]
    Unsettled { best: usize },

    /// The board rectangle does not fit inside the capture.
    #[error(
        "screen {screen_width}x{screen_height} too small for board at ({col}, {row})"
    )]
    ScreenTooSmall {
        screen_width: u32,
        screen_height: u32,
        row: u32,
        col: u32,
    },
}

impl BoardError {
    /// Returns true if the caller should recapture and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BoardError::PatternNotFound | BoardError::Unsettled { .. })
    }
}
