//! Locates the board on screen once and crops it from every later capture.

use image::RgbImage;

use super::locator::find_subimage;
use super::{BoardError, BOARD_HEIGHT, BOARD_WIDTH};

/// Top-left pixel of the playable board in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardOffset {
    pub row: u32,
    pub col: u32,
}

/// Crops the board out of full-screen captures.
///
/// The first successful crop searches for the anchor image and caches the
/// board offset; the board never moves during a session, so later crops
/// reuse it without searching.
pub struct BoardCropper {
    reference: RgbImage,
    offset: Option<BoardOffset>,
}

impl BoardCropper {
    /// Creates a cropper that anchors on `reference`.
    ///
    /// The reference image must be the region immediately above and to the
    /// left of the board's top-left corner.
    pub fn new(reference: RgbImage) -> Self {
        Self {
            reference,
            offset: None,
        }
    }

    /// Returns the cached board offset, if the board has been found.
    pub fn offset(&self) -> Option<BoardOffset> {
        self.offset
    }

    /// Forgets the cached offset so the next crop searches again.
    pub fn reset(&mut self) {
        self.offset = None;
    }

    /// Crops the board region out of `screen`.
    pub fn crop(&mut self, screen: &RgbImage) -> Result<(RgbImage, BoardOffset), BoardError> {
        let offset = match self.offset {
            Some(offset) => offset,
            None => {
                let offset = self.locate(screen)?;
                crate::log(&format!(
                    "Board found at row {}, col {}",
                    offset.row, offset.col
                ));
                self.offset = Some(offset);
                offset
            }
        };

        let (width, height) = screen.dimensions();
        let fits = offset.col.checked_add(BOARD_WIDTH).is_some_and(|r| r <= width)
            && offset.row.checked_add(BOARD_HEIGHT).is_some_and(|b| b <= height);
        if !fits {
            return Err(BoardError::ScreenTooSmall {
                screen_width: width,
                screen_height: height,
                row: offset.row,
                col: offset.col,
            });
        }

        let board =
            image::imageops::crop_imm(screen, offset.col, offset.row, BOARD_WIDTH, BOARD_HEIGHT)
                .to_image();

        Ok((board, offset))
    }

    /// Searches for the anchor and returns the board offset just past it.
    fn locate(&self, screen: &RgbImage) -> Result<BoardOffset, BoardError> {
        let (row, col) =
            find_subimage(screen, &self.reference).ok_or(BoardError::PatternNotFound)?;

        Ok(BoardOffset {
            row: row + self.reference.height(),
            col: col + self.reference.width(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn anchor() -> RgbImage {
        RgbImage::from_fn(4, 3, |x, y| Rgb([200, 10 * x as u8, 50 * y as u8]))
    }

    /// Screen with the anchor pasted at (row, col) and a marker pixel at the
    /// board's top-left corner.
    fn screen_with_anchor(width: u32, height: u32, row: u32, col: u32) -> RgbImage {
        let reference = anchor();
        let mut screen = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
        for y in 0..reference.height() {
            for x in 0..reference.width() {
                screen.put_pixel(col + x, row + y, *reference.get_pixel(x, y));
            }
        }
        screen.put_pixel(col + reference.width(), row + reference.height(), Rgb([1, 2, 3]));
        screen
    }

    #[test]
    fn test_crop_offsets_past_anchor() {
        let screen = screen_with_anchor(600, 500, 30, 50);
        let mut cropper = BoardCropper::new(anchor());

        let (board, offset) = cropper.crop(&screen).unwrap();

        assert_eq!(offset, BoardOffset { row: 33, col: 54 });
        assert_eq!(board.dimensions(), (BOARD_WIDTH, BOARD_HEIGHT));
        assert_eq!(*board.get_pixel(0, 0), Rgb([1, 2, 3]));
    }

    #[test]
    fn test_offset_is_cached() {
        let screen = screen_with_anchor(600, 500, 30, 50);
        let mut cropper = BoardCropper::new(anchor());
        cropper.crop(&screen).unwrap();

        // Anchor no longer visible (covered by an animation), crop still works
        let blank = RgbImage::new(600, 500);
        let (_, offset) = cropper.crop(&blank).unwrap();

        assert_eq!(offset, BoardOffset { row: 33, col: 54 });
    }

    #[test]
    fn test_pattern_not_found() {
        let blank = RgbImage::new(600, 500);
        let mut cropper = BoardCropper::new(anchor());

        assert_eq!(cropper.crop(&blank).unwrap_err(), BoardError::PatternNotFound);
        assert_eq!(cropper.offset(), None);
    }

    #[test]
    fn test_screen_too_small() {
        let screen = screen_with_anchor(300, 500, 0, 0);
        let mut cropper = BoardCropper::new(anchor());

        let err = cropper.crop(&screen).unwrap_err();
        assert!(matches!(err, BoardError::ScreenTooSmall { screen_width: 300, .. }));
    }

    #[test]
    fn test_reset_forgets_offset() {
        let screen = screen_with_anchor(600, 500, 30, 50);
        let mut cropper = BoardCropper::new(anchor());
        cropper.crop(&screen).unwrap();

        cropper.reset();

        assert_eq!(cropper.offset(), None);
        let blank = RgbImage::new(600, 500);
        assert_eq!(cropper.crop(&blank).unwrap_err(), BoardError::PatternNotFound);
    }
}
