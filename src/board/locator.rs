//! Exact sub-image search.

use image::RgbImage;

/// Finds the first exact occurrence of `pattern` inside `haystack`.
///
/// Scans candidate top-left positions in row-major order. Each position is
/// first checked against the pattern's top-left pixel and only then compared
/// row by row, so the result is the same as a full brute-force comparison.
///
/// Returns `(row, col)` of the match, or `None` if the pattern does not occur.
pub fn find_subimage(haystack: &RgbImage, pattern: &RgbImage) -> Option<(u32, u32)> {
    let (cols, rows) = haystack.dimensions();
    let (sub_cols, sub_rows) = pattern.dimensions();

    if sub_cols == 0 || sub_rows == 0 || sub_cols > cols || sub_rows > rows {
        return None;
    }

    let first = pattern.get_pixel(0, 0);

    for i in 0..=(rows - sub_rows) {
        for j in 0..=(cols - sub_cols) {
            if haystack.get_pixel(j, i) != first {
                continue;
            }
            if block_matches(haystack, pattern, i, j) {
                return Some((i, j));
            }
        }
    }

    None
}

/// Compares the block of `haystack` at (row, col) against `pattern`.
fn block_matches(haystack: &RgbImage, pattern: &RgbImage, row: u32, col: u32) -> bool {
    let stride = haystack.width() as usize * 3;
    let sub_stride = pattern.width() as usize * 3;
    let src = haystack.as_raw();
    let sub = pattern.as_raw();

    (0..pattern.height() as usize).all(|r| {
        let start = (row as usize + r) * stride + col as usize * 3;
        src[start..start + sub_stride] == sub[r * sub_stride..(r + 1) * sub_stride]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Builds an image where each pixel's red channel holds the given value.
    fn image_from_rows(rows: &[&[u8]]) -> RgbImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        RgbImage::from_fn(width, height, |x, y| {
            let v = rows[y as usize][x as usize];
            Rgb([v, 0, 0])
        })
    }

    #[test]
    fn test_finds_block_in_small_grid() {
        let a = image_from_rows(&[&[1, 2, 3, 4], &[5, 6, 7, 8]]);
        let sub = image_from_rows(&[&[2, 3], &[6, 7]]);

        assert_eq!(find_subimage(&a, &sub), Some((0, 1)));
    }

    #[test]
    fn test_not_found() {
        let a = image_from_rows(&[&[1, 2, 3, 4], &[5, 6, 7, 8]]);
        let sub = image_from_rows(&[&[2, 3], &[6, 9]]);

        assert_eq!(find_subimage(&a, &sub), None);
    }

    #[test]
    fn test_first_pixel_match_without_block_match() {
        // Top-left pixel of the pattern appears several times before the real match
        let a = image_from_rows(&[&[9, 9, 9, 9], &[9, 1, 9, 9], &[9, 9, 9, 2]]);
        let sub = image_from_rows(&[&[9, 9], &[9, 2]]);

        assert_eq!(find_subimage(&a, &sub), Some((1, 2)));
    }

    #[test]
    fn test_returns_earliest_in_scan_order() {
        let a = image_from_rows(&[&[0, 0, 0], &[0, 7, 7], &[0, 7, 7]]);
        let sub = image_from_rows(&[&[7]]);

        assert_eq!(find_subimage(&a, &sub), Some((1, 1)));
    }

    #[test]
    fn test_known_offset_in_larger_image() {
        let mut a = RgbImage::from_pixel(50, 40, Rgb([10, 20, 30]));
        let sub = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8 * 40, y as u8 * 80, 200]));
        for y in 0..3 {
            for x in 0..5 {
                a.put_pixel(17 + x, 23 + y, *sub.get_pixel(x, y));
            }
        }

        assert_eq!(find_subimage(&a, &sub), Some((23, 17)));
    }

    #[test]
    fn test_pattern_at_bottom_right_corner() {
        let mut a = RgbImage::new(6, 4);
        a.put_pixel(5, 3, Rgb([1, 2, 3]));
        let sub = RgbImage::from_pixel(1, 1, Rgb([1, 2, 3]));

        assert_eq!(find_subimage(&a, &sub), Some((3, 5)));
    }

    #[test]
    fn test_pattern_larger_than_image() {
        let a = RgbImage::new(3, 3);
        let sub = RgbImage::new(4, 1);

        assert_eq!(find_subimage(&a, &sub), None);
    }

    #[test]
    fn test_empty_pattern() {
        let a = RgbImage::new(3, 3);
        let sub = RgbImage::new(0, 0);

        assert_eq!(find_subimage(&a, &sub), None);
    }
}
