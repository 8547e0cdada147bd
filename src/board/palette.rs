//! Tile color classification.

use image::Rgb;

/// Reference colors of the six tile kinds, sampled 10 px into each tile.
/// The index is the tile's category id.
const DIAMOND_DASH_COLORS: [(&str, [u8; 3]); 6] = [
    ("Diamond", [158, 221, 255]),
    ("Yellow", [247, 183, 0]),
    ("Green", [1, 185, 1]),
    ("Purple", [186, 115, 255]),
    ("Red", [242, 0, 16]),
    ("Blue", [6, 104, 253]),
];

/// Ordered list of reference colors, one per tile category.
#[derive(Clone, Debug)]
pub struct Palette {
    entries: Vec<(&'static str, Rgb<u8>)>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(
            DIAMOND_DASH_COLORS
                .iter()
                .map(|(name, c)| (*name, Rgb(*c)))
                .collect(),
        )
    }
}

impl Palette {
    /// Creates a palette from named colors. Must not be empty.
    pub fn new(entries: Vec<(&'static str, Rgb<u8>)>) -> Self {
        assert!(!entries.is_empty(), "palette needs at least one color");
        Self { entries }
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reference color of a category.
    pub fn color(&self, index: u8) -> Rgb<u8> {
        self.entries[index as usize].1
    }

    /// Display name of a category.
    pub fn name(&self, index: u8) -> &'static str {
        self.entries[index as usize].0
    }

    /// Returns the index of the reference color closest to `pixel`.
    ///
    /// Distance is the squared Euclidean distance over RGB. On a tie the
    /// lowest index wins.
    pub fn classify(&self, pixel: Rgb<u8>) -> u8 {
        let mut best = 0;
        let mut best_distance = u32::MAX;

        for (i, (_, color)) in self.entries.iter().enumerate() {
            let distance = color_distance(*color, pixel);
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }

        best as u8
    }

    /// Snaps `pixel` to its nearest reference color.
    pub fn normalize(&self, pixel: Rgb<u8>) -> Rgb<u8> {
        self.color(self.classify(pixel))
    }
}

/// Sum of squared per-channel differences.
fn color_distance(a: Rgb<u8>, b: Rgb<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_colors_are_fixed_points() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 6);

        for i in 0..palette.len() as u8 {
            assert_eq!(palette.classify(palette.color(i)), i, "{}", palette.name(i));
        }
    }

    #[test]
    fn test_tie_goes_to_lower_index() {
        // Midpoint of Diamond (158,221,255) and Purple (186,115,255)
        let palette = Palette::default();
        assert_eq!(palette.classify(Rgb([172, 168, 255])), 0);

        let two = Palette::new(vec![("a", Rgb([0, 0, 0])), ("b", Rgb([2, 0, 0]))]);
        assert_eq!(two.classify(Rgb([1, 0, 0])), 0);
    }

    #[test]
    fn test_near_colors() {
        let palette = Palette::default();
        assert_eq!(palette.name(palette.classify(Rgb([240, 190, 20]))), "Yellow");
        assert_eq!(palette.name(palette.classify(Rgb([10, 170, 10]))), "Green");
        assert_eq!(palette.name(palette.classify(Rgb([230, 20, 30]))), "Red");
        assert_eq!(palette.name(palette.classify(Rgb([20, 110, 240]))), "Blue");
    }

    #[test]
    fn test_normalize() {
        let palette = Palette::default();
        assert_eq!(palette.normalize(Rgb([190, 120, 250])), Rgb([186, 115, 255]));
    }

    #[test]
    fn test_color_distance() {
        assert_eq!(color_distance(Rgb([0, 0, 0]), Rgb([255, 255, 255])), 3 * 255 * 255);
        assert_eq!(color_distance(Rgb([10, 20, 30]), Rgb([10, 20, 30])), 0);
    }
}
