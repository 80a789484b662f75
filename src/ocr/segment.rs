//! Connected-component segmentation of a text mask.
//!
//! Every maximal 8-connected group of on cells becomes one [`Symbol`]. The
//! mask is scanned row by row; each time an unclaimed on cell is found, an
//! iterative flood fill (explicit stack, so large glyphs cannot exhaust the
//! call stack) claims the whole component by clearing its cells. Components
//! therefore come out in the order their top-most, then left-most, pixel is
//! reached by the scan.

use serde::Serialize;

use super::bitmap::Bitmap;

/// Minimal axis-aligned rectangle enclosing a component, in mask coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    /// Column of the left-most pixel
    pub left: u32,
    /// Row of the top-most pixel
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// One segmented glyph: where it is and what it looks like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub bbox: BoundingBox,
    /// Box-shaped bitmap with the component's pixels at box-relative offsets
    pub bitmap: Bitmap,
}

/// Splits a mask into its 8-connected components.
///
/// Takes the mask by value: claimed cells are cleared as components are
/// found, so the mask is consumed by the scan.
pub fn find_components(mut mask: Bitmap) -> Vec<Symbol> {
    let mut symbols = Vec::new();

    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if mask.get(x, y) {
                let points = flood_fill(&mut mask, x, y);
                symbols.push(points_to_symbol(&points));
            }
        }
    }

    symbols
}

/// Claims every cell 8-connected to (x0, y0) and returns their coordinates.
fn flood_fill(mask: &mut Bitmap, x0: u32, y0: u32) -> Vec<(u32, u32)> {
    let max_x = mask.width() - 1;
    let max_y = mask.height() - 1;

    let mut points = Vec::new();
    let mut stack = vec![(x0, y0)];

    while let Some((x, y)) = stack.pop() {
        // A cell can be pushed from several neighbors before it is claimed.
        if !mask.get(x, y) {
            continue;
        }
        mask.set(x, y, false);
        points.push((x, y));

        for ny in y.saturating_sub(1)..=(y + 1).min(max_y) {
            for nx in x.saturating_sub(1)..=(x + 1).min(max_x) {
                if (nx, ny) != (x, y) && mask.get(nx, ny) {
                    stack.push((nx, ny));
                }
            }
        }
    }

    points
}

/// Builds the bounding box and cropped bitmap for a non-empty point set.
fn points_to_symbol(points: &[(u32, u32)]) -> Symbol {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;

    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    let bbox = BoundingBox {
        left: min_x,
        top: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    };

    let mut bitmap = Bitmap::new(bbox.width, bbox.height);
    for &(x, y) in points {
        bitmap.set(x - min_x, y - min_y, true);
    }

    Symbol { bbox, bitmap }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mask_has_no_components() {
        assert!(find_components(Bitmap::new(8, 4)).is_empty());
        assert!(find_components(Bitmap::new(0, 0)).is_empty());
    }

    #[test]
    fn test_single_pixel_is_a_component() {
        let mut mask = Bitmap::new(5, 5);
        mask.set(3, 2, true);

        let symbols = find_components(mask);

        assert_eq!(symbols.len(), 1);
        assert_eq!(
            symbols[0].bbox,
            BoundingBox {
                left: 3,
                top: 2,
                width: 1,
                height: 1
            }
        );
        assert_eq!(symbols[0].bitmap.count_on(), 1);
    }

    #[test]
    fn test_single_component_keeps_all_pixels() {
        let mask = Bitmap::from_pattern(&[
            ".......",
            "..###..",
            "..#....",
            "..###..",
            "....#..",
            "..###..",
        ]);
        let on_cells = mask.count_on();

        let symbols = find_components(mask);

        assert_eq!(symbols.len(), 1);
        let symbol = &symbols[0];
        assert_eq!(symbol.bitmap.count_on(), on_cells);
        assert_eq!(
            symbol.bbox,
            BoundingBox {
                left: 2,
                top: 1,
                width: 3,
                height: 5
            }
        );
        assert_eq!(
            symbol.bitmap.to_pattern(),
            ["###", "#..", "###", "..#", "###"]
        );
    }

    #[test]
    fn test_diagonal_neighbors_are_connected() {
        let mask = Bitmap::from_pattern(&["#...", ".#..", "..#.", "...#"]);

        let symbols = find_components(mask);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].bbox.width, 4);
        assert_eq!(symbols[0].bbox.height, 4);
    }

    #[test]
    fn test_separated_components_are_disjoint() {
        let mask = Bitmap::from_pattern(&[
            "##....", //
            "##....",
            "......",
            "....##",
            "....#.",
        ]);

        let symbols = find_components(mask);

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].bbox.left, 0);
        assert_eq!(symbols[0].bitmap.count_on(), 4);
        assert_eq!(symbols[1].bbox.left, 4);
        assert_eq!(symbols[1].bbox.top, 3);
        assert_eq!(symbols[1].bitmap.count_on(), 3);
    }

    #[test]
    fn test_components_follow_row_major_discovery_order() {
        // The right glyph starts one row higher, so it is found first.
        let mask = Bitmap::from_pattern(&[
            "....#", //
            "#...#",
            "#...#",
            "#....",
        ]);

        let symbols = find_components(mask);

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].bbox.left, 4);
        assert_eq!(symbols[1].bbox.left, 0);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let mask = Bitmap::from_pattern(&[
            "#.#.#..##", //
            "#.#.#...#",
            "..#..#..#",
            "##...#...",
        ]);

        let first = find_components(mask.clone());
        let second = find_components(mask);

        assert_eq!(first, second);
    }

    #[test]
    fn test_large_component_does_not_overflow_stack() {
        let mut mask = Bitmap::new(400, 400);
        for y in 0..400 {
            for x in 0..400 {
                mask.set(x, y, true);
            }
        }

        let symbols = find_components(mask);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].bitmap.count_on(), 160_000);
    }

    #[test]
    fn test_component_holes_stay_off() {
        let mask = Bitmap::from_pattern(&["###", "#.#", "###"]);

        let symbols = find_components(mask);

        assert_eq!(symbols.len(), 1);
        assert!(!symbols[0].bitmap.get(1, 1));
        assert_eq!(symbols[0].bitmap.count_on(), 8);
    }
}
