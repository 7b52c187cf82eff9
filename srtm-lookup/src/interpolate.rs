//! Altitude interpolation within a tile.
//!
//! A point inside a tile falls in a cell of four neighbouring samples. With no
//! voids the altitude is the bilinear blend of the corners. A single void is
//! replaced by the mean of the other three before blending, two or three voids
//! give the plain mean of what remains, and a cell of four voids has no
//! altitude at all.
//!
//! In terrain mode any void in the cell yields no altitude.

use crate::grid::{Grid, VOID_VALUE};

/// Mean of the non-void values, or [`VOID_VALUE`] if every value is void.
pub fn average_non_void(altitudes: &[i16]) -> f64 {
    let (total, count) = altitudes
        .iter()
        .filter(|&&a| a != VOID_VALUE)
        .fold((0.0, 0u32), |(t, n), &a| (t + f64::from(a), n + 1));

    if count == 0 {
        f64::from(VOID_VALUE)
    } else {
        total / f64::from(count)
    }
}

/// Copy of `altitudes` with every void replaced by the rounded mean of the
/// non-void values.
pub fn fix_void(altitudes: [i16; 4]) -> [i16; 4] {
    let fill = round_half_up(average_non_void(&altitudes)) as i16;
    altitudes.map(|a| if a == VOID_VALUE { fill } else { a })
}

/// Bilinear blend of four corners given as bottom-left, bottom-right,
/// top-left, top-right.
///
/// `x` runs from 0 (left) to 1 (right), `y` from 0 (top) to 1 (bottom).
///
/// # Examples
///
/// ```
/// use srtm_lookup::interpolate::bilinear;
///
/// let corners = [100, 120, 200, 240];
/// assert_eq!(bilinear(corners, 0.0, 0.0), 200.0);
/// assert_eq!(bilinear(corners, 0.5, 0.5), 165.0);
/// ```
pub fn bilinear(corners: [i16; 4], x: f64, y: f64) -> f64 {
    let [bl, br, tl, tr] = corners.map(f64::from);
    (1.0 - x) * y * bl + x * y * br + (1.0 - x) * (1.0 - y) * tl + x * (1.0 - y) * tr
}

/// Altitude of a point from the grid of the tile containing it.
///
/// Returns `None` when the cell around the point holds no usable data: all four
/// samples are void, or `terrain` is set and at least one is.
pub fn altitude_at(grid: &Grid, lat: f64, lon: f64, terrain: bool) -> Option<f64> {
    let side = grid.side();
    let span = (side - 1) as f64;

    let x_pixels = (lon - lon.floor()) * span;
    let y_pixels_up = (lat - lat.floor()) * span;

    let col = (x_pixels.floor() as usize).min(side - 2);
    let rows_up = (y_pixels_up.floor() as usize).min(side - 2);
    // Row of the cell's top edge, counted from the northern edge
    let row = side - 2 - rows_up;

    let x_frac = x_pixels - x_pixels.floor();
    let y_frac_down = 1.0 - (y_pixels_up - y_pixels_up.floor());

    let corners = [
        grid.get(row + 1, col),
        grid.get(row + 1, col + 1),
        grid.get(row, col),
        grid.get(row, col + 1),
    ];
    let voids = corners.iter().filter(|&&a| a == VOID_VALUE).count();

    if voids > 0 && terrain {
        return None;
    }

    match voids {
        0 => Some(bilinear(corners, x_frac, y_frac_down)),
        1 => Some(bilinear(fix_void(corners), x_frac, y_frac_down)),
        2 | 3 => Some(average_non_void(&corners)),
        _ => None,
    }
}

/// Round to the nearest integer, halves towards positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    const V: i16 = VOID_VALUE;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn grid5() -> Grid {
        Grid::from_samples(
            5,
            vec![
                2, 2, 1, 1, 1, //
                2, 2, 3, 3, 1, //
                1, 3, 5, 3, 1, //
                1, 3, 3, 3, 4, //
                1, 1, 1, 1, 1,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_average_non_void_all_void() {
        assert_eq!(average_non_void(&[]), f64::from(V));
        assert_eq!(average_non_void(&[V]), f64::from(V));
        assert_eq!(average_non_void(&[V, V, V]), f64::from(V));
    }

    #[test]
    fn test_average_non_void() {
        assert_eq!(average_non_void(&[0]), 0.0);
        assert_eq!(average_non_void(&[V, 0]), 0.0);
        assert_eq!(average_non_void(&[1, V, -1, V]), 0.0);
        assert_eq!(average_non_void(&[9, 11]), 10.0);
        assert_eq!(average_non_void(&[9, V, 11, V]), 10.0);
    }

    #[test]
    fn test_fix_void() {
        assert_eq!(fix_void([3, 4, 5, 6]), [3, 4, 5, 6]);
        assert_eq!(fix_void([4, 5, V, 9]), [4, 5, 6, 9]);
        // mean 2.5 rounds up
        assert_eq!(fix_void([2, 3, V, V]), [2, 3, 3, 3]);
        // mean -2.5 rounds towards zero
        assert_eq!(fix_void([-2, -3, V, V]), [-2, -3, -2, -2]);
    }

    #[test]
    fn test_fix_void_leaves_input_untouched() {
        let cell = [4, 5, V, 9];
        let _ = fix_void(cell);
        assert_eq!(cell[2], V);
    }

    #[test]
    fn test_bilinear_corners_and_edges() {
        let corners = [100, 120, 200, 240];
        assert_eq!(bilinear(corners, 0.0, 1.0), 100.0);
        assert_eq!(bilinear(corners, 0.0, 0.0), 200.0);
        assert_eq!(bilinear(corners, 1.0, 1.0), 120.0);
        assert_eq!(bilinear(corners, 1.0, 0.0), 240.0);
        assert_eq!(bilinear(corners, 0.5, 0.0), 220.0);
        assert_eq!(bilinear(corners, 0.0, 0.5), 150.0);
        assert_eq!(bilinear(corners, 0.5, 0.5), 165.0);
    }

    #[test]
    fn test_bilinear_constant_field() {
        for &(x, y) in &[(0.0, 0.0), (0.3, 0.7), (0.99, 0.01), (0.5, 0.5)] {
            assert_eq!(bilinear([0, 0, 0, 0], x, y), 0.0);
            assert_close(bilinear([100, 100, 100, 100], x, y), 100.0);
        }
    }

    #[test]
    fn test_altitude_at_corners() {
        let grid = grid5();
        // bottom-left sample of the tile
        assert_eq!(altitude_at(&grid, 18.0, 15.0, false), Some(1.0));
        // just below the top-left sample
        let top_left = altitude_at(&grid, 18.9999, 15.0, false).unwrap();
        assert_close(top_left, 2.0);
        // centre sample
        assert_eq!(altitude_at(&grid, 100.5, 19.5, false), Some(5.0));
        // negative coordinates use the same fractional position
        assert_eq!(altitude_at(&grid, -18.0, -15.0, false), Some(1.0));
    }

    #[test]
    fn test_altitude_at_interpolated() {
        let grid = grid5();
        // middle of the bottom-left cell {1, 1, 1, 3}
        assert_eq!(altitude_at(&grid, 44.125, 2.125, false), Some(1.5));
        assert_eq!(altitude_at(&grid, 44.125, -40.875, false), Some(1.5));
        assert_eq!(altitude_at(&grid, -33.875, -40.875, false), Some(1.5));
    }

    #[test]
    fn test_altitude_at_strip() {
        let mut samples = Vec::new();
        for row in 0..7 {
            samples.extend(std::iter::repeat(row as i16).take(7));
        }
        let grid = Grid::from_samples(7, samples).unwrap();

        for i in 0..100 {
            let lat = 58.0 + f64::from(i) / 100.0;
            let height = altitude_at(&grid, lat, 11.2, false).unwrap();
            assert_close(height, 6.0 - 0.06 * f64::from(i));
        }
    }

    fn cell_grid(corners: [i16; 4]) -> Grid {
        // 2x2 grid: row 0 is the top edge
        let [bl, br, tl, tr] = corners;
        Grid::from_samples(2, vec![tl, tr, bl, br]).unwrap()
    }

    #[test]
    fn test_one_void_within_range() {
        let grid = cell_grid([10, V, 30, 20]);
        for &(lat, lon) in &[(0.1, 0.1), (0.5, 0.5), (0.9, 0.2), (0.3, 0.95)] {
            let alt = altitude_at(&grid, lat, lon, false).unwrap();
            assert!((10.0..=30.0).contains(&alt), "{alt} outside [10, 30]");
        }
    }

    #[test]
    fn test_two_and_three_voids_use_mean() {
        let grid = cell_grid([10, V, V, 20]);
        assert_eq!(altitude_at(&grid, 0.1, 0.9, false), Some(15.0));

        let grid = cell_grid([V, V, V, 7]);
        assert_eq!(altitude_at(&grid, 0.5, 0.5, false), Some(7.0));
    }

    #[test]
    fn test_four_voids_no_altitude() {
        let grid = cell_grid([V, V, V, V]);
        assert_eq!(altitude_at(&grid, 0.5, 0.5, false), None);
    }

    #[test]
    fn test_terrain_mode_rejects_any_void() {
        let grid = cell_grid([10, 10, V, 10]);
        assert_eq!(altitude_at(&grid, 0.5, 0.5, false), Some(10.0));
        assert_eq!(altitude_at(&grid, 0.5, 0.5, true), None);

        let grid = cell_grid([10, 20, 30, 40]);
        assert_eq!(altitude_at(&grid, 0.0, 0.0, true), Some(10.0));
    }
}
