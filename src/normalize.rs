//
// normalize.rs
// Dicom-Convert-rs
//
// Maps raw pixel samples into the 0-255 display range using either the stored VOI window
// or the full min/max range of the image, then applies MONOCHROME1 inversion.
//

use crate::models::{NormalizedGrid, PhotometricPolarity, PixelGrid, WindowSpec};

const DISPLAY_MAX: f64 = 255.0;

/// Converts a raw grid into display values.
///
/// With a window, samples are clipped to `center ± width / 2` before the linear
/// rescale; without one, the grid's own min and max are used. A zero-width range
/// produces an all-black image. Results are truncated toward zero, not rounded.
pub fn normalize(
    grid: &PixelGrid,
    window: Option<WindowSpec>,
    polarity: PhotometricPolarity,
) -> NormalizedGrid {
    let (low, high) = match window {
        Some(window) => window.bounds(),
        None => value_range(grid),
    };

    let mut out = if high == low {
        NormalizedGrid::zeros(grid.raw_dim())
    } else {
        let span = high - low;
        grid.mapv(|v| {
            // max-then-min, so an inverted range collapses onto `high`
            let clipped = v.max(low).min(high);
            to_display((clipped - low) / span * DISPLAY_MAX)
        })
    };

    if polarity == PhotometricPolarity::Inverted {
        invert(&mut out);
    }
    out
}

/// Replaces every sample `v` with `255 - v`.
pub fn invert(grid: &mut NormalizedGrid) {
    grid.mapv_inplace(|v| u8::MAX - v);
}

fn value_range(grid: &PixelGrid) -> (f64, f64) {
    if grid.is_empty() {
        return (0.0, 0.0);
    }
    grid.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn to_display(value: f64) -> u8 {
    // `as` truncates; the clamp guards against rounding drift at the edges
    value.clamp(0.0, DISPLAY_MAX) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn window_maps_center_to_mid_gray() {
        let grid = Array2::from_elem((3, 4), 1000.0);
        let out = normalize(
            &grid,
            Some(WindowSpec::new(1000.0, 2000.0)),
            PhotometricPolarity::Normal,
        );
        assert_eq!(out.dim(), (3, 4));
        assert!(out.iter().all(|&v| v == 127));
    }

    #[test]
    fn window_clips_values_outside_bounds() {
        let grid = array![[-5000.0, 0.0], [100.0, 5000.0]];
        let out = normalize(
            &grid,
            Some(WindowSpec::new(50.0, 100.0)),
            PhotometricPolarity::Normal,
        );
        assert_eq!(out, array![[0u8, 0], [255, 255]]);
    }

    #[test]
    fn constant_grid_without_window_is_black() {
        let grid = Array2::from_elem((2, 2), 50.0);
        let out = normalize(&grid, None, PhotometricPolarity::Normal);
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn zero_width_window_is_black() {
        let grid = array![[1.0, 2.0], [3.0, 4.0]];
        let out = normalize(
            &grid,
            Some(WindowSpec::new(2.0, 0.0)),
            PhotometricPolarity::Normal,
        );
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn full_range_grid_maps_to_itself() {
        let values: Vec<f64> = (0..=255).map(f64::from).collect();
        let grid = Array2::from_shape_vec((16, 16), values).unwrap();
        let out = normalize(&grid, None, PhotometricPolarity::Normal);
        for (raw, display) in grid.iter().zip(out.iter()) {
            assert_eq!(*raw as u8, *display);
        }
    }

    #[test]
    fn min_max_rescale_truncates() {
        // 1/3 * 255 = 85.0, 2/3 * 255 = 170.0; 1/7 * 255 = 36.43 -> 36
        let grid = array![[0.0, 1.0, 2.0, 3.0]];
        let out = normalize(&grid, None, PhotometricPolarity::Normal);
        assert_eq!(out, array![[0u8, 85, 170, 255]]);

        let grid = array![[0.0, 1.0, 7.0]];
        let out = normalize(&grid, None, PhotometricPolarity::Normal);
        assert_eq!(out, array![[0u8, 36, 255]]);
    }

    #[test]
    fn signed_samples_are_rescaled() {
        let grid = array![[-1024.0, 0.0], [1024.0, 3071.0]];
        let out = normalize(&grid, None, PhotometricPolarity::Normal);
        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[1, 1]], 255);
    }

    #[test]
    fn inverted_polarity_mirrors_normal_output() {
        let grid = array![[0.0, 10.0], [20.0, 40.0]];
        let normal = normalize(&grid, None, PhotometricPolarity::Normal);
        let inverted = normalize(&grid, None, PhotometricPolarity::Inverted);
        for (n, i) in normal.iter().zip(inverted.iter()) {
            assert_eq!(*i, 255 - *n);
        }
    }

    #[test]
    fn inverting_twice_restores_grid() {
        let grid = array![[0.0, 3.0], [77.0, 1000.0]];
        let original = normalize(&grid, None, PhotometricPolarity::Normal);
        let mut twice = original.clone();
        invert(&mut twice);
        invert(&mut twice);
        assert_eq!(twice, original);
    }

    #[test]
    fn window_output_is_monotonic_with_saturated_ends() {
        let values: Vec<f64> = (-50..50).map(|v| f64::from(v) * 97.3).collect();
        let grid = Array2::from_shape_vec((10, 10), values).unwrap();
        for (center, width) in [(0.0, 1.0), (-300.0, 40.0), (12.5, 9000.0)] {
            let out = normalize(
                &grid,
                Some(WindowSpec::new(center, width)),
                PhotometricPolarity::Normal,
            );
            let flat: Vec<u8> = out.iter().copied().collect();
            assert!(flat.windows(2).all(|pair| pair[0] <= pair[1]));
            assert_eq!(flat[0], 0);
            assert_eq!(flat[flat.len() - 1], 255);
        }
    }

    #[test]
    fn empty_grid_stays_empty() {
        let grid = PixelGrid::zeros((0, 0));
        let out = normalize(&grid, None, PhotometricPolarity::Inverted);
        assert!(out.is_empty());
    }
}
