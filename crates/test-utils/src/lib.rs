//! Shared test utilities for the hazard preparation workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Raster and grid generators
//! - Forecast table and boundary file builders
//! - Common test fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, ForecastCsvBuilder};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Asserts that two numbers differ by at most `epsilon`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        if !((left - right).abs() <= epsilon) {
            panic!(
                "values differ by more than {}: left {}, right {}",
                epsilon, left, right
            );
        }
    }};
}

/// Asserts that two `(x, y)` pairs agree within `epsilon` on both axes.
///
/// Either side may be any expression yielding a tuple, such as
/// `GeoTransform::resolution()` or a decoded `(lat, lon)`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (x1, y1) = $left;
        let (x2, y2) = $right;
        $crate::assert_approx_eq!(x1, x2, $epsilon);
        $crate::assert_approx_eq!(y1, y2, $epsilon);
    }};
}

/// Asserts a raster footprint against `(min_x, min_y, max_x, max_y)`.
#[macro_export]
macro_rules! assert_bounds_approx_eq {
    ($bounds:expr, ($min_x:expr, $min_y:expr, $max_x:expr, $max_y:expr), $epsilon:expr) => {{
        let bounds = $bounds;
        $crate::assert_coords_approx_eq!((bounds.min_x, bounds.min_y), ($min_x, $min_y), $epsilon);
        $crate::assert_coords_approx_eq!((bounds.max_x, bounds.max_y), ($max_x, $max_y), $epsilon);
    }};
}

/// Asserts that every cell of a band holds `value` within `epsilon`.
#[macro_export]
macro_rules! assert_cells_approx_eq {
    ($cells:expr, $value:expr, $epsilon:expr) => {{
        for (i, &cell) in $cells.iter().enumerate() {
            let (value, epsilon) = ($value as f64, $epsilon as f64);
            if !((cell as f64 - value).abs() <= epsilon) {
                panic!("cell {} holds {}, expected {} within {}", i, cell, value, epsilon);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use hazard_common::BoundingBox;

    #[test]
    fn test_approx_eq_within_tolerance() {
        assert_approx_eq!(30.000_001, 30.0, 1e-5);
        assert_approx_eq!(-128, -128.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "values differ")]
    fn test_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }

    #[test]
    fn test_coords_from_tuple_expression() {
        let resolution = || (30.0, 30.000_000_1);
        assert_coords_approx_eq!(resolution(), (30.0, 30.0), 1e-6);
    }

    #[test]
    fn test_bounds_and_cells() {
        let bbox = BoundingBox::new(330_000.0, 3_060_000.0, 333_000.0, 3_063_000.0);
        assert_bounds_approx_eq!(bbox, (330_000.0, 3_060_000.0, 333_000.0, 3_063_000.0), 1e-9);
        assert_cells_approx_eq!(vec![9.0_f32, 9.0], 9.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "cell 1")]
    fn test_cells_report_first_mismatch() {
        assert_cells_approx_eq!([4.0, 3.0, 4.0], 4.0, 0.5);
    }
}
