//! Test fixtures for indoor-geometry.
//!
//! Provides known encoded polylines and float comparison helpers.

pub mod encoded_paths;

pub use encoded_paths::*;

/// Precision of the polyline coordinate channel.
pub const COORD_EPSILON: f64 = 1e-9;

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < COORD_EPSILON,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// Asserts a decoded (lng, lat) pair.
pub fn assert_position(coordinate: &indoor_geometry::polyline::Coordinate, lng: f64, lat: f64) {
    assert_close(coordinate.longitude(), lng);
    assert_close(coordinate.latitude(), lat);
}
