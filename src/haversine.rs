//! Great-circle distances for decoded geometries.
//!
//! Indoor paths are short, so the spherical model is accurate enough; the
//! elevation difference is folded in per segment when both ends have one.

use crate::polyline::Coordinate;

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two (latitude, longitude) points.
pub fn haversine_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Distance in meters between two coordinates, 3-D when both carry elevation.
pub fn segment_m(from: &Coordinate, to: &Coordinate) -> f64 {
    let flat = haversine_m(
        (from.latitude(), from.longitude()),
        (to.latitude(), to.longitude()),
    );
    match (from.elevation(), to.elevation()) {
        (Some(from_ele), Some(to_ele)) => flat.hypot(to_ele - from_ele),
        _ => flat,
    }
}

/// Summed segment length of a coordinate sequence in meters.
pub fn path_length_m(coordinates: &[Coordinate]) -> f64 {
    coordinates
        .windows(2)
        .map(|pair| segment_m(&pair[0], &pair[1]))
        .sum()
}
