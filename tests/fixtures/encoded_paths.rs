//! Encoded polylines with their expected decoded values.

/// The reference polyline from the format documentation.
pub const CLASSIC: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

/// (lng, lat) pairs encoded by [`CLASSIC`].
pub const CLASSIC_POSITIONS: &[(f64, f64)] = &[(-120.2, 38.5), (-120.95, 40.7), (-126.453, 43.252)];

/// Two indoor points: (lat 0.00001, lng 0.00002, level 1) then
/// (lat 0, lng 0.00002, level 2).
pub const INDOOR_TWO_POINTS: &str = "ACA@?A";

/// One point at (lat 0.00001, lng 0.00002) with 150 cm of elevation.
pub const ELEVATION_POINT: &str = "ACkH";

/// [`ELEVATION_POINT`] followed by a level group of 0.
pub const ELEVATION_INDOOR_POINT: &str = "ACkH?";
