//! Typed indoor points.
//!
//! [`IndoorPoint`] is the strict form of an endpoint: a coordinate plus an
//! integer level, as the routing backend expects it in `"lat,lon,level"`
//! query parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndoorPoint {
    pub lat: f64,
    pub lon: f64,
    pub level: i32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointParseError {
    #[error("expected 3 comma-separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("invalid level '{0}'")]
    InvalidLevel(String),
}

impl IndoorPoint {
    /// Level sentinel for a point whose level is not known.
    pub const UNKNOWN_LEVEL: i32 = i32::MAX;

    pub fn new(lat: f64, lon: f64, level: i32) -> Self {
        Self { lat, lon, level }
    }

    /// Parses `"lon,lat,level"`, the order GeoJSON-minded clients send.
    pub fn parse_lon_lat(text: &str) -> Result<Self, PointParseError> {
        parse_fields(text, true)
    }

    pub fn is_valid(&self) -> bool {
        !self.lat.is_nan() && !self.lon.is_nan() && self.level != Self::UNKNOWN_LEVEL
    }
}

impl FromStr for IndoorPoint {
    type Err = PointParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_fields(text, false)
    }
}

impl fmt::Display for IndoorPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.lat, self.lon, self.level)
    }
}

fn parse_fields(text: &str, lon_lat_order: bool) -> Result<IndoorPoint, PointParseError> {
    let fields: Vec<&str> = text.split(',').collect();
    let [first, second, level] = fields.as_slice() else {
        return Err(PointParseError::FieldCount(fields.len()));
    };

    let first = parse_coordinate(first)?;
    let second = parse_coordinate(second)?;
    let level = level
        .trim()
        .parse::<i32>()
        .map_err(|_| PointParseError::InvalidLevel(level.to_string()))?;

    Ok(if lon_lat_order {
        IndoorPoint::new(second, first, level)
    } else {
        IndoorPoint::new(first, second, level)
    })
}

fn parse_coordinate(field: &str) -> Result<f64, PointParseError> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| PointParseError::InvalidCoordinate(field.to_string()))
}
