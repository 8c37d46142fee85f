//! Encoded polyline geometries.
//!
//! Route responses carry their geometry as a Google-style encoded polyline,
//! optionally extended with an elevation channel and an indoor level channel.
//! Decoding happens once at the boundary; everything downstream works with
//! [`DecodedPath`].
//!
//! Every point is a run of value groups in a fixed order: latitude,
//! longitude, then elevation (if enabled), then level (if enabled). Each
//! group is a zigzag-encoded delta against the previous point, written as
//! 5-bit chunks offset by ASCII 63.

use std::fmt;

use rayon::prelude::*;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::haversine;
use crate::point::IndoorPoint;

/// Latitude and longitude are stored with 5 decimal digits.
const COORD_FACTOR: f64 = 1e5;
const COORD_SCALE: f64 = 1e-5;

/// Elevation is stored in centimeters.
const ELEVATION_FACTOR: f64 = 100.0;

const CHAR_OFFSET: u8 = 63;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION_BIT: i64 = 0x20;

/// Longest accepted value group (35 bits of payload).
const MAX_GROUP_LEN: usize = 7;

/// Delta range that zigzag-encodes into at most [`MAX_GROUP_LEN`] characters.
const MIN_DELTA: i64 = -(1 << 34);
const MAX_DELTA: i64 = (1 << 34) - 1;

/// Which optional channels an encoded polyline carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Every point carries an elevation delta in centimeters.
    pub elevation: bool,
    /// Every point carries an indoor level delta.
    pub indoor: bool,
}

impl DecodeOptions {
    pub const PLANAR: Self = Self {
        elevation: false,
        indoor: false,
    };
    pub const ELEVATION: Self = Self {
        elevation: true,
        indoor: false,
    };
    pub const INDOOR: Self = Self {
        elevation: false,
        indoor: true,
    };

    pub fn new(elevation: bool, indoor: bool) -> Self {
        Self { elevation, indoor }
    }
}

/// A single decoded position.
///
/// Serializes as a GeoJSON position: `[lng, lat]`, `[lng, lat, ele]`, with
/// the level appended last when one is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    longitude: f64,
    latitude: f64,
    elevation: Option<f64>,
    level: Option<i64>,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            elevation: None,
            level: None,
        }
    }

    /// Returns a copy carrying the given elevation in meters.
    pub fn with_elevation(self, elevation: f64) -> Self {
        Self {
            elevation: Some(elevation),
            ..self
        }
    }

    /// Returns a copy carrying the given indoor level.
    pub fn with_level(self, level: i64) -> Self {
        Self {
            level: Some(level),
            ..self
        }
    }

    /// Returns the bare longitude/latitude pair as a coordinate.
    pub fn planar(&self) -> Self {
        Self::new(self.longitude, self.latitude)
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Elevation in meters.
    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    pub fn level(&self) -> Option<i64> {
        self.level
    }

    /// Converts a leveled coordinate into an [`IndoorPoint`].
    ///
    /// Returns `None` without a level or when the level does not fit an `i32`.
    pub fn to_indoor_point(&self) -> Option<IndoorPoint> {
        let level = i32::try_from(self.level?).ok()?;
        Some(IndoorPoint::new(self.latitude, self.longitude, level))
    }
}

impl Serialize for Coordinate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = 2 + usize::from(self.elevation.is_some()) + usize::from(self.level.is_some());
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.longitude)?;
        seq.serialize_element(&self.latitude)?;
        if let Some(elevation) = self.elevation {
            seq.serialize_element(&elevation)?;
        }
        if let Some(level) = self.level {
            seq.serialize_element(&level)?;
        }
        seq.end()
    }
}

/// Why an encoded polyline was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    #[error("input ends inside a value or point")]
    Truncated,
    #[error("byte {0:#04x} is outside the polyline alphabet")]
    InvalidCharacter(u8),
    #[error("value group is longer than 7 characters")]
    Overflow,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("malformed polyline at byte {offset}: {kind}")]
pub struct MalformedEncodingError {
    /// Byte offset into the encoded string.
    pub offset: usize,
    pub kind: MalformedKind,
}

/// The value channel a [`EncodeError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Latitude,
    Longitude,
    Elevation,
    Level,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Latitude => "latitude",
            Channel::Longitude => "longitude",
            Channel::Elevation => "elevation",
            Channel::Level => "level",
        })
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    #[error("point {index}: {channel} is not a finite number")]
    NonFinite { index: usize, channel: Channel },
    #[error("point {index}: {channel} delta does not fit a 7-character value group")]
    DeltaTooLarge { index: usize, channel: Channel },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("point list and level list must have the same size: {coordinates} points, {levels} levels")]
    LevelCountMismatch { coordinates: usize, levels: usize },
}

/// The result of decoding one polyline.
///
/// When the polyline carried indoor levels, `levels` holds one entry per
/// coordinate and the coordinates themselves are two-dimensional. Otherwise
/// `levels` is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedPath {
    coordinates: Vec<Coordinate>,
    levels: Vec<i64>,
}

impl DecodedPath {
    /// Creates a path without a level channel.
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self {
            coordinates,
            levels: Vec::new(),
        }
    }

    /// Creates a path with a level channel, which must be empty or the same
    /// length as `coordinates`.
    pub fn from_parts(coordinates: Vec<Coordinate>, levels: Vec<i64>) -> Result<Self, PathError> {
        if !levels.is_empty() && levels.len() != coordinates.len() {
            return Err(PathError::LevelCountMismatch {
                coordinates: coordinates.len(),
                levels: levels.len(),
            });
        }
        Ok(Self { coordinates, levels })
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn levels(&self) -> &[i64] {
        &self.levels
    }

    pub fn has_levels(&self) -> bool {
        !self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn level_at(&self, index: usize) -> Option<i64> {
        self.levels.get(index).copied()
    }

    /// Iterates the coordinates with their level attached, if the path has
    /// a level channel.
    pub fn leveled(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.coordinates
            .iter()
            .enumerate()
            .map(move |(index, coordinate)| match self.levels.get(index) {
                Some(&level) => coordinate.with_level(level),
                None => *coordinate,
            })
    }

    /// Reverses the path, keeping levels aligned with their coordinates.
    pub fn reverse(&mut self) {
        self.coordinates.reverse();
        self.levels.reverse();
    }

    /// Length of the path in meters, including elevation changes where both
    /// ends of a segment carry elevation.
    pub fn distance_m(&self) -> f64 {
        haversine::path_length_m(&self.coordinates)
    }

    pub fn into_parts(self) -> (Vec<Coordinate>, Vec<i64>) {
        (self.coordinates, self.levels)
    }
}

/// Decodes `encoded`, reading an elevation channel if `has_3d` and a level
/// channel if `has_indoor`.
pub fn decode(encoded: &str, has_3d: bool, has_indoor: bool) -> Result<DecodedPath, MalformedEncodingError> {
    decode_with(encoded, DecodeOptions::new(has_3d, has_indoor))
}

/// Decodes `encoded` with the channels described by `options`.
///
/// With both channels enabled the elevation group is still consumed, but an
/// indoor point is emitted without elevation.
pub fn decode_with(encoded: &str, options: DecodeOptions) -> Result<DecodedPath, MalformedEncodingError> {
    decode_points(encoded.as_bytes(), options).inspect_err(|err| {
        debug!(offset = err.offset, kind = %err.kind, "rejected encoded polyline");
    })
}

/// Decodes several polylines in parallel, e.g. the legs of one route
/// response. Results are returned in input order.
#[instrument(skip_all, fields(paths = encoded.len()))]
pub fn decode_batch<S>(encoded: &[S], options: DecodeOptions) -> Vec<Result<DecodedPath, MalformedEncodingError>>
where
    S: AsRef<str> + Sync,
{
    encoded
        .par_iter()
        .map(|path| decode_with(path.as_ref(), options))
        .collect()
}

fn decode_points(bytes: &[u8], options: DecodeOptions) -> Result<DecodedPath, MalformedEncodingError> {
    let mut cursor = Cursor::new(bytes);
    let mut coordinates = Vec::new();
    let mut levels = Vec::new();

    let mut lat = 0_i64;
    let mut lng = 0_i64;
    let mut ele = 0_i64;
    let mut level = 0_i64;

    while !cursor.is_at_end() {
        lat += cursor.read_delta()?;
        lng += cursor.read_delta()?;

        let mut coordinate = Coordinate::new(lng as f64 * COORD_SCALE, lat as f64 * COORD_SCALE);

        if options.elevation {
            ele += cursor.read_delta()?;
            if !options.indoor {
                coordinate = coordinate.with_elevation(ele as f64 / ELEVATION_FACTOR);
            }
        }

        if options.indoor {
            level += cursor.read_delta()?;
            levels.push(level);
        }

        coordinates.push(coordinate);
    }

    Ok(DecodedPath { coordinates, levels })
}

/// Encodes `coordinates` with the channels described by `options`.
///
/// Missing elevations and levels are written as zero. Fails instead of
/// writing a value group [`decode`] would reject.
pub fn encode(coordinates: &[Coordinate], options: DecodeOptions) -> Result<String, EncodeError> {
    let mut encoded = String::new();
    let mut prev_lat = 0_i64;
    let mut prev_lng = 0_i64;
    let mut prev_ele = 0_i64;
    let mut prev_level = 0_i64;

    for (index, coordinate) in coordinates.iter().enumerate() {
        let lat = to_fixed(coordinate.latitude, COORD_FACTOR, index, Channel::Latitude)?;
        let lng = to_fixed(coordinate.longitude, COORD_FACTOR, index, Channel::Longitude)?;
        write_delta(&mut encoded, lat, prev_lat, index, Channel::Latitude)?;
        write_delta(&mut encoded, lng, prev_lng, index, Channel::Longitude)?;
        prev_lat = lat;
        prev_lng = lng;

        if options.elevation {
            let elevation = coordinate.elevation.unwrap_or(0.0);
            let ele = to_fixed(elevation, ELEVATION_FACTOR, index, Channel::Elevation)?;
            write_delta(&mut encoded, ele, prev_ele, index, Channel::Elevation)?;
            prev_ele = ele;
        }

        if options.indoor {
            let level = coordinate.level.unwrap_or(0);
            write_delta(&mut encoded, level, prev_level, index, Channel::Level)?;
            prev_level = level;
        }
    }

    Ok(encoded)
}

fn to_fixed(value: f64, factor: f64, index: usize, channel: Channel) -> Result<i64, EncodeError> {
    let scaled = (value * factor).round();
    if !scaled.is_finite() {
        return Err(EncodeError::NonFinite { index, channel });
    }
    if scaled.abs() > MAX_DELTA as f64 {
        return Err(EncodeError::DeltaTooLarge { index, channel });
    }
    Ok(scaled as i64)
}

fn write_delta(out: &mut String, value: i64, prev: i64, index: usize, channel: Channel) -> Result<(), EncodeError> {
    let delta = value
        .checked_sub(prev)
        .filter(|delta| (MIN_DELTA..=MAX_DELTA).contains(delta))
        .ok_or(EncodeError::DeltaTooLarge { index, channel })?;

    let mut zigzag = ((delta << 1) ^ (delta >> 63)) as u64;
    while zigzag >= CONTINUATION_BIT as u64 {
        out.push(char::from(((zigzag & CHUNK_MASK as u64) as u8 | CONTINUATION_BIT as u8) + CHAR_OFFSET));
        zigzag >>= 5;
    }
    out.push(char::from(zigzag as u8 + CHAR_OFFSET));
    Ok(())
}

/// Byte cursor over an encoded polyline.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn error(&self, kind: MalformedKind) -> MalformedEncodingError {
        MalformedEncodingError {
            offset: self.pos,
            kind,
        }
    }

    /// Reads one value group and returns the zigzag-decoded delta.
    fn read_delta(&mut self) -> Result<i64, MalformedEncodingError> {
        let mut result = 0_i64;
        let mut shift = 0_u32;
        let mut group_len = 0;

        loop {
            let byte = *self
                .bytes
                .get(self.pos)
                .ok_or_else(|| self.error(MalformedKind::Truncated))?;
            if !(b'?'..=b'~').contains(&byte) {
                return Err(self.error(MalformedKind::InvalidCharacter(byte)));
            }
            if group_len == MAX_GROUP_LEN {
                return Err(self.error(MalformedKind::Overflow));
            }
            self.pos += 1;
            group_len += 1;

            let chunk = i64::from(byte - CHAR_OFFSET);
            result |= (chunk & CHUNK_MASK) << shift;
            shift += 5;
            if chunk & CONTINUATION_BIT == 0 {
                break;
            }
        }

        Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
    }
}
