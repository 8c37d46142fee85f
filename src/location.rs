//! Route endpoint inputs.
//!
//! A [`LocationInput`] holds what was entered for one endpoint of a route:
//! free text, a `"lat,lng,level"` string or a structured coordinate. It is
//! either resolved to a concrete coordinate or unresolved, and it always
//! keeps a canonical string form in sync with that state.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, trace};

use crate::point::IndoorPoint;

/// Coordinates are kept with 6 decimal digits.
const PRECISION: f64 = 1e6;

/// Decides when a [`LocationInput`] counts as resolved.
///
/// The indoor UI needs a level for every endpoint before it can route, the
/// outdoor UI only needs the coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    pub require_level: bool,
}

impl ResolutionPolicy {
    /// Resolved only with coordinate and level. Canonical form `lat,lng,level`.
    pub const LEVEL_AWARE: Self = Self {
        require_level: true,
    };
    /// Resolved with a coordinate alone. Canonical form `lat,lng`.
    pub const LEVEL_FREE: Self = Self {
        require_level: false,
    };
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::LEVEL_AWARE
    }
}

/// A level exactly as it was supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    Integer(i64),
    Number(f64),
    Text(String),
    /// Any other JSON value, such as a boolean or an object.
    Raw(serde_json::Value),
}

impl Level {
    /// The level as an integer floor index, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Level::Integer(level) => Some(*level),
            Level::Number(level) if level.is_finite() && level.fract() == 0.0 => Some(*level as i64),
            Level::Number(_) => None,
            Level::Text(level) => level.trim().parse().ok(),
            Level::Raw(_) => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Integer(level) => write!(f, "{}", level),
            Level::Number(level) => write!(f, "{}", level),
            Level::Text(level) => f.write_str(level),
            Level::Raw(level) => write!(f, "{}", level),
        }
    }
}

impl From<i64> for Level {
    fn from(level: i64) -> Self {
        Level::Integer(level)
    }
}

impl From<&str> for Level {
    fn from(level: &str) -> Self {
        Level::Text(level.to_string())
    }
}

impl From<String> for Level {
    fn from(level: String) -> Self {
        Level::Text(level)
    }
}

/// A structured coordinate as handed over by a map click or a geocoder.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoordValue {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub level: Option<Level>,
}

impl CoordValue {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            level: None,
        }
    }

    pub fn with_level(self, level: impl Into<Level>) -> Self {
        Self {
            level: Some(level.into()),
            ..self
        }
    }
}

/// Any value a [`LocationInput`] can be assigned from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawValue")]
pub enum LocationValue {
    /// A delimited `"lat,lng,level"` string or free text.
    Text(String),
    Coord(CoordValue),
    /// Anything else; always unresolved.
    Unrecognized,
}

impl LocationValue {
    fn shape(&self) -> &'static str {
        match self {
            LocationValue::Text(_) => "text",
            LocationValue::Coord(_) => "coord",
            LocationValue::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    // Listed before `Coord` so arrays are not read as structs.
    List(Vec<IgnoredAny>),
    Coord(CoordValue),
    Other(IgnoredAny),
}

impl From<RawValue> for LocationValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Text(text) => LocationValue::Text(text),
            RawValue::Coord(coord) => LocationValue::Coord(coord),
            RawValue::List(_) | RawValue::Other(_) => LocationValue::Unrecognized,
        }
    }
}

impl From<&str> for LocationValue {
    fn from(text: &str) -> Self {
        LocationValue::Text(text.to_string())
    }
}

impl From<String> for LocationValue {
    fn from(text: String) -> Self {
        LocationValue::Text(text)
    }
}

impl From<CoordValue> for LocationValue {
    fn from(coord: CoordValue) -> Self {
        LocationValue::Coord(coord)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LocationState {
    #[default]
    Unresolved,
    Resolved {
        lat: f64,
        lng: f64,
        level: Option<Level>,
    },
}

impl LocationState {
    /// Builds the state for already rounded values, applying the resolution
    /// predicate of `policy`.
    fn resolve(lat: f64, lng: f64, level: Option<Level>, policy: ResolutionPolicy) -> Self {
        let has_level = level.is_some() || !policy.require_level;
        if lat.is_finite() && lng.is_finite() && has_level {
            LocationState::Resolved { lat, lng, level }
        } else {
            LocationState::Unresolved
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, LocationState::Resolved { .. })
    }
}

/// Normalizes `value` into a state under `policy`.
///
/// Coordinates are rounded to 6 decimals; levels are kept verbatim. A string
/// must have exactly three comma-separated fields, or two under a policy
/// that does not require a level.
pub fn normalize(value: &LocationValue, policy: ResolutionPolicy) -> LocationState {
    match value {
        LocationValue::Coord(coord) => LocationState::resolve(
            round(coord.lat.unwrap_or(f64::NAN)),
            round(coord.lng.unwrap_or(f64::NAN)),
            coord.level.clone(),
            policy,
        ),
        LocationValue::Text(text) => normalize_text(text, policy),
        LocationValue::Unrecognized => LocationState::Unresolved,
    }
}

fn normalize_text(text: &str, policy: ResolutionPolicy) -> LocationState {
    let fields: Vec<&str> = text.split(',').collect();
    match fields.as_slice() {
        [lat, lng, level] => LocationState::resolve(
            round(parse_float(lat)),
            round(parse_float(lng)),
            Some(Level::Text((*level).to_string())),
            policy,
        ),
        [lat, lng] if !policy.require_level => {
            LocationState::resolve(round(parse_float(lat)), round(parse_float(lng)), None, policy)
        }
        _ => LocationState::Unresolved,
    }
}

fn parse_float(field: &str) -> f64 {
    field.trim().parse().unwrap_or(f64::NAN)
}

/// Rounds to 6 decimals, halves toward positive infinity.
fn round(value: f64) -> f64 {
    (value * PRECISION + 0.5).floor() / PRECISION
}

/// One endpoint of a route.
///
/// Every mutation replaces the whole state, so the coordinate and level are
/// never partially cleared, and the canonical string is re-derived each time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "LocationValue")]
pub struct LocationInput {
    state: LocationState,
    policy: ResolutionPolicy,
    canonical: Option<String>,
}

impl LocationInput {
    /// Creates an input under the default, level-aware policy.
    pub fn new(value: impl Into<LocationValue>) -> Self {
        Self::with_policy(value, ResolutionPolicy::default())
    }

    pub fn with_policy(value: impl Into<LocationValue>, policy: ResolutionPolicy) -> Self {
        let mut input = Self {
            state: LocationState::Unresolved,
            policy,
            canonical: None,
        };
        input.set(value);
        input
    }

    /// Replaces the current state with the normalized `value`.
    pub fn set(&mut self, value: impl Into<LocationValue>) {
        let value = value.into();
        let state = normalize(&value, self.policy);
        debug!(
            shape = value.shape(),
            resolved = state.is_resolved(),
            "location input assigned"
        );
        self.replace(state);
    }

    /// Sets the coordinate, keeping the current level.
    ///
    /// Under a level-aware policy an unresolved input has no level to keep,
    /// so this alone cannot resolve it. Returns whether the input is resolved
    /// afterwards.
    pub fn set_coord(&mut self, lat: f64, lng: f64) -> bool {
        let level = self.level().cloned();
        let state = LocationState::resolve(round(lat), round(lng), level, self.policy);
        if !state.is_resolved() {
            trace!(lat, lng, "coordinate dropped, input stays unresolved");
        }
        self.replace(state);
        self.is_resolved()
    }

    /// Sets the level, keeping the current coordinate.
    ///
    /// An unresolved input has no coordinate to keep, so the level is
    /// dropped. Returns whether the input is resolved afterwards.
    pub fn set_level(&mut self, level: impl Into<Level>) -> bool {
        let level = level.into();
        let state = match &self.state {
            LocationState::Resolved { lat, lng, .. } => LocationState::resolve(*lat, *lng, Some(level), self.policy),
            LocationState::Unresolved => {
                trace!(%level, "level dropped, input has no coordinate");
                LocationState::Unresolved
            }
        };
        self.replace(state);
        self.is_resolved()
    }

    pub fn set_unresolved(&mut self) {
        self.replace(LocationState::Unresolved);
    }

    fn replace(&mut self, state: LocationState) {
        if !state.is_resolved() && self.state.is_resolved() {
            trace!("location input fell back to unresolved");
        }
        self.state = state;
        self.canonical = if self.policy.require_level {
            self.to_string_with_level()
        } else {
            self.to_string_without_level()
        };
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    pub fn state(&self) -> &LocationState {
        &self.state
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    pub fn lat(&self) -> Option<f64> {
        match self.state {
            LocationState::Resolved { lat, .. } => Some(lat),
            LocationState::Unresolved => None,
        }
    }

    pub fn lng(&self) -> Option<f64> {
        match self.state {
            LocationState::Resolved { lng, .. } => Some(lng),
            LocationState::Unresolved => None,
        }
    }

    pub fn level(&self) -> Option<&Level> {
        match &self.state {
            LocationState::Resolved { level, .. } => level.as_ref(),
            LocationState::Unresolved => None,
        }
    }

    /// The canonical string form under this input's policy.
    pub fn canonical(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    /// `lat,lng,level`, or `lat,lng` for a resolved input without a level.
    pub fn to_string_with_level(&self) -> Option<String> {
        match &self.state {
            LocationState::Resolved {
                lat,
                lng,
                level: Some(level),
            } => Some(format!("{},{},{}", lat, lng, level)),
            LocationState::Resolved { lat, lng, level: None } => Some(format!("{},{}", lat, lng)),
            LocationState::Unresolved => None,
        }
    }

    pub fn to_string_without_level(&self) -> Option<String> {
        match &self.state {
            LocationState::Resolved { lat, lng, .. } => Some(format!("{},{}", lat, lng)),
            LocationState::Unresolved => None,
        }
    }

    /// The strict point for a resolved input whose level is an integer
    /// floor index.
    pub fn to_indoor_point(&self) -> Option<IndoorPoint> {
        let LocationState::Resolved { lat, lng, level } = &self.state else {
            return None;
        };
        let level = i32::try_from(level.as_ref()?.as_integer()?).ok()?;
        Some(IndoorPoint::new(*lat, *lng, level))
    }
}

impl From<LocationValue> for LocationInput {
    fn from(value: LocationValue) -> Self {
        Self::new(value)
    }
}

impl From<&str> for LocationInput {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<CoordValue> for LocationInput {
    fn from(coord: CoordValue) -> Self {
        Self::new(coord)
    }
}

impl FromStr for LocationInput {
    type Err = Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(text))
    }
}

impl Serialize for LocationInput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.canonical.serialize(serializer)
    }
}
