//! Route endpoint normalization tests.

use pretty_assertions::assert_eq;
use test_log::test;

use indoor_geometry::location::{CoordValue, Level, LocationInput, LocationState, LocationValue, ResolutionPolicy};
use indoor_geometry::point::IndoorPoint;

#[test]
fn resolves_delimited_string() {
    let input = LocationInput::new("48.1,11.5,2");

    assert!(input.is_resolved());
    assert_eq!(input.to_string_with_level().as_deref(), Some("48.1,11.5,2"));
    assert_eq!(input.canonical(), Some("48.1,11.5,2"));
    assert_eq!(input.to_string_without_level().as_deref(), Some("48.1,11.5"));
}

#[test]
fn two_fields_are_unresolved_when_level_aware() {
    let input = LocationInput::new("48.1,11.5");

    assert!(!input.is_resolved());
    assert_eq!(input.to_string_with_level(), None);
    assert_eq!(input.to_string_without_level(), None);
    assert_eq!(input.canonical(), None);
}

#[test]
fn two_fields_resolve_when_level_free() {
    let input = LocationInput::with_policy("48.1,11.5", ResolutionPolicy::LEVEL_FREE);

    assert!(input.is_resolved());
    assert_eq!(input.level(), None);
    assert_eq!(input.canonical(), Some("48.1,11.5"));
    assert_eq!(input.to_string_with_level().as_deref(), Some("48.1,11.5"));
}

#[test]
fn level_free_canonical_drops_level() {
    let input = LocationInput::with_policy("48.1,11.5,2", ResolutionPolicy::LEVEL_FREE);

    assert_eq!(input.canonical(), Some("48.1,11.5"));
    assert_eq!(input.to_string_with_level().as_deref(), Some("48.1,11.5,2"));
}

#[test]
fn rounds_structured_coordinates() {
    let input = LocationInput::with_policy(CoordValue::new(48.123456789, 11.1), ResolutionPolicy::LEVEL_FREE);

    assert_eq!(input.lat(), Some(48.123457));
    assert_eq!(input.lng(), Some(11.1));
}

#[test]
fn structured_coordinate_needs_level_when_level_aware() {
    let without_level = LocationInput::new(CoordValue::new(48.123456789, 11.1));
    assert!(!without_level.is_resolved());
    assert_eq!(without_level.lat(), None);

    let with_level = LocationInput::new(CoordValue::new(48.123456789, 11.1).with_level(-1_i64));
    assert!(with_level.is_resolved());
    assert_eq!(with_level.lat(), Some(48.123457));
    assert_eq!(with_level.level(), Some(&Level::Integer(-1)));
    assert_eq!(with_level.canonical(), Some("48.123457,11.1,-1"));
}

#[test]
fn set_is_idempotent() {
    let mut input = LocationInput::new("48.1,11.5,2");
    let first_state = input.state().clone();
    let first_canonical = input.canonical().map(str::to_string);

    input.set("48.1,11.5,2");

    assert_eq!(input.state(), &first_state);
    assert_eq!(input.canonical().map(str::to_string), first_canonical);
}

#[test]
fn unresolve_clears_everything_at_once() {
    let mut input = LocationInput::new("48.1,11.5,2");

    input.set_unresolved();

    assert_eq!(input.state(), &LocationState::Unresolved);
    assert_eq!((input.lat(), input.lng(), input.level()), (None, None, None));
    assert_eq!(input.canonical(), None);
}

#[test]
fn failed_assignment_replaces_resolved_state() {
    let mut input = LocationInput::new("48.1,11.5,2");

    input.set("Marienplatz");

    assert!(!input.is_resolved());
    assert_eq!((input.lat(), input.lng(), input.level()), (None, None, None));
    assert_eq!(input.canonical(), None);
}

#[test]
fn set_coord_keeps_level() {
    let mut input = LocationInput::new("48.1,11.5,2");

    assert!(input.set_coord(48.20000049, 11.6));

    assert_eq!(input.lat(), Some(48.2));
    assert_eq!(input.level(), Some(&Level::Text("2".to_string())));
    assert_eq!(input.canonical(), Some("48.2,11.6,2"));
}

#[test]
fn set_coord_alone_cannot_resolve_when_level_aware() {
    let mut input = LocationInput::new("Marienplatz");

    assert!(!input.set_coord(48.1, 11.5));
    assert!(!input.is_resolved());
    assert_eq!(input.lat(), None);
}

#[test]
fn set_coord_resolves_when_level_free() {
    let mut input = LocationInput::with_policy("Marienplatz", ResolutionPolicy::LEVEL_FREE);

    assert!(input.set_coord(48.1, 11.5));
    assert!(input.is_resolved());
    assert_eq!(input.canonical(), Some("48.1,11.5"));
}

#[test]
fn set_level_rederives_canonical() {
    let mut input = LocationInput::new("48.1,11.5,2");

    assert!(input.set_level(-1_i64));

    assert_eq!(input.canonical(), Some("48.1,11.5,-1"));
}

#[test]
fn piecewise_updates_report_resolution() {
    let mut input = LocationInput::new("Marienplatz");

    assert!(!input.set_level("2"));
    assert!(!input.set_coord(48.1, 11.5));
    assert_eq!((input.lat(), input.lng(), input.level()), (None, None, None));

    input.set(CoordValue::new(48.1, 11.5).with_level("2"));
    assert!(input.set_level("3"));
    assert_eq!(input.canonical(), Some("48.1,11.5,3"));
}

#[test]
fn odd_json_levels_pass_through() {
    let flag: LocationInput = serde_json::from_str(r#"{"lat": 48.1, "lng": 11.5, "level": true}"#).unwrap();
    assert!(flag.is_resolved());
    assert_eq!(flag.canonical(), Some("48.1,11.5,true"));
    assert_eq!(flag.to_indoor_point(), None);

    let object: LocationInput = serde_json::from_str(r#"{"lat": 48.1, "lng": 11.5, "level": {"name": "U1"}}"#).unwrap();
    assert!(object.is_resolved());
    assert_eq!(object.canonical(), Some(r#"48.1,11.5,{"name":"U1"}"#));
}

#[test]
fn non_numeric_level_passes_through() {
    let input = LocationInput::new("48.1,11.5,EG");

    assert!(input.is_resolved());
    assert_eq!(input.canonical(), Some("48.1,11.5,EG"));
    assert_eq!(input.to_indoor_point(), None);
}

#[test]
fn converts_to_indoor_point() {
    let input = LocationInput::new("48.1,11.5,2");

    assert_eq!(input.to_indoor_point(), Some(IndoorPoint::new(48.1, 11.5, 2)));
    assert_eq!(LocationInput::new("48.1,11.5").to_indoor_point(), None);
}

#[test]
fn parses_from_str() {
    let input: LocationInput = "48.1,11.5,0".parse().unwrap();
    assert_eq!(input.canonical(), Some("48.1,11.5,0"));
}

#[test]
fn deserializes_from_string_or_object() {
    let from_text: LocationInput = serde_json::from_str(r#""48.1,11.5,2""#).unwrap();
    assert_eq!(from_text.canonical(), Some("48.1,11.5,2"));

    let from_object: LocationInput = serde_json::from_str(r#"{"lat": 48.1, "lng": 11.5, "level": 2}"#).unwrap();
    assert_eq!(from_object.level(), Some(&Level::Integer(2)));
    assert_eq!(from_object.canonical(), Some("48.1,11.5,2"));

    let text_level: LocationInput = serde_json::from_str(r#"{"lat": 48.1, "lng": 11.5, "level": "U1"}"#).unwrap();
    assert_eq!(text_level.canonical(), Some("48.1,11.5,U1"));
}

#[test]
fn deserializes_other_shapes_as_unresolved() {
    for json in ["42", "null", "true", "[48.1, 11.5, 2]", r#"{"lng": 11.5, "level": 0}"#] {
        let value: LocationValue = serde_json::from_str(json).unwrap();
        let input = LocationInput::from(value);
        assert!(!input.is_resolved(), "{} should not resolve", json);
    }

    let value: LocationValue = serde_json::from_str("[48.1, 11.5, 2]").unwrap();
    assert_eq!(value, LocationValue::Unrecognized);
}

#[test]
fn serializes_canonical_string() {
    let resolved = LocationInput::new("48.1,11.5,2");
    assert_eq!(serde_json::to_string(&resolved).unwrap(), r#""48.1,11.5,2""#);

    let unresolved = LocationInput::new("Marienplatz");
    assert_eq!(serde_json::to_string(&unresolved).unwrap(), "null");
}
