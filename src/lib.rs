//! indoor-geometry
//!
//! Decoding of encoded route geometries with optional elevation and indoor
//! level channels, and normalization of route endpoint inputs.

pub mod polyline;
pub mod location;
pub mod point;
pub mod haversine;
