//! Geographic coordinate module
//!
//! Provides validated longitude/latitude pairs for radio endpoints and the
//! great-circle distance between them. Coordinates travel over the wire in
//! `[lng, lat]` order, matching GeoJSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors raised when validating coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (expected -90..=90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (expected -180..=180)")]
    InvalidLongitude(f64),
}

/// A validated geographic position.
///
/// Serializes as a two-element `[lng, lat]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct LngLat {
    lng: f64,
    lat: f64,
}

impl LngLat {
    /// Creates a position, rejecting out-of-range or non-finite values.
    pub fn new(lng: f64, lat: f64) -> Result<Self, CoordError> {
        if !lng.is_finite() || !(MIN_LON..=MAX_LON).contains(&lng) {
            return Err(CoordError::InvalidLongitude(lng));
        }
        if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Longitude in degrees.
    #[inline]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Latitude in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &LngLat) -> f64 {
        haversine_distance_m(self.lat, self.lng, other.lat, other.lng)
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

impl TryFrom<[f64; 2]> for LngLat {
    type Error = CoordError;

    fn try_from(value: [f64; 2]) -> Result<Self, Self::Error> {
        LngLat::new(value[0], value[1])
    }
}

impl std::fmt::Display for LngLat {
    /// Formats as `lng,lat`, the form used when building request keys.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lng, self.lat)
    }
}

/// Calculates the haversine distance between two points in meters.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a =
        (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}
