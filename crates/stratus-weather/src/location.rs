//! Coordinate validation and resolution.
//!
//! A zero latitude or longitude means "never set" rather than a real point on
//! the equator or prime meridian.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{Coordinates, LocationError};

/// Fallback location (Cairo) used whenever stored coordinates are unusable.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates::new(30.0444, 31.2357);

/// Where the user's location comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    #[default]
    Gps,
    Map,
}

impl LocationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Map => "map",
        }
    }
}

impl FromStr for LocationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gps" => Ok(Self::Gps),
            "map" => Ok(Self::Map),
            other => Err(format!("unknown location source: {}", other)),
        }
    }
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Coordinates {
    /// In range, finite, and neither component is the zero sentinel.
    pub fn is_valid(&self) -> bool {
        let Coordinates {
            latitude,
            longitude,
        } = *self;
        latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
            && latitude != 0.0
            && longitude != 0.0
    }

    /// Build coordinates, rejecting anything [`is_valid`](Self::is_valid) refuses.
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        let coords = Self::new(latitude, longitude);
        if coords.is_valid() {
            Ok(coords)
        } else {
            Err(LocationError::InvalidCoordinates {
                latitude,
                longitude,
            })
        }
    }
}

/// Resolve a raw latitude/longitude pair, substituting [`DEFAULT_COORDINATES`]
/// when the pair is invalid or unset.
pub fn get_coordinates(latitude: f64, longitude: f64) -> Coordinates {
    match Coordinates::validated(latitude, longitude) {
        Ok(coords) => coords,
        Err(e) => {
            tracing::warn!("{}; using default location", e);
            DEFAULT_COORDINATES
        }
    }
}

/// Pick the coordinates to fetch for: an explicit override first, then the
/// stored location, then the default.
pub fn resolve(explicit: Option<Coordinates>, stored: Option<Coordinates>) -> Coordinates {
    if let Some(coords) = explicit.filter(Coordinates::is_valid) {
        return coords;
    }
    match stored {
        Some(c) => get_coordinates(c.latitude, c.longitude),
        None => {
            tracing::debug!("No stored location; using default");
            DEFAULT_COORDINATES
        }
    }
}
