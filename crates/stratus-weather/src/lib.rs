//! Weather domain for Stratus
//!
//! Provider types, unit conversion, forecast aggregation, coordinate
//! resolution and the remote/geocoding clients.

pub mod forecast;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;
pub mod units;

pub use forecast::{aggregate, ForecastViews};
pub use geocode::Geocoder;
pub use location::{get_coordinates, LocationSource, DEFAULT_COORDINATES};
pub use provider::{WeatherProvider, WeatherQuery, WeatherSource};
pub use types::*;
pub use units::{convert_current, convert_entry, Converted};
