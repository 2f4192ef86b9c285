//! Reverse geocoding: convert coordinates to a human-readable place name.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::types::{Coordinates, WeatherError};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "Stratus/0.1.0";

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimResponse {
    /// Most specific locality available, falling back to the display name.
    fn place_name(self) -> Option<String> {
        let from_address = self.address.and_then(|addr| {
            addr.city
                .or(addr.town)
                .or(addr.village)
                .or(addr.municipality)
                .or(addr.county)
                .or(addr.state)
                .or(addr.country)
        });
        from_address
            .or(self.display_name)
            .filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    endpoint: String,
}

impl Geocoder {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Reverse geocode to a city name (e.g. "Tokyo").
    /// Returns `None` on failure or timeout; the caller can fall back to its own label.
    pub async fn reverse(&self, coords: Coordinates) -> Option<String> {
        let response = match self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: NominatimResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let name = body.place_name()?;
        tracing::info!("Reverse geocoded {} to: {}", coords, name);
        Some(name)
    }
}
