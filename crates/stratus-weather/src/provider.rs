//! OpenWeather-compatible HTTP client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::types::{
    Coordinates, CurrentWeatherSnapshot, ForecastSeries, Language, UnitSystem, WeatherError,
};

const CURRENT_PATH: &str = "weather";
const FORECAST_PATH: &str = "forecast/hourly";

/// Parameters shared by both read endpoints
#[derive(Debug, Clone)]
pub struct WeatherQuery {
    pub coordinates: Coordinates,
    pub api_key: String,
    pub units: UnitSystem,
    pub language: Language,
}

impl WeatherQuery {
    pub fn new(coordinates: Coordinates, api_key: impl Into<String>) -> Self {
        Self {
            coordinates,
            api_key: api_key.into(),
            units: UnitSystem::Metric,
            language: Language::English,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    fn params(&self) -> [(&'static str, String); 5] {
        [
            ("lat", self.coordinates.latitude.to_string()),
            ("lon", self.coordinates.longitude.to_string()),
            ("appid", self.api_key.clone()),
            ("units", self.units.query_value().to_string()),
            ("lang", self.language.code().to_string()),
        ]
    }
}

/// Anything that can answer "current" and "forecast" queries.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(
        &self,
        query: &WeatherQuery,
    ) -> Result<CurrentWeatherSnapshot, WeatherError>;

    async fn hourly_forecast(&self, query: &WeatherQuery) -> Result<ForecastSeries, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: Url,
}

impl WeatherProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        // Url::join drops the last path segment unless it ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| WeatherError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &WeatherQuery,
    ) -> Result<T, WeatherError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| WeatherError::InvalidUrl(e.to_string()))?;

        tracing::debug!(
            "GET {} lat={} lon={} units={} lang={}",
            url,
            query.coordinates.latitude,
            query.coordinates.longitude,
            query.units.query_value(),
            query.language.code()
        );

        let response = self.client.get(url).query(&query.params()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API call to {} failed: {}", path, status);
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn current_weather(
        &self,
        query: &WeatherQuery,
    ) -> Result<CurrentWeatherSnapshot, WeatherError> {
        self.get_json(CURRENT_PATH, query).await
    }

    async fn hourly_forecast(&self, query: &WeatherQuery) -> Result<ForecastSeries, WeatherError> {
        self.get_json(FORECAST_PATH, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let provider =
            WeatherProvider::new("https://example.com/data/2.5", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.base_url().as_str(), "https://example.com/data/2.5/");
        assert_eq!(
            provider.base_url().join(FORECAST_PATH).unwrap().as_str(),
            "https://example.com/data/2.5/forecast/hourly"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = WeatherProvider::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidUrl(_)));
    }

    #[test]
    fn test_query_params() {
        let q = WeatherQuery::new(Coordinates::new(51.5085, -0.1257), "key")
            .with_language(Language::Arabic)
            .with_units(UnitSystem::Imperial);
        let params = q.params();
        assert_eq!(params[0], ("lat", "51.5085".to_string()));
        assert_eq!(params[3], ("units", "imperial".to_string()));
        assert_eq!(params[4], ("lang", "ar".to_string()));
    }
}
