//! Remote + local composition.
//!
//! Successful fetches are written through to the local cache before they are
//! returned. Cache reads never touch the network.

use std::sync::Arc;

use anyhow::Result;
use stratus_weather::{
    Coordinates, CurrentWeatherSnapshot, ForecastSeries, Geocoder, WeatherError, WeatherQuery,
    WeatherSource,
};

use crate::cache::LocalCache;
use crate::model::{Alert, CachedRecord, FavoritePlace};

#[derive(Clone)]
pub struct WeatherRepository {
    remote: Arc<dyn WeatherSource>,
    local: LocalCache,
    geocoder: Option<Geocoder>,
}

impl WeatherRepository {
    pub fn new(remote: Arc<dyn WeatherSource>, local: LocalCache) -> Self {
        Self {
            remote,
            local,
            geocoder: None,
        }
    }

    /// Resolve city names for new favorites through `geocoder`.
    pub fn with_geocoder(mut self, geocoder: Geocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    /// Fetch current weather and replace the cached copy.
    ///
    /// A failed cache write is logged; the fetched data is still returned.
    pub async fn get_current_weather(
        &self,
        query: &WeatherQuery,
    ) -> Result<CurrentWeatherSnapshot, WeatherError> {
        let snapshot = self.remote.current_weather(query).await?;

        match self.local.save_current_weather(snapshot.clone()).await {
            Ok(id) => tracing::debug!("Current weather for {} cached as {}", snapshot.name, id),
            Err(e) => tracing::warn!("Failed to cache current weather: {:#}", e),
        }

        Ok(snapshot)
    }

    /// Fetch the hourly forecast and replace the cached copy.
    pub async fn get_hourly_forecast(
        &self,
        query: &WeatherQuery,
    ) -> Result<ForecastSeries, WeatherError> {
        let series = self.remote.hourly_forecast(query).await?;

        match self.local.save_forecast(series.clone()).await {
            Ok(id) => tracing::debug!("Forecast ({} entries) cached as {}", series.list.len(), id),
            Err(e) => tracing::warn!("Failed to cache forecast: {:#}", e),
        }

        Ok(series)
    }

    /// Fetch without writing to the cache (favorite details).
    pub async fn peek_current_weather(
        &self,
        query: &WeatherQuery,
    ) -> Result<CurrentWeatherSnapshot, WeatherError> {
        self.remote.current_weather(query).await
    }

    pub async fn peek_hourly_forecast(
        &self,
        query: &WeatherQuery,
    ) -> Result<ForecastSeries, WeatherError> {
        self.remote.hourly_forecast(query).await
    }

    pub async fn get_current_weather_local(
        &self,
    ) -> Result<Option<CachedRecord<CurrentWeatherSnapshot>>> {
        self.local.latest_current_weather().await
    }

    pub async fn get_hourly_forecast_local(&self) -> Result<Option<CachedRecord<ForecastSeries>>> {
        self.local.latest_forecast().await
    }

    pub async fn last_weather_id(&self) -> Result<Option<i64>> {
        self.local.last_weather_id().await
    }

    pub async fn current_weather_by_id(
        &self,
        id: i64,
    ) -> Result<Option<CachedRecord<CurrentWeatherSnapshot>>> {
        self.local.current_weather_by_id(id).await
    }

    // ---- favorites ----

    pub async fn favorite_places(&self) -> Result<Vec<FavoritePlace>> {
        self.local.list_favorites().await
    }

    pub async fn favorite_place(&self, id: i64) -> Result<Option<FavoritePlace>> {
        self.local.get_favorite(id).await
    }

    /// Save a favorite. Without a city, one is looked up by reverse
    /// geocoding, falling back to `name`.
    pub async fn add_favorite_place(
        &self,
        coords: Coordinates,
        name: &str,
        city: Option<String>,
    ) -> Result<FavoritePlace> {
        let city = match city {
            Some(city) => city,
            None => match &self.geocoder {
                Some(geocoder) => geocoder.reverse(coords).await,
                None => None,
            }
            .unwrap_or_else(|| name.to_string()),
        };

        let place = self
            .local
            .add_favorite(coords.latitude, coords.longitude, name.to_string(), city)
            .await?;
        tracing::info!("Added favorite {} ({})", place.name, place.id);
        Ok(place)
    }

    pub async fn delete_favorite_place(&self, id: i64) -> Result<bool> {
        self.local.delete_favorite(id).await
    }

    // ---- alerts ----

    pub async fn alerts(&self) -> Result<Vec<Alert>> {
        self.local.list_alerts().await
    }

    pub async fn alert(&self, id: &str) -> Result<Option<Alert>> {
        self.local.get_alert(id).await
    }

    pub async fn add_alert(&self, alert: Alert) -> Result<()> {
        self.local.add_alert(alert).await
    }

    pub async fn update_alert(&self, alert: Alert) -> Result<bool> {
        self.local.update_alert(alert).await
    }

    pub async fn update_alert_status(&self, id: &str, is_active: bool) -> Result<bool> {
        self.local.update_alert_status(id, is_active).await
    }

    pub async fn delete_alert(&self, id: &str) -> Result<bool> {
        self.local.delete_alert(id).await
    }
}
