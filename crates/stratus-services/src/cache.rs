//! Async handle over [`WeatherStore`].
//!
//! SQLite calls are blocking, so every operation runs on the blocking pool
//! behind a shared mutex.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use stratus_weather::{CurrentWeatherSnapshot, ForecastSeries};

use crate::model::{Alert, CachedRecord, FavoritePlace};
use crate::store::WeatherStore;

#[derive(Clone)]
pub struct LocalCache {
    store: Arc<Mutex<WeatherStore>>,
}

impl LocalCache {
    pub fn new(store: WeatherStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` against the store on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&WeatherStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store.lock())).await?
    }

    pub async fn save_current_weather(&self, snapshot: CurrentWeatherSnapshot) -> Result<i64> {
        self.with_store(move |s| s.save_current_weather(&snapshot))
            .await
    }

    pub async fn latest_current_weather(
        &self,
    ) -> Result<Option<CachedRecord<CurrentWeatherSnapshot>>> {
        self.with_store(|s| s.latest_current_weather()).await
    }

    pub async fn current_weather_by_id(
        &self,
        id: i64,
    ) -> Result<Option<CachedRecord<CurrentWeatherSnapshot>>> {
        self.with_store(move |s| s.current_weather_by_id(id)).await
    }

    pub async fn last_weather_id(&self) -> Result<Option<i64>> {
        self.with_store(|s| s.last_weather_id()).await
    }

    pub async fn save_forecast(&self, series: ForecastSeries) -> Result<i64> {
        self.with_store(move |s| s.save_forecast(&series)).await
    }

    pub async fn latest_forecast(&self) -> Result<Option<CachedRecord<ForecastSeries>>> {
        self.with_store(|s| s.latest_forecast()).await
    }


    pub async fn list_favorites(&self) -> Result<Vec<FavoritePlace>> {
        self.with_store(|s| s.list_favorites()).await
    }

    pub async fn get_favorite(&self, id: i64) -> Result<Option<FavoritePlace>> {
        self.with_store(move |s| s.get_favorite(id)).await
    }

    pub async fn add_favorite(
        &self,
        latitude: f64,
        longitude: f64,
        name: String,
        city: String,
    ) -> Result<FavoritePlace> {
        self.with_store(move |s| s.add_favorite(latitude, longitude, &name, &city))
            .await
    }

    pub async fn delete_favorite(&self, id: i64) -> Result<bool> {
        self.with_store(move |s| s.delete_favorite(id)).await
    }

    pub async fn list_alerts(&self) -> Result<Vec<Alert>> {
        self.with_store(|s| s.list_alerts()).await
    }

    pub async fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        let id = id.to_string();
        self.with_store(move |s| s.get_alert(&id)).await
    }

    pub async fn add_alert(&self, alert: Alert) -> Result<()> {
        self.with_store(move |s| s.add_alert(&alert)).await
    }

    pub async fn update_alert(&self, alert: Alert) -> Result<bool> {
        self.with_store(move |s| s.update_alert(&alert)).await
    }

    pub async fn update_alert_status(&self, id: &str, is_active: bool) -> Result<bool> {
        let id = id.to_string();
        self.with_store(move |s| s.update_alert_status(&id, is_active))
            .await
    }

    pub async fn delete_alert(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.with_store(move |s| s.delete_alert(&id)).await
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.with_store(move |s| s.get_setting(&key)).await
    }

    pub async fn set_setting(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.with_store(move |s| s.set_setting(&key, &value)).await
    }

    pub async fn remove_setting(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.with_store(move |s| s.remove_setting(&key)).await
    }
}
