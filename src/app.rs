use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use stratus_core::Config;
use stratus_services::{
    AlarmPlayer, AlertScheduler, LocalCache, LogNotifier, Notifier, UserSettings,
    WeatherRepository, WeatherStore,
};
use stratus_weather::{Coordinates, Geocoder, UnitSystem, WeatherProvider, WeatherQuery};

/// Composition root: owns every long-lived service for one process.
pub struct App {
    config: Arc<Config>,
    repository: WeatherRepository,
    scheduler: AlertScheduler,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let provider = WeatherProvider::new(
            &config.weather.base_url,
            Duration::from_secs(config.weather.timeout_secs),
        )?;
        let geocoder = Geocoder::new(config.weather.geocode_url.clone())?;

        let db_path = config.database_path();
        tracing::debug!("Opening store at {}", db_path.display());
        let cache = LocalCache::new(WeatherStore::new(&db_path)?);

        let repository = WeatherRepository::new(Arc::new(provider), cache).with_geocoder(geocoder);
        Ok(Self::with_repository(
            config,
            repository,
            Arc::new(LogNotifier::new(true)),
            AlarmPlayer::default(),
        ))
    }

    /// Assemble from prebuilt parts.
    pub fn with_repository(
        config: Config,
        repository: WeatherRepository,
        notifier: Arc<dyn Notifier>,
        alarm: AlarmPlayer,
    ) -> Self {
        let notifier: Arc<dyn Notifier> = if config.alerts.notification_permission {
            notifier
        } else {
            Arc::new(LogNotifier::new(false))
        };
        let scheduler = AlertScheduler::new(
            repository.clone(),
            notifier,
            alarm,
            config.weather.api_key.clone(),
            chrono::Duration::minutes(i64::from(config.alerts.snooze_minutes)),
        );

        Self {
            config: Arc::new(config),
            repository,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &WeatherRepository {
        &self.repository
    }

    pub fn cache(&self) -> &LocalCache {
        self.repository.local()
    }

    pub fn scheduler(&self) -> &AlertScheduler {
        &self.scheduler
    }

    pub async fn settings(&self) -> Result<UserSettings> {
        UserSettings::load(self.cache()).await
    }

    /// Query for `coords`. Always metric: stored data stays in Celsius and
    /// m/s, and is converted when rendered.
    pub fn query(&self, coords: Coordinates, settings: &UserSettings) -> WeatherQuery {
        WeatherQuery::new(coords, self.config.weather.api_key.clone())
            .with_units(UnitSystem::Metric)
            .with_language(settings.language)
    }

    pub fn shutdown(&self) {
        tracing::debug!("Shutting down");
        self.scheduler.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_services::RecordingNotifier;
    use stratus_weather::{Language, TemperatureUnit};

    fn app(config: Config) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let provider = WeatherProvider::new("http://127.0.0.1:9/", Duration::from_secs(1)).unwrap();
        let store = WeatherStore::new(dir.path().join("t.db")).unwrap();
        let repo = WeatherRepository::new(Arc::new(provider), LocalCache::new(store));
        let app = App::with_repository(
            config,
            repo,
            Arc::new(RecordingNotifier::new()),
            AlarmPlayer::default(),
        );
        (app, dir)
    }

    #[tokio::test]
    async fn test_query_is_always_metric() {
        let (app, _dir) = app(Config::default());
        UserSettings::set_temperature_unit(app.cache(), TemperatureUnit::Fahrenheit)
            .await
            .unwrap();
        UserSettings::set_language(app.cache(), Language::Arabic)
            .await
            .unwrap();

        let settings = app.settings().await.unwrap();
        let query = app.query(Coordinates::new(30.0444, 31.2357), &settings);
        assert_eq!(query.units, UnitSystem::Metric);
        assert_eq!(query.language, Language::Arabic);
    }

    #[tokio::test]
    async fn test_permission_off_skips_scheduling() {
        let mut config = Config::default();
        config.alerts.notification_permission = false;
        let (app, _dir) = app(config);

        let now = chrono::Utc::now();
        let (_, outcome) = app
            .scheduler()
            .create(
                stratus_services::AlarmStyle::Notification,
                now,
                now + chrono::Duration::hours(1),
            )
            .await
            .unwrap();
        assert!(!outcome.is_scheduled());
        app.shutdown();
    }
}
