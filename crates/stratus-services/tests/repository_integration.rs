//! Repository behaviour against a stub remote and a real SQLite store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stratus_services::{LocalCache, WeatherRepository, WeatherStore};
use stratus_weather::{
    Condition, Coordinates, CurrentWeatherSnapshot, ForecastSeries, GeoPoint, MainReadings,
    WeatherError, WeatherProvider, WeatherQuery, WeatherSource,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn london() -> CurrentWeatherSnapshot {
    CurrentWeatherSnapshot {
        coord: GeoPoint {
            lat: 51.5085,
            lon: -0.1257,
        },
        weather: vec![Condition {
            id: 800,
            main: "Clear".into(),
            description: "clear sky".into(),
            icon: "01d".into(),
        }],
        base: "stations".into(),
        main: MainReadings {
            temp: 20.0,
            feels_like: 19.5,
            temp_min: 19.0,
            temp_max: 21.0,
            pressure: 1012,
            humidity: 60,
            ..Default::default()
        },
        visibility: 10000,
        wind: Default::default(),
        clouds: Default::default(),
        dt: 1_627_040_400,
        sys: Default::default(),
        timezone: 3600,
        id: 2_643_743,
        name: "London".into(),
        cod: 200,
    }
}

/// Serves London until told to fail.
#[derive(Default)]
struct StubSource {
    failing: std::sync::atomic::AtomicBool,
    calls: AtomicUsize,
}

#[async_trait]
impl WeatherSource for StubSource {
    async fn current_weather(
        &self,
        _query: &WeatherQuery,
    ) -> Result<CurrentWeatherSnapshot, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(WeatherError::Api {
                status: 503,
                message: "down".into(),
            });
        }
        Ok(london())
    }

    async fn hourly_forecast(&self, _query: &WeatherQuery) -> Result<ForecastSeries, WeatherError> {
        Err(WeatherError::Api {
            status: 503,
            message: "down".into(),
        })
    }
}

fn repository(source: Arc<StubSource>) -> WeatherRepository {
    WeatherRepository::new(source, LocalCache::new(WeatherStore::in_memory().unwrap()))
}

fn london_query() -> WeatherQuery {
    WeatherQuery::new(Coordinates::new(51.5085, -0.1257), "key")
}

#[tokio::test]
async fn test_fetch_writes_through_to_cache() {
    let repo = repository(Arc::new(StubSource::default()));

    let snapshot = repo.get_current_weather(&london_query()).await.unwrap();
    assert_eq!(snapshot.name, "London");

    let latest_id = repo.last_weather_id().await.unwrap().unwrap();
    let cached = repo.current_weather_by_id(latest_id).await.unwrap().unwrap();
    assert_eq!(cached.data.name, "London");
    assert_eq!(cached.data.main.temp, 20.0);
}

#[tokio::test]
async fn test_failure_leaves_cache_for_fallback() {
    let source = Arc::new(StubSource::default());
    let repo = repository(source.clone());

    repo.get_current_weather(&london_query()).await.unwrap();
    source.failing.store(true, Ordering::SeqCst);

    let err = repo.get_current_weather(&london_query()).await.unwrap_err();
    assert!(matches!(err, WeatherError::Api { status: 503, .. }));

    let cached = repo.get_current_weather_local().await.unwrap().unwrap();
    assert_eq!(cached.data.name, "London");
    assert!(repo.get_hourly_forecast_local().await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_reads_never_call_remote() {
    let source = Arc::new(StubSource::default());
    let repo = repository(source.clone());

    assert!(repo.get_current_weather_local().await.unwrap().is_none());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_peek_leaves_cache_untouched() {
    let source = Arc::new(StubSource::default());
    let repo = repository(source.clone());

    let snapshot = repo.peek_current_weather(&london_query()).await.unwrap();
    assert_eq!(snapshot.name, "London");
    assert!(repo.peek_hourly_forecast(&london_query()).await.is_err());

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(repo.get_current_weather_local().await.unwrap().is_none());
    assert!(repo.get_hourly_forecast_local().await.unwrap().is_none());
}

#[tokio::test]
async fn test_favorite_add_then_delete() {
    let repo = repository(Arc::new(StubSource::default()));

    let place = repo
        .add_favorite_place(
            Coordinates::new(35.6895, 139.6917),
            "Tokyo",
            Some("Tokyo".into()),
        )
        .await
        .unwrap();

    let places = repo.favorite_places().await.unwrap();
    assert_eq!(places.len(), 1);
    assert_eq!(places[0].name, "Tokyo");

    assert!(repo.delete_favorite_place(place.id).await.unwrap());
    assert!(repo.favorite_places().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_favorite_city_from_geocoder() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "city": "Shibuya" }
        })))
        .mount(&mock_server)
        .await;

    let geocoder =
        stratus_weather::Geocoder::new(format!("{}/reverse", mock_server.uri())).unwrap();
    let repo = repository(Arc::new(StubSource::default())).with_geocoder(geocoder);

    let place = repo
        .add_favorite_place(Coordinates::new(35.66, 139.70), "Work", None)
        .await
        .unwrap();
    assert_eq!(place.city, "Shibuya");

    let repo = repository(Arc::new(StubSource::default()));
    let place = repo
        .add_favorite_place(Coordinates::new(35.66, 139.70), "Home", None)
        .await
        .unwrap();
    assert_eq!(place.city, "Home");
}

#[tokio::test]
async fn test_real_provider_against_mock_server() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::to_value(london()).unwrap()))
        .mount(&mock_server)
        .await;

    let provider = WeatherProvider::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = WeatherStore::new(dir.path().join("stratus.db")).unwrap();
    let repo = WeatherRepository::new(Arc::new(provider), LocalCache::new(store));

    let snapshot = repo.get_current_weather(&london_query()).await.unwrap();
    assert_eq!(snapshot.name, "London");
    assert_eq!(
        repo.get_current_weather_local().await.unwrap().unwrap().data,
        snapshot
    );
}
