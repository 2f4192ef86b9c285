//! Integration tests for WeatherProvider and Geocoder using wiremock.

use std::time::Duration;

use stratus_weather::{
    Coordinates, Geocoder, Language, UnitSystem, WeatherError, WeatherProvider, WeatherQuery,
    WeatherSource,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn london_current() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1257, "lat": 51.5085 },
        "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "base": "stations",
        "main": {
            "temp": 20.0, "feels_like": 19.71, "temp_min": 19.0, "temp_max": 21.0,
            "pressure": 1012, "humidity": 60
        },
        "visibility": 10000,
        "wind": { "speed": 3.6, "deg": 200, "gust": 5.1 },
        "clouds": { "all": 0 },
        "dt": 1627040400,
        "sys": { "country": "GB", "sunrise": 1627014875, "sunset": 1627071392 },
        "timezone": 3600,
        "id": 2643743,
        "name": "London",
        "cod": 200
    })
}

fn london_forecast() -> serde_json::Value {
    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": 2,
        "list": [
            {
                "dt": 1627040400,
                "main": { "temp": 25.4, "feels_like": 25.8, "temp_min": 25.4, "temp_max": 25.41,
                          "pressure": 1013, "humidity": 87, "temp_kf": 0.01 },
                "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
                "clouds": { "all": 75 },
                "wind": { "speed": 4.12, "deg": 240, "gust": 7.2 },
                "visibility": 10000,
                "pop": 0.2,
                "sys": { "pod": "d" },
                "dt_txt": "2021-07-23 15:00:00"
            },
            {
                "dt": 1627051200,
                "main": { "temp": 22.1 },
                "dt_txt": "2021-07-23 18:00:00"
            }
        ],
        "city": {
            "id": 2643743, "name": "London", "coord": { "lat": 51.5085, "lon": -0.1257 },
            "country": "GB", "population": 1000000, "timezone": 3600,
            "sunrise": 1627014875, "sunset": 1627071392
        }
    })
}

fn query() -> WeatherQuery {
    WeatherQuery::new(Coordinates::new(51.5085, -0.1257), "test-key")
}

async fn provider(server: &MockServer) -> WeatherProvider {
    WeatherProvider::new(&format!("{}/data/2.5", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_current_weather_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "51.5085"))
        .and(query_param("lon", "-0.1257"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .mount(&mock_server)
        .await;

    let snapshot = provider(&mock_server).await.current_weather(&query()).await.unwrap();

    assert_eq!(snapshot.name, "London");
    assert_eq!(snapshot.description(), Some("clear sky"));
    assert_eq!(snapshot.wind.gust, Some(5.1));
}

#[tokio::test]
async fn test_forecast_passes_units_and_language() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast/hourly"))
        .and(query_param("units", "imperial"))
        .and(query_param("lang", "ar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_forecast()))
        .mount(&mock_server)
        .await;

    let q = query()
        .with_units(UnitSystem::Imperial)
        .with_language(Language::Arabic);
    let series = provider(&mock_server).await.hourly_forecast(&q).await.unwrap();

    assert_eq!(series.list.len(), 2);
    assert_eq!(series.city.name, "London");
    assert_eq!(series.list[0].dt_txt, "2021-07-23 15:00:00");
    assert_eq!(series.list[1].weather.len(), 0);
}

#[tokio::test]
async fn test_api_error_is_typed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&mock_server)
        .await;

    let err = provider(&mock_server).await.current_weather(&query()).await.unwrap_err();

    match err {
        WeatherError::Api { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"unexpected\": true}"))
        .mount(&mock_server)
        .await;

    let err = provider(&mock_server).await.current_weather(&query()).await.unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn test_reverse_geocode_city() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "35.6895"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "city": "Tokyo", "country": "Japan" },
            "display_name": "Tokyo, Japan"
        })))
        .mount(&mock_server)
        .await;

    let geocoder = Geocoder::new(format!("{}/reverse", mock_server.uri())).unwrap();
    let name = geocoder.reverse(Coordinates::new(35.6895, 139.6917)).await;

    assert_eq!(name.as_deref(), Some("Tokyo"));
}

#[tokio::test]
async fn test_reverse_geocode_server_error_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let geocoder = Geocoder::new(format!("{}/reverse", mock_server.uri())).unwrap();
    assert_eq!(geocoder.reverse(Coordinates::new(35.6895, 139.6917)).await, None);
}
