use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Temperature unit preference.
///
/// Stored values are always Celsius; this only controls rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
            Self::Kelvin => "kelvin",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
            Self::Kelvin => "K",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "celsius" | "c" => Ok(Self::Celsius),
            "fahrenheit" | "f" => Ok(Self::Fahrenheit),
            "kelvin" | "k" => Ok(Self::Kelvin),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wind speed unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WindSpeedUnit {
    #[default]
    #[serde(rename = "m/s")]
    MetersPerSecond,
    #[serde(rename = "mph")]
    MilesPerHour,
}

impl WindSpeedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetersPerSecond => "m/s",
            Self::MilesPerHour => "mph",
        }
    }
}

impl FromStr for WindSpeedUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m/s" | "mps" | "ms" => Ok(Self::MetersPerSecond),
            "mph" => Ok(Self::MilesPerHour),
            other => Err(format!("unknown wind speed unit: {}", other)),
        }
    }
}

impl fmt::Display for WindSpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit system understood by the remote provider (`units` query parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl UnitSystem {
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }
}

/// Display language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Arabic,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Arabic => "arabic",
        }
    }

    /// Two-letter code sent to the provider
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Arabic => "ar",
        }
    }

    /// Guess the language from a POSIX locale string such as `ar_EG.UTF-8`.
    pub fn from_locale(locale: &str) -> Self {
        if locale.to_ascii_lowercase().starts_with("ar") {
            Self::Arabic
        } else {
            Self::English
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "arabic" | "ar" => Ok(Self::Arabic),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

/// A (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Coordinate pair as the provider spells it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Weather condition (code, group, description, icon)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Condition {
    pub id: i64,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Temperature, pressure and humidity block. Temperatures in Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    #[serde(default)]
    pub pressure: i64,
    #[serde(default)]
    pub humidity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sea_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grnd_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_kf: Option<f64>,
}

/// Wind block. Speeds in m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Clouds {
    #[serde(default)]
    pub all: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CurrentSys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// One point-in-time observation from the "current weather" endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherSnapshot {
    pub coord: GeoPoint,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub base: String,
    pub main: MainReadings,
    #[serde(default)]
    pub visibility: i64,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    pub dt: i64,
    #[serde(default)]
    pub sys: CurrentSys,
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cod: i64,
}

impl CurrentWeatherSnapshot {
    /// Description of the primary condition, if the provider sent one.
    pub fn description(&self) -> Option<&str> {
        self.weather
            .first()
            .map(|c| c.description.as_str())
            .filter(|d| !d.is_empty())
    }
}

/// Part-of-day marker on forecast entries ("d" / "n")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ForecastSys {
    #[serde(default)]
    pub pod: String,
}

/// One 3-hour forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub clouds: Clouds,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub visibility: i64,
    /// Probability of precipitation, 0.0..=1.0
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub sys: ForecastSys,
    /// Local timestamp formatted as `YYYY-MM-DD HH:MM:SS`
    pub dt_txt: String,
}

impl ForecastEntry {
    /// Grouping key: the date portion of `dt_txt`.
    pub fn date_key(&self) -> Option<&str> {
        self.dt_txt.get(..10)
    }

    /// Hour of day parsed from `dt_txt`.
    pub fn hour(&self) -> Option<u32> {
        self.dt_txt.get(11..13)?.parse().ok()
    }
}

/// Place metadata attached to a forecast series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct City {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coord: GeoPoint,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub population: i64,
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// Ordered 3-hour forecast entries plus the originating place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    #[serde(default)]
    pub cod: String,
    #[serde(default)]
    pub message: f64,
    #[serde(default)]
    pub cnt: i64,
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
    #[serde(default)]
    pub city: City,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Invalid coordinates: lat={latitude}, lon={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Cache error: {0}")]
    Cache(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_json() -> serde_json::Value {
        serde_json::json!({
            "coord": { "lon": -0.1257, "lat": 51.5085 },
            "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "base": "stations",
            "main": {
                "temp": 20.0, "feels_like": 19.71, "temp_min": 19.0, "temp_max": 21.0,
                "pressure": 1012, "humidity": 60, "sea_level": 1012, "grnd_level": 1008
            },
            "visibility": 10000,
            "wind": { "speed": 3.6, "deg": 200 },
            "clouds": { "all": 0 },
            "dt": 1627040400,
            "sys": { "type": 1, "id": 1414, "country": "GB", "sunrise": 1627014875, "sunset": 1627071392 },
            "timezone": 3600,
            "id": 2643743,
            "name": "London",
            "cod": 200
        })
    }

    #[test]
    fn test_current_snapshot_deserializes_provider_shape() {
        let snapshot: CurrentWeatherSnapshot = serde_json::from_value(current_json()).unwrap();
        assert_eq!(snapshot.name, "London");
        assert_eq!(snapshot.description(), Some("clear sky"));
        assert_eq!(snapshot.wind.gust, None);
        assert_eq!(snapshot.sys.country.as_deref(), Some("GB"));
    }

    #[test]
    fn test_description_missing_when_no_conditions() {
        let mut json = current_json();
        json["weather"] = serde_json::json!([]);
        let snapshot: CurrentWeatherSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.description(), None);
    }

    #[test]
    fn test_forecast_entry_date_and_hour() {
        let entry: ForecastEntry = serde_json::from_value(serde_json::json!({
            "dt": 1627040400,
            "main": { "temp": 25.4 },
            "dt_txt": "2021-07-23 15:00:00"
        }))
        .unwrap();
        assert_eq!(entry.date_key(), Some("2021-07-23"));
        assert_eq!(entry.hour(), Some(15));
    }

    #[test]
    fn test_forecast_entry_short_timestamp() {
        let entry: ForecastEntry = serde_json::from_value(serde_json::json!({
            "dt": 0,
            "main": { "temp": 1.0 },
            "dt_txt": "bogus"
        }))
        .unwrap();
        assert_eq!(entry.date_key(), None);
        assert_eq!(entry.hour(), None);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("Fahrenheit".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!("mph".parse::<WindSpeedUnit>(), Ok(WindSpeedUnit::MilesPerHour));
        assert!("rankine".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn test_wind_unit_serde_names() {
        let json = serde_json::to_string(&WindSpeedUnit::MetersPerSecond).unwrap();
        assert_eq!(json, "\"m/s\"");
    }

    #[test]
    fn test_language_from_locale() {
        assert_eq!(Language::from_locale("ar_EG.UTF-8"), Language::Arabic);
        assert_eq!(Language::from_locale("en_US.UTF-8"), Language::English);
        assert_eq!(Language::Arabic.code(), "ar");
    }
}
