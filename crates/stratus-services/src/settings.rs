//! User preferences kept in the store's key/value table.

use anyhow::Result;
use stratus_weather::{Coordinates, Language, LocationSource, TemperatureUnit, WindSpeedUnit};

use crate::cache::LocalCache;

pub const KEY_LOCATION_TYPE: &str = "location_type";
pub const KEY_LATITUDE: &str = "pref_latitude";
pub const KEY_LONGITUDE: &str = "pref_longitude";
pub const KEY_TEMP_UNIT: &str = "temp_unit";
pub const KEY_WIND_UNIT: &str = "wind_unit";
pub const KEY_LANGUAGE: &str = "language";
pub const KEY_USER_SET_LANGUAGE: &str = "user_set_language";
pub const KEY_NOTIFICATIONS: &str = "notifications_enabled";

/// Snapshot of every preference, with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub location_source: LocationSource,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature_unit: TemperatureUnit,
    pub wind_unit: WindSpeedUnit,
    pub language: Language,
    pub user_set_language: bool,
    pub notifications_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            location_source: LocationSource::Gps,
            latitude: 0.0,
            longitude: 0.0,
            temperature_unit: TemperatureUnit::Celsius,
            wind_unit: WindSpeedUnit::MetersPerSecond,
            language: device_language(),
            user_set_language: false,
            notifications_enabled: true,
        }
    }
}

/// Language from the `LANG` environment, English if unset.
pub fn device_language() -> Language {
    std::env::var("LANG")
        .map(|l| Language::from_locale(&l))
        .unwrap_or_default()
}

impl UserSettings {
    /// Read all preferences. Missing or unparseable values use the defaults.
    pub async fn load(cache: &LocalCache) -> Result<Self> {
        let defaults = Self::default();
        let user_set_language = parse_or(
            cache.get_setting(KEY_USER_SET_LANGUAGE).await?,
            defaults.user_set_language,
        );
        // The device language wins until the user picks one explicitly
        let language = if user_set_language {
            parse_or(cache.get_setting(KEY_LANGUAGE).await?, defaults.language)
        } else {
            defaults.language
        };

        Ok(Self {
            location_source: parse_or(
                cache.get_setting(KEY_LOCATION_TYPE).await?,
                defaults.location_source,
            ),
            latitude: parse_or(cache.get_setting(KEY_LATITUDE).await?, defaults.latitude),
            longitude: parse_or(cache.get_setting(KEY_LONGITUDE).await?, defaults.longitude),
            temperature_unit: parse_or(
                cache.get_setting(KEY_TEMP_UNIT).await?,
                defaults.temperature_unit,
            ),
            wind_unit: parse_or(cache.get_setting(KEY_WIND_UNIT).await?, defaults.wind_unit),
            language,
            user_set_language,
            notifications_enabled: parse_or(
                cache.get_setting(KEY_NOTIFICATIONS).await?,
                defaults.notifications_enabled,
            ),
        })
    }

    /// Stored coordinates, or `None` while unset (zero).
    pub fn coordinates(&self) -> Option<Coordinates> {
        let coords = Coordinates::new(self.latitude, self.longitude);
        coords.is_valid().then_some(coords)
    }

    pub async fn set_temperature_unit(cache: &LocalCache, unit: TemperatureUnit) -> Result<()> {
        cache.set_setting(KEY_TEMP_UNIT, unit.as_str().into()).await
    }

    pub async fn set_wind_unit(cache: &LocalCache, unit: WindSpeedUnit) -> Result<()> {
        cache.set_setting(KEY_WIND_UNIT, unit.as_str().into()).await
    }

    /// Pin the language and stop following the device locale.
    pub async fn set_language(cache: &LocalCache, language: Language) -> Result<()> {
        cache.set_setting(KEY_LANGUAGE, language.as_str().into()).await?;
        cache
            .set_setting(KEY_USER_SET_LANGUAGE, true.to_string())
            .await
    }

    pub async fn set_notifications_enabled(cache: &LocalCache, enabled: bool) -> Result<()> {
        cache
            .set_setting(KEY_NOTIFICATIONS, enabled.to_string())
            .await
    }

    pub async fn set_location_source(cache: &LocalCache, source: LocationSource) -> Result<()> {
        cache
            .set_setting(KEY_LOCATION_TYPE, source.as_str().into())
            .await
    }

    /// Store a position reported by the device (GPS source).
    pub async fn set_device_location(cache: &LocalCache, coords: Coordinates) -> Result<()> {
        let coords = Coordinates::validated(coords.latitude, coords.longitude)?;
        Self::write_coordinates(cache, coords).await?;
        Self::set_location_source(cache, LocationSource::Gps).await
    }

    /// Store a manually picked location and switch the source to map.
    pub async fn set_manual_location(cache: &LocalCache, coords: Coordinates) -> Result<()> {
        let coords = Coordinates::validated(coords.latitude, coords.longitude)?;
        Self::write_coordinates(cache, coords).await?;
        Self::set_location_source(cache, LocationSource::Map).await
    }

    async fn write_coordinates(cache: &LocalCache, coords: Coordinates) -> Result<()> {
        cache
            .set_setting(KEY_LATITUDE, coords.latitude.to_string())
            .await?;
        cache
            .set_setting(KEY_LONGITUDE, coords.longitude.to_string())
            .await?;
        tracing::info!("Saved location {}", coords);
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}
