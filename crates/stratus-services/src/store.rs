//! SQLite-backed local store.
//!
//! Holds the single most recent current-weather and forecast payloads, the
//! user's favorite places and alerts, and the settings key/value table.
//! Nested provider responses are stored as JSON text.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use stratus_weather::{CurrentWeatherSnapshot, ForecastSeries};

use crate::model::{AlarmStyle, Alert, CachedRecord, FavoritePlace};

const CURRENT_TABLE: &str = "current_weather";
const FORECAST_TABLE: &str = "forecast";

/// SQLite weather store.
pub struct WeatherStore {
    conn: Connection,
}

impl WeatherStore {
    /// Open (or create) the store at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS current_weather (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                payload TEXT NOT NULL,
                cached_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS forecast (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                payload TEXT NOT NULL,
                cached_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS favorite_places (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                name TEXT NOT NULL,
                city TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                duration_hours INTEGER NOT NULL,
                style TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                from_ms INTEGER NOT NULL,
                to_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_alerts_from ON alerts(from_ms);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
            )
            .context("Failed to initialize schema")?;
        Ok(())
    }

    // ---- cached responses ----

    /// Replace the cached current weather. Returns the new row id.
    pub fn save_current_weather(&self, snapshot: &CurrentWeatherSnapshot) -> Result<i64> {
        self.replace_payload(CURRENT_TABLE, snapshot)
    }

    /// Latest cached current weather, or `None` when empty or unreadable.
    pub fn latest_current_weather(&self) -> Result<Option<CachedRecord<CurrentWeatherSnapshot>>> {
        self.latest_payload(CURRENT_TABLE)
    }

    pub fn current_weather_by_id(
        &self,
        id: i64,
    ) -> Result<Option<CachedRecord<CurrentWeatherSnapshot>>> {
        self.payload_by_id(CURRENT_TABLE, id)
    }

    /// Id of the most recent current-weather row.
    pub fn last_weather_id(&self) -> Result<Option<i64>> {
        let id: Option<i64> =
            self.conn
                .query_row("SELECT MAX(id) FROM current_weather", [], |row| row.get(0))?;
        Ok(id)
    }

    /// Replace the cached forecast. Returns the new row id.
    pub fn save_forecast(&self, series: &ForecastSeries) -> Result<i64> {
        self.replace_payload(FORECAST_TABLE, series)
    }

    pub fn latest_forecast(&self) -> Result<Option<CachedRecord<ForecastSeries>>> {
        self.latest_payload(FORECAST_TABLE)
    }

    /// Insert a payload and drop every older row, so one record remains.
    fn replace_payload<T: Serialize>(&self, table: &str, value: &T) -> Result<i64> {
        let payload = serde_json::to_string(value).context("Failed to serialize payload")?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("INSERT INTO {} (payload, cached_at) VALUES (?1, ?2)", table),
            params![payload, now],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(&format!("DELETE FROM {} WHERE id < ?1", table), params![id])?;
        tx.commit()?;

        tracing::debug!("Cached {} row {}", table, id);
        Ok(id)
    }

    fn latest_payload<T: DeserializeOwned>(&self, table: &str) -> Result<Option<CachedRecord<T>>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, payload, cached_at FROM {} ORDER BY id DESC LIMIT 1",
                    table
                ),
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        Ok(row.and_then(|r| decode_record(table, r)))
    }

    fn payload_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: i64,
    ) -> Result<Option<CachedRecord<T>>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT id, payload, cached_at FROM {} WHERE id = ?1", table),
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        Ok(row.and_then(|r| decode_record(table, r)))
    }

    // ---- favorites ----

    pub fn list_favorites(&self) -> Result<Vec<FavoritePlace>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, latitude, longitude, name, city FROM favorite_places ORDER BY id",
        )?;
        let rows = stmt.query_map([], Self::row_to_favorite)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_favorite(&self, id: i64) -> Result<Option<FavoritePlace>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, latitude, longitude, name, city FROM favorite_places WHERE id = ?1",
                params![id],
                Self::row_to_favorite,
            )
            .optional()?)
    }

    pub fn add_favorite(
        &self,
        latitude: f64,
        longitude: f64,
        name: &str,
        city: &str,
    ) -> Result<FavoritePlace> {
        self.conn.execute(
            "INSERT INTO favorite_places (latitude, longitude, name, city) VALUES (?1, ?2, ?3, ?4)",
            params![latitude, longitude, name, city],
        )?;
        Ok(FavoritePlace {
            id: self.conn.last_insert_rowid(),
            latitude,
            longitude,
            name: name.to_string(),
            city: city.to_string(),
        })
    }

    /// Returns true if a row was removed.
    pub fn delete_favorite(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM favorite_places WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn row_to_favorite(row: &rusqlite::Row) -> rusqlite::Result<FavoritePlace> {
        Ok(FavoritePlace {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            name: row.get(3)?,
            city: row.get(4)?,
        })
    }

    // ---- alerts ----

    pub fn list_alerts(&self) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, duration_hours, style, is_active, from_ms, to_ms FROM alerts ORDER BY from_ms",
        )?;
        let rows = stmt.query_map([], Self::row_to_alert)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, duration_hours, style, is_active, from_ms, to_ms FROM alerts WHERE id = ?1",
                params![id],
                Self::row_to_alert,
            )
            .optional()?)
    }

    /// Insert an alert, replacing any existing row with the same id.
    pub fn add_alert(&self, alert: &Alert) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO alerts (id, duration_hours, style, is_active, from_ms, to_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                alert.id,
                alert.duration_hours,
                alert.style.as_str(),
                alert.is_active,
                alert.from.timestamp_millis(),
                alert.to.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    /// Returns true if the alert existed.
    pub fn update_alert(&self, alert: &Alert) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE alerts SET duration_hours = ?2, style = ?3, is_active = ?4, from_ms = ?5, to_ms = ?6
             WHERE id = ?1",
            params![
                alert.id,
                alert.duration_hours,
                alert.style.as_str(),
                alert.is_active,
                alert.from.timestamp_millis(),
                alert.to.timestamp_millis(),
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn update_alert_status(&self, id: &str, is_active: bool) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE alerts SET is_active = ?2 WHERE id = ?1",
            params![id, is_active],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_alert(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM alerts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn row_to_alert(row: &rusqlite::Row) -> rusqlite::Result<Alert> {
        let style: String = row.get(2)?;
        let from_ms: i64 = row.get(4)?;
        let to_ms: i64 = row.get(5)?;
        Ok(Alert {
            id: row.get(0)?,
            duration_hours: row.get(1)?,
            style: style.parse().unwrap_or_default(),
            is_active: row.get(3)?,
            from: millis_to_utc(from_ms),
            to: millis_to_utc(to_ms),
        })
    }

    // ---- settings ----

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_setting(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn decode_record<T: DeserializeOwned>(
    table: &str,
    (id, payload, cached_at): (i64, String, String),
) -> Option<CachedRecord<T>> {
    let data = match serde_json::from_str(&payload) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("Ignoring unreadable {} row {}: {}", table, id, e);
            return None;
        }
    };
    let cached_at = DateTime::parse_from_rfc3339(&cached_at)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    Some(CachedRecord {
        id,
        cached_at,
        data,
    })
}

fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stratus_weather::{City, GeoPoint, MainReadings};

    fn snapshot(name: &str, temp: f64) -> CurrentWeatherSnapshot {
        CurrentWeatherSnapshot {
            coord: GeoPoint {
                lat: 51.5085,
                lon: -0.1257,
            },
            weather: Vec::new(),
            base: "stations".into(),
            main: MainReadings {
                temp,
                ..Default::default()
            },
            visibility: 10000,
            wind: Default::default(),
            clouds: Default::default(),
            dt: 1_700_000_000,
            sys: Default::default(),
            timezone: 0,
            id: 1,
            name: name.into(),
            cod: 200,
        }
    }

    #[test]
    fn test_empty_store_has_nothing_cached() {
        let store = WeatherStore::in_memory().unwrap();
        assert!(store.latest_current_weather().unwrap().is_none());
        assert!(store.latest_forecast().unwrap().is_none());
        assert_eq!(store.last_weather_id().unwrap(), None);
    }

    #[test]
    fn test_current_weather_keeps_single_row() {
        let store = WeatherStore::in_memory().unwrap();
        let first = store.save_current_weather(&snapshot("London", 20.0)).unwrap();
        let second = store.save_current_weather(&snapshot("Paris", 18.0)).unwrap();
        assert!(second > first);

        let latest = store.latest_current_weather().unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.data.name, "Paris");
        assert_eq!(store.last_weather_id().unwrap(), Some(second));
        assert!(store.current_weather_by_id(first).unwrap().is_none());

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM current_weather", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_forecast_round_trip() {
        let store = WeatherStore::in_memory().unwrap();
        let series = ForecastSeries {
            cod: "200".into(),
            message: 0.0,
            cnt: 0,
            list: Vec::new(),
            city: City {
                name: "Cairo".into(),
                ..Default::default()
            },
        };
        let id = store.save_forecast(&series).unwrap();
        let cached = store.latest_forecast().unwrap().unwrap();
        assert_eq!(cached.id, id);
        assert_eq!(cached.data, series);
    }

    #[test]
    fn test_malformed_payload_reads_as_none() {
        let store = WeatherStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO current_weather (payload, cached_at) VALUES ('{not json', 'x')",
                [],
            )
            .unwrap();
        assert!(store.latest_current_weather().unwrap().is_none());
    }

    #[test]
    fn test_favorites_add_delete() {
        let store = WeatherStore::in_memory().unwrap();
        let place = store.add_favorite(35.6895, 139.6917, "Tokyo", "Tokyo").unwrap();
        assert_eq!(store.list_favorites().unwrap().len(), 1);
        assert_eq!(store.get_favorite(place.id).unwrap(), Some(place.clone()));

        assert!(store.delete_favorite(place.id).unwrap());
        assert!(!store.delete_favorite(place.id).unwrap());
        assert!(store.list_favorites().unwrap().is_empty());
    }

    #[test]
    fn test_alert_crud() {
        let store = WeatherStore::in_memory().unwrap();
        let from = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let alert = Alert::new(AlarmStyle::Alarm, from, from + Duration::hours(2));
        store.add_alert(&alert).unwrap();

        let loaded = store.get_alert(&alert.id).unwrap().unwrap();
        assert_eq!(loaded, alert);

        assert!(store.update_alert_status(&alert.id, false).unwrap());
        assert!(!store.get_alert(&alert.id).unwrap().unwrap().is_active);

        let mut moved = loaded.clone();
        moved.to = from + Duration::hours(5);
        assert!(store.update_alert(&moved).unwrap());
        assert_eq!(store.list_alerts().unwrap()[0].to, moved.to);

        assert!(store.delete_alert(&alert.id).unwrap());
        assert!(store.get_alert(&alert.id).unwrap().is_none());
        assert!(!store.update_alert_status(&alert.id, true).unwrap());
    }

    #[test]
    fn test_settings_last_write_wins() {
        let store = WeatherStore::in_memory().unwrap();
        assert_eq!(store.get_setting("temp_unit").unwrap(), None);
        store.set_setting("temp_unit", "kelvin").unwrap();
        store.set_setting("temp_unit", "fahrenheit").unwrap();
        assert_eq!(
            store.get_setting("temp_unit").unwrap().as_deref(),
            Some("fahrenheit")
        );
        store.remove_setting("temp_unit").unwrap();
        assert_eq!(store.get_setting("temp_unit").unwrap(), None);
    }

    #[test]
    fn test_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stratus.db");
        {
            let store = WeatherStore::new(&path).unwrap();
            store.set_setting("language", "arabic").unwrap();
        }
        let store = WeatherStore::new(&path).unwrap();
        assert_eq!(store.get_setting("language").unwrap().as_deref(), Some("arabic"));
    }
}
