//! Records kept in the local store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stratus_weather::Coordinates;
use uuid::Uuid;

/// A cached payload with the row it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRecord<T> {
    pub id: i64,
    pub cached_at: DateTime<Utc>,
    pub data: T,
}

/// A user-named location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoritePlace {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub city: String,
}

impl FavoritePlace {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// How an alert announces itself when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStyle {
    /// Silent notification only
    #[default]
    Notification,
    /// Notification plus a looping alarm sound
    Alarm,
}

impl AlarmStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::Alarm => "alarm",
        }
    }
}

impl FromStr for AlarmStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "notification" | "silent" => Ok(Self::Notification),
            "alarm" | "sound" => Ok(Self::Alarm),
            other => Err(format!("unknown alarm style: {}", other)),
        }
    }
}

impl fmt::Display for AlarmStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weather alert over the half-open window `[from, to)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub duration_hours: i64,
    pub style: AlarmStyle,
    pub is_active: bool,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Alert {
    /// New active alert with a fresh id.
    pub fn new(style: AlarmStyle, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            duration_hours: (to - from).num_hours(),
            style,
            is_active: true,
            from,
            to,
        }
    }

    /// Replacement alert covering `[now, now + length)`.
    pub fn snoozed(&self, now: DateTime<Utc>, length: Duration) -> Self {
        Self::new(self.style, now, now + length)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.to <= now
    }

    /// Time remaining until the alert fires, clamped at zero.
    pub fn delay_from(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.to - now).to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_new_alert_derives_duration() {
        let alert = Alert::new(AlarmStyle::Alarm, at(8, 0), at(11, 30));
        assert_eq!(alert.duration_hours, 3);
        assert!(alert.is_active);
        assert_eq!(alert.id.len(), 36);
    }

    #[test]
    fn test_delay_is_clamped() {
        let alert = Alert::new(AlarmStyle::Notification, at(8, 0), at(9, 0));
        assert_eq!(alert.delay_from(at(8, 30)).as_secs(), 30 * 60);
        assert_eq!(alert.delay_from(at(10, 0)), std::time::Duration::ZERO);
        assert!(alert.is_expired(at(9, 0)));
        assert!(!alert.is_expired(at(8, 59)));
    }

    #[test]
    fn test_snoozed_gets_new_id_and_window() {
        let alert = Alert::new(AlarmStyle::Alarm, at(8, 0), at(9, 0));
        let snoozed = alert.snoozed(at(9, 0), Duration::minutes(5));
        assert_ne!(snoozed.id, alert.id);
        assert_eq!(snoozed.from, at(9, 0));
        assert_eq!(snoozed.to, at(9, 5));
        assert_eq!(snoozed.style, AlarmStyle::Alarm);
    }

    #[test]
    fn test_style_parse() {
        assert_eq!("alarm".parse::<AlarmStyle>(), Ok(AlarmStyle::Alarm));
        assert_eq!("Notification".parse::<AlarmStyle>(), Ok(AlarmStyle::Notification));
        assert!("beep".parse::<AlarmStyle>().is_err());
    }
}
