//! Forecast aggregation: hourly strip and per-day summaries.
//!
//! The provider returns a flat list of 3-hour steps. The hourly view is the
//! first [`HOURLY_ENTRIES`] steps; the daily view picks, for each calendar day
//! after `today`, the step closest to local noon and stamps the day's true
//! temperature range onto it.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::{ForecastEntry, ForecastSeries, TemperatureUnit, WindSpeedUnit};
use crate::units::convert_entry;

/// Steps shown in the hourly strip (8 x 3h = 24h).
pub const HOURLY_ENTRIES: usize = 8;

/// Maximum number of days in the daily view.
pub const DAILY_DAYS: usize = 4;

const NOON: u32 = 12;

/// Both forecast views, already converted to display units.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastViews {
    pub hourly: Vec<ForecastEntry>,
    pub daily: Vec<ForecastEntry>,
}

/// First [`HOURLY_ENTRIES`] entries, unchanged.
pub fn hourly(entries: &[ForecastEntry]) -> Vec<ForecastEntry> {
    entries.iter().take(HOURLY_ENTRIES).cloned().collect()
}

/// One representative entry per day strictly after `today`, at most [`DAILY_DAYS`].
///
/// The representative is the entry whose hour is closest to noon (first one
/// wins on ties). Its `temp_max`/`temp_min` are replaced with the max/min of
/// `temp` across every entry sharing that date. Entries whose timestamp
/// cannot be parsed are ignored.
pub fn daily(entries: &[ForecastEntry], today: NaiveDate) -> Vec<ForecastEntry> {
    let mut days: BTreeMap<NaiveDate, Vec<&ForecastEntry>> = BTreeMap::new();

    for entry in entries {
        let Some(date) = entry
            .date_key()
            .and_then(|key| NaiveDate::parse_from_str(key, "%Y-%m-%d").ok())
        else {
            tracing::debug!("Skipping forecast entry with bad timestamp: {:?}", entry.dt_txt);
            continue;
        };
        if date > today {
            days.entry(date).or_default().push(entry);
        }
    }

    days.into_values()
        .filter_map(|day| summarize_day(&day))
        .take(DAILY_DAYS)
        .collect()
}

fn noon_distance(entry: &ForecastEntry) -> u32 {
    entry.hour().map_or(u32::MAX, |h| h.abs_diff(NOON))
}

fn summarize_day(day: &[&ForecastEntry]) -> Option<ForecastEntry> {
    let mut representative = *day.first()?;
    for entry in day.iter().skip(1) {
        if noon_distance(entry) < noon_distance(representative) {
            representative = *entry;
        }
    }

    let (min, max) = day.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
        (lo.min(e.main.temp), hi.max(e.main.temp))
    });

    let mut summary = representative.clone();
    summary.main.temp_min = min;
    summary.main.temp_max = max;
    Some(summary)
}

/// Build both views for `series` and convert them to the requested units.
pub fn aggregate(
    series: &ForecastSeries,
    today: NaiveDate,
    temperature_unit: TemperatureUnit,
    wind_unit: WindSpeedUnit,
) -> ForecastViews {
    let convert = |e: &ForecastEntry| convert_entry(e, temperature_unit, wind_unit);
    ForecastViews {
        hourly: hourly(&series.list).iter().map(convert).collect(),
        daily: daily(&series.list, today).iter().map(convert).collect(),
    }
}
