//! Plain-text screens.

use std::fmt::Write;

use chrono::{DateTime, Local, NaiveDate, Utc};
use stratus_services::{Alert, CachedRecord, FavoritePlace, UserSettings};
use stratus_weather::{
    Converted, CurrentWeatherSnapshot, ForecastEntry, ForecastViews, TemperatureUnit,
    WindSpeedUnit,
};

fn temp(value: f64, unit: TemperatureUnit) -> String {
    format!("{:.0}{}", value, unit.symbol())
}

fn wind(value: f64, unit: WindSpeedUnit) -> String {
    format!("{:.1} {}", value, unit.as_str())
}

fn condition(entry_weather: &[stratus_weather::Condition]) -> &str {
    entry_weather
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("-")
}

fn clock(unix: i64, offset_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix + offset_secs, 0)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

pub fn current(view: &Converted<CurrentWeatherSnapshot>) -> String {
    let w = &view.value;
    let tu = view.temperature_unit;
    let mut out = String::new();

    let place = match &w.sys.country {
        Some(country) if !w.name.is_empty() => format!("{}, {}", w.name, country),
        _ if !w.name.is_empty() => w.name.clone(),
        _ => format!("{:.4}, {:.4}", w.coord.lat, w.coord.lon),
    };
    let _ = writeln!(out, "{}", place);
    let _ = writeln!(
        out,
        "  {}  {}  (feels like {})",
        temp(w.main.temp, tu),
        w.description().unwrap_or("-"),
        temp(w.main.feels_like, tu)
    );
    let _ = writeln!(
        out,
        "  Low {}  High {}",
        temp(w.main.temp_min, tu),
        temp(w.main.temp_max, tu)
    );
    let gust = w
        .wind
        .gust
        .map(|g| format!(", gusts {}", wind(g, view.wind_unit)))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "  Wind {} at {}°{}",
        wind(w.wind.speed, view.wind_unit),
        w.wind.deg,
        gust
    );
    let _ = writeln!(
        out,
        "  Humidity {}%  Pressure {} hPa  Clouds {}%  Visibility {} m",
        w.main.humidity, w.main.pressure, w.clouds.all, w.visibility
    );
    let _ = writeln!(
        out,
        "  Sunrise {}  Sunset {}",
        clock(w.sys.sunrise, w.timezone),
        clock(w.sys.sunset, w.timezone)
    );
    out
}

pub fn hourly(entries: &[ForecastEntry], tu: TemperatureUnit, wu: WindSpeedUnit) -> String {
    let mut out = String::from("Hourly\n");
    if entries.is_empty() {
        out.push_str("  no data\n");
    }
    for e in entries {
        let time = e.dt_txt.get(11..16).unwrap_or("--:--");
        let _ = writeln!(
            out,
            "  {}  {:>6}  {:>9}  {:>3.0}%  {}",
            time,
            temp(e.main.temp, tu),
            wind(e.wind.speed, wu),
            e.pop * 100.0,
            condition(&e.weather)
        );
    }
    out
}

pub fn daily(entries: &[ForecastEntry], tu: TemperatureUnit) -> String {
    let mut out = String::from("Next days\n");
    if entries.is_empty() {
        out.push_str("  no data\n");
    }
    for e in entries {
        let day = e
            .date_key()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| d.format("%a %d %b").to_string())
            .unwrap_or_else(|| e.dt_txt.clone());
        let _ = writeln!(
            out,
            "  {}  {:>6} / {:<6}  {}",
            day,
            temp(e.main.temp_max, tu),
            temp(e.main.temp_min, tu),
            condition(&e.weather)
        );
    }
    out
}

pub fn forecast(views: &ForecastViews, tu: TemperatureUnit, wu: WindSpeedUnit) -> String {
    format!("{}\n{}", hourly(&views.hourly, tu, wu), daily(&views.daily, tu))
}

pub fn cached_note<T>(record: &CachedRecord<T>) -> String {
    format!(
        "(cached {})",
        record
            .cached_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    )
}

pub fn favorite_line(place: &FavoritePlace) -> String {
    format!(
        "{:>4}  {:<20} {:<20} {:.4}, {:.4}",
        place.id, place.name, place.city, place.latitude, place.longitude
    )
}

pub fn alert_line(alert: &Alert) -> String {
    let fmt = |t: DateTime<Utc>| t.with_timezone(&Local).format("%d %b %H:%M").to_string();
    format!(
        "{}  {:<12} {:<8} {} -> {}",
        alert.id,
        alert.style.as_str(),
        if alert.is_active { "active" } else { "inactive" },
        fmt(alert.from),
        fmt(alert.to)
    )
}

pub fn settings(s: &UserSettings) -> String {
    let location = match s.coordinates() {
        Some(c) => c.to_string(),
        None => "not set".to_string(),
    };
    let mut out = String::new();
    let _ = writeln!(out, "Location source   {}", s.location_source);
    let _ = writeln!(out, "Location          {}", location);
    let _ = writeln!(out, "Temperature unit  {}", s.temperature_unit);
    let _ = writeln!(out, "Wind speed unit   {}", s.wind_unit);
    let _ = writeln!(
        out,
        "Language          {}{}",
        s.language.as_str(),
        if s.user_set_language { "" } else { " (device)" }
    );
    let _ = writeln!(
        out,
        "Notifications     {}",
        if s.notifications_enabled { "on" } else { "off" }
    );
    out
}
