//! Unit conversion applied at render and notification time.
//!
//! Cached values stay in the provider's metric units (Celsius, m/s). The
//! helpers here always take those raw values and return a new copy, so a
//! stored record is never converted twice.

use crate::types::{
    CurrentWeatherSnapshot, ForecastEntry, MainReadings, TemperatureUnit, Wind, WindSpeedUnit,
};

/// Metres per second to miles per hour.
pub const MPS_TO_MPH: f64 = 2.23694;

/// Offset between Celsius and Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

impl TemperatureUnit {
    /// Convert a Celsius value into this unit.
    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius_to_fahrenheit(celsius),
            Self::Kelvin => celsius_to_kelvin(celsius),
        }
    }

    /// Convert a value expressed in this unit back to Celsius.
    pub fn to_celsius(&self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => fahrenheit_to_celsius(value),
            Self::Kelvin => kelvin_to_celsius(value),
        }
    }
}

impl WindSpeedUnit {
    /// Convert a m/s value into this unit.
    pub fn from_mps(&self, mps: f64) -> f64 {
        match self {
            Self::MetersPerSecond => mps,
            Self::MilesPerHour => mps * MPS_TO_MPH,
        }
    }
}

fn convert_main(main: &MainReadings, unit: TemperatureUnit) -> MainReadings {
    MainReadings {
        temp: unit.from_celsius(main.temp),
        feels_like: unit.from_celsius(main.feels_like),
        temp_min: unit.from_celsius(main.temp_min),
        temp_max: unit.from_celsius(main.temp_max),
        ..main.clone()
    }
}

fn convert_wind(wind: &Wind, unit: WindSpeedUnit) -> Wind {
    Wind {
        speed: unit.from_mps(wind.speed),
        gust: wind.gust.map(|g| unit.from_mps(g)),
        deg: wind.deg,
    }
}

/// A raw cached value rendered into the user's units.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<T> {
    pub temperature_unit: TemperatureUnit,
    pub wind_unit: WindSpeedUnit,
    pub value: T,
}

/// Render a raw (Celsius, m/s) snapshot in the requested units.
pub fn convert_current(
    raw: &CurrentWeatherSnapshot,
    temperature_unit: TemperatureUnit,
    wind_unit: WindSpeedUnit,
) -> Converted<CurrentWeatherSnapshot> {
    Converted {
        temperature_unit,
        wind_unit,
        value: CurrentWeatherSnapshot {
            main: convert_main(&raw.main, temperature_unit),
            wind: convert_wind(&raw.wind, wind_unit),
            ..raw.clone()
        },
    }
}

/// Render a raw forecast entry in the requested units.
pub fn convert_entry(
    raw: &ForecastEntry,
    temperature_unit: TemperatureUnit,
    wind_unit: WindSpeedUnit,
) -> ForecastEntry {
    ForecastEntry {
        main: convert_main(&raw.main, temperature_unit),
        wind: convert_wind(&raw.wind, wind_unit),
        ..raw.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoPoint;

    const EPS: f64 = 1e-9;

    fn snapshot(temp: f64, speed: f64) -> CurrentWeatherSnapshot {
        CurrentWeatherSnapshot {
            coord: GeoPoint { lat: 51.5, lon: -0.12 },
            weather: Vec::new(),
            base: String::new(),
            main: MainReadings {
                temp,
                feels_like: temp,
                temp_min: temp - 1.0,
                temp_max: temp + 1.0,
                ..Default::default()
            },
            visibility: 10000,
            wind: Wind { speed, deg: 90, gust: Some(speed * 2.0) },
            clouds: Default::default(),
            dt: 0,
            sys: Default::default(),
            timezone: 0,
            id: 1,
            name: "Test".into(),
            cod: 200,
        }
    }

    #[test]
    fn test_known_points() {
        assert!((celsius_to_fahrenheit(0.0) - 32.0).abs() < EPS);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < EPS);
        assert!((celsius_to_kelvin(20.0) - 293.15).abs() < EPS);
        assert!((kelvin_to_celsius(293.15) - 20.0).abs() < EPS);
    }

    #[test]
    fn test_round_trip_through_celsius_is_lossless() {
        for c in [-40.0, -12.5, 0.0, 21.3, 37.0, 55.5] {
            let f = celsius_to_fahrenheit(c);
            let again = celsius_to_fahrenheit(fahrenheit_to_celsius(f));
            assert!((again - f).abs() < 1e-9, "{} -> {} -> {}", c, f, again);
        }
    }

    #[test]
    fn test_unit_methods_invert() {
        for unit in [TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit, TemperatureUnit::Kelvin] {
            let v = unit.from_celsius(18.25);
            assert!((unit.to_celsius(v) - 18.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_wind_mph() {
        assert!((WindSpeedUnit::MilesPerHour.from_mps(10.0) - 22.3694).abs() < 1e-9);
        assert!((WindSpeedUnit::MetersPerSecond.from_mps(10.0) - 10.0).abs() < EPS);
    }

    #[test]
    fn test_convert_current_leaves_raw_untouched() {
        let raw = snapshot(20.0, 5.0);
        let shown = convert_current(&raw, TemperatureUnit::Fahrenheit, WindSpeedUnit::MilesPerHour);
        assert!((shown.value.main.temp - 68.0).abs() < EPS);
        assert!((shown.value.main.temp_max - 69.8).abs() < 1e-9);
        assert!((shown.value.wind.speed - 11.1847).abs() < 1e-9);
        assert_eq!(shown.value.wind.gust.map(|g| (g - 22.3694).abs() < 1e-9), Some(true));
        assert!((raw.main.temp - 20.0).abs() < EPS);
    }

    #[test]
    fn test_converting_same_raw_value_twice_is_stable() {
        let raw = snapshot(12.0, 3.0);
        let a = convert_current(&raw, TemperatureUnit::Kelvin, WindSpeedUnit::MetersPerSecond);
        let b = convert_current(&raw, TemperatureUnit::Kelvin, WindSpeedUnit::MetersPerSecond);
        assert_eq!(a, b);
        assert!((a.value.main.temp - 285.15).abs() < 1e-9);
    }
}
