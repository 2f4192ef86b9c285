use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use stratus_services::AlarmStyle;
use stratus_weather::{Language, LocationSource, TemperatureUnit, WindSpeedUnit};

#[derive(Parser)]
#[command(version, about = "Terminal weather, forecasts and alerts", long_about = None)]
#[command(propagate_version = true)]
#[command(name = "stratus")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Current conditions, hourly and daily forecast
    Home(HomeArgs),
    /// Favorite places
    #[command(subcommand)]
    Fav(FavCommand),
    /// Weather alerts
    #[command(subcommand)]
    Alert(AlertCommand),
    /// Units, language, notifications and location
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Run pending alerts until interrupted
    Watch(WatchArgs),
}

#[derive(Args)]
pub struct HomeArgs {
    /// Only show cached data
    #[arg(long)]
    pub offline: bool,
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,
}

#[derive(Subcommand)]
pub enum FavCommand {
    List,
    Add {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        name: String,
        /// City label; looked up by reverse geocoding when omitted
        #[arg(long)]
        city: Option<String>,
    },
    /// Weather for a favorite
    Show { id: i64 },
    Remove { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StyleArg {
    Notification,
    Alarm,
}

impl From<StyleArg> for AlarmStyle {
    fn from(s: StyleArg) -> Self {
        match s {
            StyleArg::Notification => AlarmStyle::Notification,
            StyleArg::Alarm => AlarmStyle::Alarm,
        }
    }
}

#[derive(Subcommand)]
pub enum AlertCommand {
    List,
    Add {
        /// Window start: RFC 3339 or HH:MM (today, local time)
        #[arg(long)]
        from: String,
        /// Window end: RFC 3339 or HH:MM (today, local time)
        #[arg(long)]
        to: String,
        #[arg(long, value_enum, default_value_t = StyleArg::Notification)]
        style: StyleArg,
    },
    Stop { id: String },
    Snooze { id: String },
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TempArg {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl From<TempArg> for TemperatureUnit {
    fn from(t: TempArg) -> Self {
        match t {
            TempArg::Celsius => TemperatureUnit::Celsius,
            TempArg::Fahrenheit => TemperatureUnit::Fahrenheit,
            TempArg::Kelvin => TemperatureUnit::Kelvin,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WindArg {
    Mps,
    Mph,
}

impl From<WindArg> for WindSpeedUnit {
    fn from(w: WindArg) -> Self {
        match w {
            WindArg::Mps => WindSpeedUnit::MetersPerSecond,
            WindArg::Mph => WindSpeedUnit::MilesPerHour,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LanguageArg {
    English,
    Arabic,
}

impl From<LanguageArg> for Language {
    fn from(l: LanguageArg) -> Self {
        match l {
            LanguageArg::English => Language::English,
            LanguageArg::Arabic => Language::Arabic,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SourceArg {
    Gps,
    Map,
}

impl From<SourceArg> for LocationSource {
    fn from(s: SourceArg) -> Self {
        match s {
            SourceArg::Gps => LocationSource::Gps,
            SourceArg::Map => LocationSource::Map,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    Show,
    SetUnits {
        #[arg(long, value_enum)]
        temp: Option<TempArg>,
        #[arg(long, value_enum)]
        wind: Option<WindArg>,
    },
    SetLanguage {
        #[arg(value_enum)]
        language: LanguageArg,
    },
    Notifications {
        #[arg(value_enum)]
        state: Toggle,
    },
    Location {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Where the position came from
        #[arg(long, value_enum, default_value_t = SourceArg::Map)]
        source: SourceArg,
    },
}

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between re-reading alerts from the store
    #[arg(long, default_value_t = 30)]
    pub refresh_secs: u64,
}

/// Parse an alert time given as RFC 3339 or `HH:MM` on `now`'s date in
/// `now`'s time zone.
pub fn parse_time<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let time = NaiveTime::parse_from_str(input, "%H:%M")
        .with_context(|| format!("Invalid time '{}': expected RFC 3339 or HH:MM", input))?;
    let local = now.date_naive().and_time(time);
    match now.timezone().from_local_datetime(&local).earliest() {
        Some(dt) => Ok(dt.with_timezone(&Utc)),
        None => bail!("'{}' does not exist in the local time zone today", input),
    }
}
