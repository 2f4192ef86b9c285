use anyhow::Result;
use stratus_services::UserSettings;
use stratus_weather::{Coordinates, LocationSource};

use crate::app::App;
use crate::cli::{SettingsCommand, Toggle};
use crate::render;

pub async fn run(app: &App, cmd: SettingsCommand) -> Result<()> {
    let cache = app.cache();
    match cmd {
        SettingsCommand::Show => {}
        SettingsCommand::SetUnits { temp, wind } => {
            if let Some(t) = temp {
                UserSettings::set_temperature_unit(cache, t.into()).await?;
            }
            if let Some(w) = wind {
                UserSettings::set_wind_unit(cache, w.into()).await?;
            }
        }
        SettingsCommand::SetLanguage { language } => {
            UserSettings::set_language(cache, language.into()).await?;
        }
        SettingsCommand::Notifications { state } => {
            UserSettings::set_notifications_enabled(cache, matches!(state, Toggle::On)).await?;
        }
        SettingsCommand::Location { lat, lon, source } => {
            let coords = Coordinates::new(lat, lon);
            match LocationSource::from(source) {
                LocationSource::Gps => UserSettings::set_device_location(cache, coords).await?,
                LocationSource::Map => UserSettings::set_manual_location(cache, coords).await?,
            }
        }
    }
    print!("{}", render::settings(&app.settings().await?));
    Ok(())
}
