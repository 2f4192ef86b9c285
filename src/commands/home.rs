use anyhow::Result;
use chrono::Local;
use stratus_weather::{aggregate, convert_current, location, Coordinates};

use crate::app::App;
use crate::cli::HomeArgs;
use crate::error_mapping::from_provider;
use crate::render;

pub async fn run(app: &App, args: HomeArgs) -> Result<()> {
    let settings = app.settings().await?;
    let explicit = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => None,
    };
    let coords = location::resolve(explicit, settings.coordinates());
    let repo = app.repository();

    let (mut current, mut series) = (None, None);
    let mut from_cache = args.offline;

    if !args.offline {
        let query = app.query(coords, &settings);
        let (current_res, forecast_res) = tokio::join!(
            repo.get_current_weather(&query),
            repo.get_hourly_forecast(&query)
        );
        match current_res {
            Ok(c) => current = Some(c),
            Err(e) => {
                let app_err = from_provider(e);
                tracing::warn!("Current weather fetch failed: {}", app_err);
                eprintln!("⚠ {} Showing cached data.", app_err.user_message());
                from_cache = true;
            }
        }
        match forecast_res {
            Ok(f) => series = Some(f),
            Err(e) => {
                tracing::warn!("Forecast fetch failed: {}", from_provider(e));
                from_cache = true;
            }
        }
    }

    if current.is_none() {
        if let Some(record) = repo.get_current_weather_local().await? {
            println!("{}", render::cached_note(&record));
            current = Some(record.data);
        }
    }
    if series.is_none() {
        series = repo.get_hourly_forecast_local().await?.map(|r| r.data);
    }

    let tu = settings.temperature_unit;
    let wu = settings.wind_unit;

    match &current {
        Some(c) => print!("{}", render::current(&convert_current(c, tu, wu))),
        None => println!("No current weather available{}.", if from_cache { " offline" } else { "" }),
    }
    println!();
    match &series {
        Some(s) => {
            let views = aggregate(s, Local::now().date_naive(), tu, wu);
            print!("{}", render::forecast(&views, tu, wu));
        }
        None => println!("No forecast available."),
    }
    Ok(())
}
