use anyhow::{anyhow, Result};
use chrono::Local;
use stratus_weather::{aggregate, convert_current, Coordinates};

use crate::app::App;
use crate::cli::FavCommand;
use crate::error_mapping::from_provider;
use crate::render;

pub async fn run(app: &App, cmd: FavCommand) -> Result<()> {
    let repo = app.repository();
    match cmd {
        FavCommand::List => {
            let places = repo.favorite_places().await?;
            if places.is_empty() {
                println!("No favorites yet. Add one with `stratus fav add`.");
            }
            for place in &places {
                println!("{}", render::favorite_line(place));
            }
        }
        FavCommand::Add {
            lat,
            lon,
            name,
            city,
        } => {
            let coords = Coordinates::validated(lat, lon)?;
            let place = repo.add_favorite_place(coords, &name, city).await?;
            println!("Added {}", render::favorite_line(&place));
        }
        FavCommand::Show { id } => {
            let place = repo
                .favorite_place(id)
                .await?
                .ok_or_else(|| anyhow!("No favorite with id {}", id))?;
            let settings = app.settings().await?;
            // Favorites do not replace the home screen's cached weather
            let query = app.query(place.coordinates(), &settings);
            let (current, forecast) = tokio::join!(
                repo.peek_current_weather(&query),
                repo.peek_hourly_forecast(&query)
            );
            let snapshot = current.map_err(from_provider)?;
            let (tu, wu) = (settings.temperature_unit, settings.wind_unit);

            println!("{} ({})", place.name, place.city);
            print!("{}", render::current(&convert_current(&snapshot, tu, wu)));
            println!();
            match forecast {
                Ok(series) => {
                    let views = aggregate(&series, Local::now().date_naive(), tu, wu);
                    print!("{}", render::forecast(&views, tu, wu));
                }
                Err(e) => {
                    tracing::warn!("Forecast fetch for favorite {} failed: {}", id, e);
                    println!("No forecast available.");
                }
            }
        }
        FavCommand::Remove { id } => {
            if repo.delete_favorite_place(id).await? {
                println!("Removed favorite {}", id);
            } else {
                println!("No favorite with id {}", id);
            }
        }
    }
    Ok(())
}
