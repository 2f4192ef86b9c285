pub mod alerts;
pub mod favorites;
pub mod home;
pub mod settings;
pub mod watch;

use crate::app::App;
use crate::cli::Commands;

pub async fn dispatch(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Home(args) => home::run(app, args).await,
        Commands::Fav(cmd) => favorites::run(app, cmd).await,
        Commands::Alert(cmd) => alerts::run(app, cmd).await,
        Commands::Settings(cmd) => settings::run(app, cmd).await,
        Commands::Watch(args) => watch::run(app, args).await,
    }
}
