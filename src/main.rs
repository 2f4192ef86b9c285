use anyhow::Result;
use clap::Parser;

mod app;
mod cli;
mod commands;
mod error_mapping;
mod render;

use app::App;
use cli::Cli;
use stratus_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    stratus_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    let app = App::new(config)?;
    tracing::debug!("Stratus started");

    let result = commands::dispatch(&app, cli.command).await;
    app.shutdown();

    if let Err(err) = result {
        let app_err = error_mapping::classify(err);
        tracing::error!("{:#}", app_err);
        eprintln!("Error: {}", app_err.user_message());
        std::process::exit(1);
    }

    Ok(())
}
