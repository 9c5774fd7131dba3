use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use menuscout::app::AppContext;
use menuscout::cli::{commands, Cli, Commands};
use menuscout::config::Config;
use menuscout::domain::PlaceRef;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Serve { bind } => {
            commands::serve(&ctx, bind.as_deref()).await?;
        }
        Commands::Menu { place_id } => {
            commands::menu(&ctx, &place_id).await?;
        }
        Commands::Scrape { place_id, website } => {
            commands::scrape(&ctx, &place_id, website.as_deref()).await?;
        }
        Commands::Stream {
            place_id,
            name,
            address,
        } => {
            let place = PlaceRef {
                name,
                address,
                ..PlaceRef::new(place_id)
            };
            commands::stream(&ctx, place).await?;
        }
        Commands::Extract { url } => {
            commands::extract(&ctx, &url).await?;
        }
    }

    Ok(())
}
