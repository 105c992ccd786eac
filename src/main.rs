use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use foodgram::{
    actions::PgStore,
    api,
    config::Config,
    import,
    state::{connect_cache, State},
    DEFAULT_INGREDIENTS_PATH, DEFAULT_TAGS_PATH,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "foodgram", version, about = "Recipe sharing backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Load ingredients from a JSON file, skipping existing ones
    ImportIngredients {
        #[arg(long, default_value = DEFAULT_INGREDIENTS_PATH)]
        path: PathBuf,
    },
    /// Load tags from a JSON file
    ImportTags {
        #[arg(long, default_value = DEFAULT_TAGS_PATH)]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::ImportIngredients { path } => {
            let store = PgStore::connect(&config.database_url, 2).await?;
            let cache = connect_cache(config.redis_url.as_deref()).await;

            let report = import::import_ingredients(&store, cache.as_ref(), &path).await?;
            log::info!(
                "Successfully imported ingredients: {} new of {}",
                report.created,
                report.read
            );
            Ok(())
        }
        Command::ImportTags { path } => {
            let store = PgStore::connect(&config.database_url, 2).await?;
            let cache = connect_cache(config.redis_url.as_deref()).await;

            let report = import::import_tags(&store, cache.as_ref(), &path).await?;
            log::info!(
                "Successfully imported tags: {} new of {}",
                report.created,
                report.read
            );
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(State::connect(&config).await?);
    let address = SocketAddr::from(([0, 0, 0, 0], config.port));

    let (address, server) = warp::serve(api::routes(state))
        .try_bind_with_graceful_shutdown(address, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
            log::info!("Shutting down");
        })
        .with_context(|| format!("Failed to bind {address}"))?;

    log::info!("Listening on {address}");
    server.await;

    Ok(())
}
