use std::sync::Arc;

use tracing::{error, info};

use feedloft::feed::start_feed_updater;
use feedloft::{Config, Database, FeedFetcher, JobRunner, WebServer};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = feedloft::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        feedloft::logging::init_console_only(&config.logging.level);
    }

    info!("Feedloft feed reader");

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> feedloft::Result<()> {
    config.validate()?;

    let db = Arc::new(Database::open(&config.database.path).await?);
    info!("Database opened at {}", config.database.path);

    let fetcher = Arc::new(FeedFetcher::new(&config.feeds)?);
    if config.feeds.updater_enabled {
        start_feed_updater(db.clone(), fetcher.clone(), &config.feeds);
    }

    let jobs = JobRunner::new(db.clone(), fetcher, config.feeds.max_entries_per_fetch);
    let server = WebServer::new(&config.server, db, jobs)?;
    info!("Server configured on {}", server.addr());

    server.run().await?;
    Ok(())
}
