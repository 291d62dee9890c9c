//! Peerpool - See which friends are free and plan hangouts around them
//!
//! Serves the home, hangouts, my-time and create views over HTTP, backed by
//! a local SQLite database.

use anyhow::Result;
use peerpool::{web, Config, Database};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    if std::path::Path::new(".env").exists() {
        dotenvy::dotenv()?;
        info!("Loaded environment variables from .env file");
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Peerpool starting...");

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");
    info!("Time zone: {}", config.schedule.timezone);
    info!("Weekend filter: {:?}", config.schedule.weekend);

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.migrate().await?;
    info!("Database initialized at {}", config.database.path);

    web::serve(config, db).await?;

    info!("Peerpool shutting down");
    Ok(())
}
