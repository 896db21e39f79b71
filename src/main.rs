use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use murmur::config::{Cli, Config, SECRET_KEY_ENV};
use murmur::state::AppState;
use murmur::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let mut config = Config::load(&cli)?;
    if config.auth.ensure_secret_key() {
        tracing::warn!(
            "No signing key configured (auth.secret_key or {}); using a random one, tokens will not survive a restart",
            SECRET_KEY_ENV
        );
    }
    tracing::debug!(?config, "Loaded configuration");

    // Initialize database
    let db_path = config
        .db_path()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("database path was not resolved"))?;
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::new(pool, config)?;
    let app = routes::app(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
