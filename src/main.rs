//! Online Notes Server

use online_notes::{api, core, db};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Print error to stderr since logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting Online Notes v{}", online_notes::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        token_duration = config.auth.token_duration,
        min_password_length = config.auth.min_password_length,
        bcrypt_cost = config.auth.bcrypt_cost,
        "Auth configuration"
    );

    let users: Arc<dyn db::UserStore> = Arc::new(db::MemoryUserStore::new());
    let state = api::AppState::from_config(&config.auth, users)
        .context("Failed to set up authentication")?;

    let server_url = format!("http://{}:{}", config.server.host, config.server.port);
    let server = api::ApiServer::new(config.server, state);

    info!(url = %server_url, "Server ready - starting to serve requests");

    // Start serving (this will block until shutdown signal)
    server.serve().await?;

    Ok(())
}
