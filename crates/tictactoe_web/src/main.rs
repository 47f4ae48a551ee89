//! Tic-Tac-Toe web server.

use anyhow::Result;
use clap::Parser;
use tictactoe_web::{AppConfig, Cli, ENVIRONMENT_VAR};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    let config = AppConfig::resolve(
        cli.config.as_deref(),
        std::env::var(ENVIRONMENT_VAR).ok(),
        cli.overrides(),
    )?;
    info!(environment = %config.environment(), "Starting Tic-Tac-Toe server");

    tictactoe_web::serve(config).await
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tictactoe_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
