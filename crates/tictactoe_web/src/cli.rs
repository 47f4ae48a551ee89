//! Command-line interface for tictactoe_web.

use crate::config::{Environment, Overrides};
use clap::Parser;
use std::path::PathBuf;

/// Tic-Tac-Toe - server-rendered game backed by an in-memory cache
#[derive(Parser, Debug)]
#[command(name = "tictactoe_web")]
#[command(about = "Play tic-tac-toe in the browser", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Port plain HTTP requests are redirected to
    #[arg(long)]
    pub https_port: Option<u16>,

    /// Hosting environment (development, staging, production)
    #[arg(short, long)]
    pub environment: Option<Environment>,

    /// Directory of static files
    #[arg(long)]
    pub web_root: Option<PathBuf>,
}

impl Cli {
    /// Flags that override the configuration file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            https_port: self.https_port,
            environment: self.environment,
            web_root: self.web_root.clone(),
        }
    }
}
