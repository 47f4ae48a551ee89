//! Tic-Tac-Toe web application.
//!
//! A server-rendered game whose entire state is two entries in a
//! process-wide in-memory cache: whose turn it is and the 3x3 board.
//!
//! # Architecture
//!
//! - **Cache**: shared key-value store seeded at startup ([`init_cache`])
//! - **Routing**: conventional `{controller=Game}/{action=Index}/{id?}` route
//! - **Controller**: Game actions reading and writing the cached game
//! - **Middleware**: request logging, panic page, HSTS, HTTPS redirection,
//!   static files and endpoint authorization
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_web::{AppConfig, AppState, MemoryCache, build_router, init_cache};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = MemoryCache::new();
//! init_cache(&cache);
//! let app = build_router(AppState::new(AppConfig::default(), cache)?);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod auth;
mod cache;
mod cli;
mod config;
mod controller;
mod error;
mod middleware;
mod routing;
mod server;
mod store;
mod views;

// Crate-level exports - Configuration
pub use cli::Cli;
pub use config::{AppConfig, ConfigError, ENVIRONMENT_VAR, Environment, Overrides};

// Crate-level exports - Cache
pub use cache::{BOARD_KEY, CacheValue, Entries, MemoryCache, TURN_KEY, blank_grid, init_cache};
pub use store::GameStore;

// Crate-level exports - Routing
pub use auth::Policy;
pub use routing::{
    Action, DEFAULT_ROUTE_NAME, DEFAULT_ROUTE_PATTERN, Endpoint, GAME_CONTROLLER, NamedRoute,
    RouteError, RoutePattern, RouteTable, RouteValues, Segment,
};

// Crate-level exports - Server
pub use controller::GameController;
pub use error::AppError;
pub use middleware::{FORWARDED_PROTO, PanicPage};
pub use server::{AppState, build_router, serve};
