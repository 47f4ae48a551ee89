//! Router assembly and the HTTP server loop.

use crate::auth::Policy;
use crate::cache::{self, MemoryCache};
use crate::config::AppConfig;
use crate::controller::GameController;
use crate::error::AppError;
use crate::middleware::{self, PanicPage};
use crate::routing::{Action, Endpoint, RouteError, RouteTable};
use crate::store::GameStore;
use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::handler::Handler;
use axum::http::{HeaderMap, Method, Uri};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::Response;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, instrument};

/// Everything a request handler can reach.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    routes: Arc<RouteTable>,
    controller: GameController,
    https_port_warned: Arc<AtomicBool>,
}

impl AppState {
    /// Builds the state around an initialized cache, with the default
    /// route table.
    #[instrument(skip_all)]
    pub fn new(config: AppConfig, cache: MemoryCache) -> Result<Self, RouteError> {
        Ok(Self::with_routes(config, cache, RouteTable::conventional()?))
    }

    /// Builds the state with a custom route table.
    pub fn with_routes(config: AppConfig, cache: MemoryCache, routes: RouteTable) -> Self {
        Self {
            config: Arc::new(config),
            routes: Arc::new(routes),
            controller: GameController::new(GameStore::new(cache)),
            https_port_warned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The route table.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Records that a request arrived without an HTTPS port configured.
    /// Returns `true` only the first time.
    pub(crate) fn note_missing_https_port(&self) -> bool {
        !self.https_port_warned.swap(true, Ordering::Relaxed)
    }
}

/// Builds the full request pipeline.
///
/// Outermost first: request logging, panic handler, HSTS (outside
/// development), HTTPS redirection, static files, then routing.
pub fn build_router(state: AppState) -> Router {
    let environment = *state.config().environment();

    let routing = dispatch.with_state(state.clone());
    let static_files = ServeDir::new(state.config().web_root())
        .append_index_html_on_directories(false)
        .call_fallback_on_method_not_allowed(true)
        .fallback(routing);

    let mut app = Router::new()
        .fallback_service(static_files)
        .layer(from_fn_with_state(state.clone(), middleware::https_redirect));

    if !environment.is_development() {
        app = app.layer(from_fn_with_state(state, middleware::hsts));
    }

    app.layer(CatchPanicLayer::custom(PanicPage::new(environment)))
        .layer(from_fn(middleware::log_requests))
}

/// Resolves the route, authorizes and runs the controller action.
#[instrument(skip_all, fields(method = %method, path = %uri.path()))]
async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let environment = *state.config().environment();
    route(&state, &method, &uri, &headers).unwrap_or_else(|e| e.render(environment))
}

fn route(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let path = uri.path();
    let (name, values) = state
        .routes()
        .resolve(path)
        .ok_or_else(|| AppError::NotFound(path.to_string()))?;
    let endpoint =
        Endpoint::lookup(&values).ok_or_else(|| AppError::NotFound(path.to_string()))?;

    if !endpoint.allows(method) {
        return Err(AppError::MethodNotAllowed(method.clone()));
    }

    Policy::for_endpoint(&endpoint, state.config()).authorize(headers)?;

    debug!(route = name, action = %endpoint.action, id = ?values.id(), "Dispatching");
    let controller = &state.controller;
    match endpoint.action {
        Action::Index => controller.index(),
        Action::Move => controller.play(values.id()),
        Action::Reset => controller.reset(),
        Action::Error => controller.error(),
    }
}

/// Initializes the cache and serves until Ctrl+C or SIGTERM.
#[instrument(skip_all, fields(host = %config.host(), port = config.port()))]
pub async fn serve(config: AppConfig) -> Result<()> {
    let cache = MemoryCache::new();
    cache::init_cache(&cache);

    let address = format!("{}:{}", config.host(), config.port());
    let listener = TcpListener::bind(&address).await?;

    let environment = *config.environment();
    let state = AppState::new(config, cache)?;
    let app = build_router(state);

    info!(%environment, "Server ready at http://{}/", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
