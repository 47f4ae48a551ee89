//! Request pipeline stages that run around routing.

use crate::config::Environment;
use crate::server::AppState;
use crate::views;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{HOST, STRICT_TRANSPORT_SECURITY};
use axum::http::{HeaderMap, HeaderValue, Response, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect};
use std::any::Any;
use std::time::Instant;
use tower_http::catch_panic::ResponseForPanic;
use tracing::{debug, error, info, warn};

/// Header a TLS-terminating proxy uses to report the original scheme.
pub const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Scheme the client used, as reported by `X-Forwarded-Proto`.
///
/// The server itself only speaks plain HTTP, so a request without the
/// header is treated as `http`.
pub fn request_scheme(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "http".to_string())
}

/// Host name of a `Host` header value, without the port.
pub fn host_name(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal: keep the brackets, drop the port.
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, _port)) => name,
        None => host,
    }
}

/// Where an HTTP request should be sent on HTTPS.
pub fn https_location(host: &str, port: u16, uri: &Uri) -> String {
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let name = host_name(host);
    if port == 443 {
        format!("https://{}{}", name, path)
    } else {
        format!("https://{}:{}{}", name, port, path)
    }
}

fn is_loopback(host: &str) -> bool {
    matches!(
        host_name(host).to_ascii_lowercase().as_str(),
        "localhost" | "127.0.0.1" | "[::1]"
    )
}

/// Logs every request and its outcome.
pub async fn log_requests(req: Request, next: Next) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();
    info!(method = %method, uri = %uri, "Incoming HTTP request");

    let response = next.run(req).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status();
    if status.is_server_error() {
        warn!(%status, %method, %uri, elapsed_ms, "Request failed");
    } else {
        info!(%status, %method, %uri, elapsed_ms, "Response sent");
    }
    response
}

/// Redirects plain HTTP requests to the configured HTTPS port.
///
/// Without a configured port the request passes through; the first such
/// request logs a warning.
pub async fn https_redirect(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    if request_scheme(req.headers()) == "https" {
        return next.run(req).await;
    }

    let Some(port) = *state.config().https_port() else {
        if state.note_missing_https_port() {
            warn!("Failed to determine the https port for redirect");
        }
        return next.run(req).await;
    };

    let Some(host) = req.headers().get(HOST).and_then(|h| h.to_str().ok()) else {
        debug!("No Host header, cannot redirect to https");
        return next.run(req).await;
    };

    let location = https_location(host, port, req.uri());
    debug!(%location, "Redirecting to https");
    Redirect::temporary(&location).into_response()
}

/// Adds `Strict-Transport-Security` to HTTPS responses for non-loopback
/// hosts.
pub async fn hsts(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let secure = request_scheme(req.headers()) == "https";
    let loopback = req
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .is_some_and(is_loopback);

    let mut response = next.run(req).await;

    if secure && !loopback && !response.headers().contains_key(STRICT_TRANSPORT_SECURITY) {
        let value = format!("max-age={}", state.config().hsts_max_age_secs());
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                response.headers_mut().insert(STRICT_TRANSPORT_SECURITY, value);
            }
            Err(e) => error!(error = %e, "Invalid HSTS header value"),
        }
    }
    response
}

/// Turns a panic inside a handler into the error page.
///
/// Development shows the panic message; other environments show only
/// the generic view.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct PanicPage {
    environment: Environment,
}

impl ResponseForPanic for PanicPage {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let message = if let Some(s) = err.downcast_ref::<String>() {
            s.as_str()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s
        } else {
            "unknown panic"
        };
        error!(panic = message, "Handler panicked");

        let detail = self.environment.is_development().then_some(message);
        (StatusCode::INTERNAL_SERVER_ERROR, Html(views::error(detail))).into_response()
    }
}
