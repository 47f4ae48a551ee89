//! Endpoint authorization.
//!
//! Runs after routing, so the policy belongs to the resolved endpoint.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::routing::{Action, Endpoint};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::{debug, instrument, warn};

/// Who may run an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Anyone.
    Anonymous,
    /// Requests carrying `Authorization: Bearer <token>`.
    RequireToken(String),
}

impl Policy {
    /// Policy of an endpoint under the given configuration.
    ///
    /// Only the reset action is ever guarded, and only when a reset
    /// token is configured.
    pub fn for_endpoint(endpoint: &Endpoint, config: &AppConfig) -> Self {
        match (endpoint.action, config.reset_token()) {
            (Action::Reset, Some(token)) => Policy::RequireToken(token.clone()),
            _ => Policy::Anonymous,
        }
    }

    /// Checks the request headers against the policy.
    #[instrument(skip_all)]
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let expected = match self {
            Policy::Anonymous => return Ok(()),
            Policy::RequireToken(token) => token,
        };

        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if token == expected => {
                debug!("Bearer token accepted");
                Ok(())
            }
            Some(_) => {
                warn!("Bearer token rejected");
                Err(AppError::Unauthorized)
            }
            None => {
                debug!("No bearer token presented");
                Err(AppError::Unauthorized)
            }
        }
    }
}
