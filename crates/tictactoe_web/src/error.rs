//! Request-level errors and how each one is shown to the browser.

use crate::config::Environment;
use crate::views;
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tictactoe_core::MoveError;
use tracing::{error, warn};

/// Error raised while handling a request.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum AppError {
    /// No route or endpoint matched the path.
    #[display("No page at {}", _0)]
    NotFound(#[error(not(source))] String),

    /// Endpoint exists but does not accept the method.
    #[display("Method {} not allowed", _0)]
    MethodNotAllowed(#[error(not(source))] Method),

    /// Malformed route value.
    #[display("Bad request: {}", _0)]
    BadRequest(#[error(not(source))] String),

    /// The endpoint's policy rejected the request.
    #[display("Authorization required")]
    Unauthorized,

    /// The game rejected the move.
    #[display("{}", _0)]
    #[from]
    Move(MoveError),

    /// The cached game could not be read back.
    #[display("Game state is corrupt: {}", _0)]
    CorruptState(#[error(not(source))] String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Move(_) => StatusCode::CONFLICT,
            AppError::CorruptState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error page.
    ///
    /// Outside development, server errors show only the generic error
    /// view so internals never reach the browser.
    pub fn render(self, environment: Environment) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(%status, error = %message, "Request failed");
            let detail = environment.is_development().then_some(message.as_str());
            return (status, Html(views::error(detail))).into_response();
        }

        warn!(%status, error = %message, "Request rejected");
        let mut response = (status, Html(views::problem(status, &message))).into_response();
        if matches!(self, AppError::Unauthorized) {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_core::Position;

    #[test]
    fn test_statuses() {
        assert_eq!(AppError::NotFound("/x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(MoveError::GameOver).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::CorruptState("turn".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_move_error_message() {
        let err = AppError::from(MoveError::SquareOccupied(Position::Center));
        assert_eq!(err.to_string(), "Square Center is already occupied");
    }

    #[test]
    fn test_unauthorized_challenge() {
        let response = AppError::Unauthorized.render(Environment::Production);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[axum::http::header::WWW_AUTHENTICATE], "Bearer");
    }
}
