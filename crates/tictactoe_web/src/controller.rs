//! The Game controller.

use crate::error::AppError;
use crate::store::GameStore;
use crate::views;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tictactoe_core::Position;
use tracing::{info, instrument};

/// Where every successful state change sends the browser.
const HOME: &str = "/";

/// Actions over the cached game.
#[derive(Debug, Clone, derive_new::new)]
pub struct GameController {
    store: GameStore,
}

impl GameController {
    /// `Game/Index`: renders the board.
    #[instrument(skip(self))]
    pub fn index(&self) -> Result<Response, AppError> {
        let game = self.store.load()?;
        Ok(Html(views::index(&game, None)).into_response())
    }

    /// `Game/Move/{id}`: places the current player's mark on cell `id`.
    ///
    /// Accepted moves redirect back to the board. Moves the rules reject
    /// re-render the board with the reason at 409.
    #[instrument(skip(self))]
    pub fn play(&self, id: Option<&str>) -> Result<Response, AppError> {
        let id = id.ok_or_else(|| {
            AppError::BadRequest("a cell number (0-8) is required".to_string())
        })?;
        let position = Position::from_label_or_number(id)
            .ok_or_else(|| AppError::BadRequest(format!("{:?} is not a cell (0-8)", id)))?;

        match self.store.play(position) {
            Ok(_) => Ok(Redirect::to(HOME).into_response()),
            Err(AppError::Move(e)) => {
                let game = self.store.load()?;
                let notice = e.to_string();
                let page = Html(views::index(&game, Some(&notice)));
                Ok((StatusCode::CONFLICT, page).into_response())
            }
            Err(e) => Err(e),
        }
    }

    /// `Game/Reset`: starts a new game.
    #[instrument(skip(self))]
    pub fn reset(&self) -> Result<Response, AppError> {
        self.store.reset();
        info!("Game reset");
        Ok(Redirect::to(HOME).into_response())
    }

    /// `Game/Error`: the generic error page.
    #[instrument(skip(self))]
    pub fn error(&self) -> Result<Response, AppError> {
        Ok(Html(views::error(None)).into_response())
    }
}
