//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board). The game engine calls
//! them after every move; the web layer calls them when validating state
//! read back from the cache.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{check_winner, has_line};

use crate::game::GameStatus;
use crate::types::Board;
use tracing::instrument;

/// Derives the game status from the marks on the board.
#[instrument(skip(board))]
pub fn status_of(board: &Board) -> GameStatus {
    if let Some(winner) = check_winner(board) {
        GameStatus::Won(winner)
    } else if is_full(board) {
        GameStatus::Draw
    } else {
        GameStatus::InProgress
    }
}
