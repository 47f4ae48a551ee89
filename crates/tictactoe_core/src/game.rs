//! Game engine for tic-tac-toe.

use crate::error::MoveError;
use crate::position::Position;
use crate::rules::{has_line, status_of};
use crate::types::{Board, Player, Square};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Current status of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Game is ongoing.
    InProgress,
    /// Game ended in a win.
    Won(Player),
    /// Game ended in a draw.
    Draw,
}

impl GameStatus {
    /// Whether further moves are rejected.
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

/// Tic-tac-toe game: board, player to move and derived status.
///
/// The turn always passes to the opponent after an accepted move, so
/// player 1 is to move exactly when both players have the same number of
/// marks. [`Game::from_parts`] enforces this when rebuilding a game from
/// stored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    turn: Player,
    status: GameStatus,
}

impl Game {
    /// Creates a new game with an empty board. Player 1 always starts.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Player::Player1,
            status: GameStatus::InProgress,
        }
    }

    /// Rebuilds a game from a board and the player to move.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::InvariantViolation`] when the pair could not
    /// have been reached by legal play.
    #[instrument(skip(board))]
    pub fn from_parts(board: Board, turn: Player) -> Result<Self, MoveError> {
        let ones = board.count(Player::Player1);
        let twos = board.count(Player::Player2);

        if ones != twos && ones != twos + 1 {
            warn!(ones, twos, "Board consistency violated");
            return Err(MoveError::InvariantViolation(format!(
                "player1 has {} marks and player2 has {}",
                ones, twos
            )));
        }

        let expected = if ones == twos {
            Player::Player1
        } else {
            Player::Player2
        };
        if turn != expected {
            warn!(?turn, ?expected, "Turn does not match board");
            return Err(MoveError::InvariantViolation(format!(
                "it cannot be {}'s turn with {} marks on the board",
                turn,
                ones + twos
            )));
        }

        let one_won = has_line(&board, Player::Player1);
        let two_won = has_line(&board, Player::Player2);
        if one_won && two_won {
            return Err(MoveError::InvariantViolation(
                "both players hold a winning line".to_string(),
            ));
        }
        // The winner made the last move, after which the turn passed on.
        if (one_won && turn != Player::Player2) || (two_won && turn != Player::Player1) {
            return Err(MoveError::InvariantViolation(
                "play continued after the game was won".to_string(),
            ));
        }

        let status = status_of(&board);
        debug!(?status, "Rebuilt game from parts");
        Ok(Self {
            board,
            turn,
            status,
        })
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the player to move.
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Returns the game status.
    pub fn status(&self) -> &GameStatus {
        &self.status
    }

    /// Splits the game into the two values that are stored between requests.
    pub fn into_parts(self) -> (Board, Player) {
        (self.board, self.turn)
    }

    /// Places the current player's mark at `pos`.
    ///
    /// On success the turn passes to the opponent and the new status is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`MoveError::GameOver`] if the game already has a result
    /// - [`MoveError::SquareOccupied`] if the square is taken
    #[instrument(skip(self), fields(player = %self.turn))]
    pub fn make_move(&mut self, pos: Position) -> Result<GameStatus, MoveError> {
        if self.status.is_over() {
            return Err(MoveError::GameOver);
        }

        if !self.board.is_empty(pos) {
            return Err(MoveError::SquareOccupied(pos));
        }

        self.board.set(pos, Square::Occupied(self.turn));
        self.turn = self.turn.opponent();
        self.status = status_of(&self.board);

        debug!(status = ?self.status, next = %self.turn, "Move applied");
        Ok(self.status)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
