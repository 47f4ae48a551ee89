//! Tic-tac-toe rules without any I/O.
//!
//! The crate models the two players, the 3x3 board and the rules that
//! decide whether a move is legal and whether the game is over. The web
//! front end stores the board and turn in a cache and rebuilds a [`Game`]
//! from them with [`Game::from_parts`] on every request.
//!
//! # Example
//!
//! ```
//! use tictactoe_core::{Game, GameStatus, Player, Position};
//!
//! let mut game = Game::new();
//! game.make_move(Position::Center).unwrap();
//! assert_eq!(game.turn(), Player::Player2);
//! assert_eq!(game.status(), &GameStatus::InProgress);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod game;
mod position;
pub mod rules;
mod types;

pub use error::{BoardError, MoveError};
pub use game::{Game, GameStatus};
pub use position::Position;
pub use types::{Board, Grid, Player, Square, BLANK};
