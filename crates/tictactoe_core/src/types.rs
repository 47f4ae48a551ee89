//! Core domain types for tic-tac-toe.

use crate::error::BoardError;
use crate::position::Position;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Character used for an empty cell in the grid form of a board.
pub const BLANK: char = ' ';

/// Row-major 3x3 character grid, the form the board takes in the cache.
pub type Grid = [[char; 3]; 3];

/// Player in the game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    /// Player 1 (goes first, marks X).
    Player1,
    /// Player 2 (goes second, marks O).
    Player2,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::Player1 => Player::Player2,
            Player::Player2 => Player::Player1,
        }
    }

    /// The mark this player writes on the board.
    pub fn mark(self) -> char {
        match self {
            Player::Player1 => 'X',
            Player::Player2 => 'O',
        }
    }

    /// Finds the player owning a mark.
    pub fn from_mark(mark: char) -> Option<Self> {
        match mark {
            'X' => Some(Player::Player1),
            'O' => Some(Player::Player2),
            _ => None,
        }
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a player.
    Occupied(Player),
}

impl Square {
    /// Character form of the square.
    pub fn to_char(self) -> char {
        match self {
            Square::Empty => BLANK,
            Square::Occupied(player) => player.mark(),
        }
    }

    /// Parses the character form of a square.
    pub fn from_char(c: char) -> Result<Self, BoardError> {
        if c == BLANK {
            return Ok(Square::Empty);
        }
        Player::from_mark(c)
            .map(Square::Occupied)
            .ok_or(BoardError::InvalidMark(c))
    }
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Checks if every square is occupied.
    pub fn is_full(&self) -> bool {
        self.squares.iter().all(|s| *s != Square::Empty)
    }

    /// Returns all squares in row-major order.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Number of marks the player has on the board.
    pub fn count(&self, player: Player) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(player))
            .count()
    }

    /// Builds a board from its grid form.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidMark`] for any character other than
    /// blank, `X` or `O`.
    #[instrument]
    pub fn from_grid(grid: &Grid) -> Result<Self, BoardError> {
        let mut board = Self::new();
        for pos in Position::ALL {
            let square = Square::from_char(grid[pos.row()][pos.col()])?;
            board.set(pos, square);
        }
        Ok(board)
    }

    /// Converts the board to its grid form.
    pub fn to_grid(&self) -> Grid {
        let mut grid = [[BLANK; 3]; 3];
        for pos in Position::ALL {
            grid[pos.row()][pos.col()] = self.get(pos).to_char();
        }
        grid
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => (pos + 1).to_string(),
                    Square::Occupied(player) => player.mark().to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_text_form() {
        assert_eq!(Player::Player1.to_string(), "player1");
        assert_eq!(Player::Player2.to_string(), "player2");
        assert_eq!("player2".parse::<Player>(), Ok(Player::Player2));
        assert_eq!("Player1".parse::<Player>(), Ok(Player::Player1));
        assert!("player3".parse::<Player>().is_err());
    }

    #[test]
    fn test_marks() {
        assert_eq!(Player::Player1.mark(), 'X');
        assert_eq!(Player::from_mark('O'), Some(Player::Player2));
        assert_eq!(Player::from_mark('?'), None);
    }

    #[test]
    fn test_grid_conversion() {
        let grid = [['X', ' ', ' '], [' ', 'O', ' '], [' ', ' ', 'X']];
        let board = Board::from_grid(&grid).unwrap();
        assert_eq!(board.get(Position::TopLeft), Square::Occupied(Player::Player1));
        assert_eq!(board.get(Position::Center), Square::Occupied(Player::Player2));
        assert_eq!(board.count(Player::Player1), 2);
        assert_eq!(board.to_grid(), grid);
    }

    #[test]
    fn test_grid_rejects_unknown_mark() {
        let mut grid = [[BLANK; 3]; 3];
        grid[2][1] = 'Z';
        assert_eq!(Board::from_grid(&grid), Err(BoardError::InvalidMark('Z')));
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        board.set(Position::Center, Square::Occupied(Player::Player1));
        assert_eq!(board.display(), "1|2|3\n-+-+-\n4|X|6\n-+-+-\n7|8|9");
    }
}
