//! Translation between the cache entries and a [`Game`].

use crate::cache::{self, BOARD_KEY, CacheValue, Entries, MemoryCache, TURN_KEY};
use crate::error::AppError;
use tictactoe_core::{Board, Game, Player, Position};
use tracing::{debug, info, instrument, warn};

/// Reads and writes the game held in the cache.
#[derive(Debug, Clone, derive_new::new)]
pub struct GameStore {
    cache: MemoryCache,
}

impl GameStore {
    /// The underlying cache.
    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    /// Loads the current game.
    ///
    /// # Errors
    ///
    /// [`AppError::CorruptState`] if either entry is missing, has the
    /// wrong kind, or describes a position legal play cannot reach.
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Game, AppError> {
        let turn = self.cache.get(TURN_KEY);
        let board = self.cache.get(BOARD_KEY);
        decode(turn.as_ref(), board.as_ref())
    }

    /// Plays the current player's mark at `position` and stores the result.
    ///
    /// The read, the move and the write happen under one exclusive lock,
    /// so two requests cannot both claim the same turn.
    #[instrument(skip(self))]
    pub fn play(&self, position: Position) -> Result<Game, AppError> {
        self.cache.update(|entries| -> Result<Game, AppError> {
            let mut game = decode(entries.get(TURN_KEY), entries.get(BOARD_KEY))?;
            let player = game.turn();
            let status = game.make_move(position).map_err(|e| {
                warn!(%player, %position, error = %e, "Invalid move");
                AppError::from(e)
            })?;
            encode(entries, &game);
            info!(%player, %position, ?status, "Move accepted");
            Ok(game)
        })
    }

    /// Starts a new game.
    #[instrument(skip(self))]
    pub fn reset(&self) {
        cache::init_cache(&self.cache);
    }
}

fn decode(turn: Option<&CacheValue>, board: Option<&CacheValue>) -> Result<Game, AppError> {
    let turn = match turn {
        Some(CacheValue::Text(text)) => text
            .parse::<Player>()
            .map_err(|_| AppError::CorruptState(format!("unknown turn {:?}", text)))?,
        Some(other) => {
            return Err(AppError::CorruptState(format!(
                "\"{}\" holds {:?} instead of text",
                TURN_KEY, other
            )));
        }
        None => {
            return Err(AppError::CorruptState(format!("\"{}\" is missing", TURN_KEY)));
        }
    };

    let board = match board {
        Some(CacheValue::Grid(grid)) => {
            Board::from_grid(grid).map_err(|e| AppError::CorruptState(e.to_string()))?
        }
        Some(other) => {
            return Err(AppError::CorruptState(format!(
                "\"{}\" holds {:?} instead of a grid",
                BOARD_KEY, other
            )));
        }
        None => {
            return Err(AppError::CorruptState(format!("\"{}\" is missing", BOARD_KEY)));
        }
    };

    let game =
        Game::from_parts(board, turn).map_err(|e| AppError::CorruptState(e.to_string()))?;
    debug!(turn = %game.turn(), status = ?game.status(), "Decoded game");
    Ok(game)
}

fn encode(entries: &mut Entries, game: &Game) {
    entries.insert(
        TURN_KEY.to_string(),
        CacheValue::Text(game.turn().to_string()),
    );
    entries.insert(
        BOARD_KEY.to_string(),
        CacheValue::Grid(game.board().to_grid()),
    );
}
