//! Process-wide in-memory cache.
//!
//! The game lives in two entries, [`TURN_KEY`] and [`BOARD_KEY`], written
//! by [`init_cache`] before the server accepts requests. Cloning a
//! [`MemoryCache`] shares the same entries.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tictactoe_core::{BLANK, Grid, Player};
use tracing::{debug, info, instrument};

/// Key holding whose turn it is (`"player1"` or `"player2"`).
pub const TURN_KEY: &str = "turn";

/// Key holding the 3x3 board grid.
pub const BOARD_KEY: &str = "board";

/// A cached value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    /// Text, such as the turn indicator.
    Text(String),
    /// A 3x3 character grid, such as the board.
    Grid(Grid),
}

/// Entries of the cache, keyed by name.
pub type Entries = HashMap<String, CacheValue>;

/// Shared key-value store whose lifetime is the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<Entries>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[instrument]
    pub fn new() -> Self {
        debug!("Creating memory cache");
        Self::default()
    }

    /// Stores a value, replacing any previous one.
    #[instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: CacheValue) {
        self.write().insert(key.to_string(), value);
        debug!(key, "Cache entry set");
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<CacheValue> {
        self.read().get(key).cloned()
    }

    /// Removes and returns the value under `key`.
    #[instrument(skip(self))]
    pub fn remove(&self, key: &str) -> Option<CacheValue> {
        self.write().remove(key)
    }

    /// Whether a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Runs `f` with exclusive access to every entry.
    ///
    /// Use this for read-modify-write sequences that span several keys.
    pub fn update<T>(&self, f: impl FnOnce(&mut Entries) -> T) -> T {
        f(&mut self.write())
    }

    // Entries are always replaced whole, so a panic while holding the lock
    // cannot leave a half-written value behind.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The board every game starts from.
pub fn blank_grid() -> Grid {
    [[BLANK; 3]; 3]
}

/// Writes the starting game into the cache.
///
/// Player 1 always starts, on an empty board.
#[instrument(skip(cache))]
pub fn init_cache(cache: &MemoryCache) {
    cache.update(seed);
    info!("Game cache initialized");
}

/// Writes the starting game into already-locked entries.
pub(crate) fn seed(entries: &mut Entries) {
    entries.insert(
        TURN_KEY.to_string(),
        CacheValue::Text(Player::Player1.to_string()),
    );
    entries.insert(BOARD_KEY.to_string(), CacheValue::Grid(blank_grid()));
}
