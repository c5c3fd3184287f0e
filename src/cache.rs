//! In-process cache holding JSON snapshots of games, boards and game listings.
//!
//! Entries are serialized on write and deserialized on read so the cache never
//! shares mutable state with callers. A disabled cache behaves as always-miss.

use std::fmt;

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::{
    board::Board,
    game::{Game, GameSummary},
};

/// Listing key used for the global admin view of active games.
pub const ADMIN_LIST_KEY: &str = "admin-list";

/// The requested key has no usable cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cache miss for `{key}`")]
pub struct CacheMiss {
    /// Key that missed.
    pub key: CacheKey,
}

/// Result of a cache read.
pub type CacheResult<T> = Result<T, CacheMiss>;

/// Logical cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Game snapshot by identifier.
    Game(Uuid),
    /// Board by identifier.
    Board(Uuid),
    /// Board of a player within a game.
    PlayerBoard {
        /// Game the board belongs to.
        game_id: Uuid,
        /// Owner of the board.
        email: String,
    },
    /// Game listing for the admin list or a player's e-mail.
    Games(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Game(id) => write!(f, "game-{id}"),
            CacheKey::Board(id) => write!(f, "board-{id}"),
            CacheKey::PlayerBoard { game_id, email } => write!(f, "board-{game_id}_{email}"),
            CacheKey::Games(key) => write!(f, "games-{key}"),
        }
    }
}

/// Whether a key currently holds an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// No entry for the key.
    Cold,
    /// An entry mirrors the last known durable value.
    Warm,
}

/// Concurrent key/value cache for game state.
#[derive(Debug)]
pub struct Cache {
    entries: DashMap<CacheKey, String>,
    enabled: bool,
}

impl Cache {
    /// Empty cache. A disabled cache stores nothing and misses on every read.
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            enabled,
        }
    }

    /// Whether the cache stores anything.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether `key` currently holds an entry.
    pub fn residency(&self, key: &CacheKey) -> Residency {
        if self.enabled && self.entries.contains_key(key) {
            Residency::Warm
        } else {
            Residency::Cold
        }
    }

    fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheResult<T> {
        let miss = || CacheMiss { key: key.clone() };
        if !self.enabled {
            return Err(miss());
        }

        let Some(raw) = self.entries.get(key).map(|entry| entry.value().clone()) else {
            debug!(key = %key, "cache miss");
            return Err(miss());
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                Ok(value)
            }
            Err(err) => {
                warn!(key = %key, error = %err, "evicting unreadable cache entry");
                self.entries.remove(key);
                Err(miss())
            }
        }
    }

    fn set<T: Serialize>(&self, key: CacheKey, value: &T) {
        if !self.enabled {
            return;
        }
        match serde_json::to_string(value) {
            Ok(raw) => {
                self.entries.insert(key, raw);
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to serialize cache entry");
                self.entries.remove(&key);
            }
        }
    }

    /// Remove the given keys.
    pub fn invalidate<'a>(&self, keys: impl IntoIterator<Item = &'a CacheKey>) {
        for key in keys {
            if self.entries.remove(key).is_some() {
                debug!(key = %key, "cache entry invalidated");
            }
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached game snapshot.
    pub fn get_game(&self, id: Uuid) -> CacheResult<Game> {
        self.get(&CacheKey::Game(id))
    }

    /// Store a game snapshot and its boards.
    pub fn save_game(&self, game: &Game) {
        self.set(CacheKey::Game(game.id), game);
    }

    /// Evict a game and its boards.
    pub fn delete_game(&self, id: Uuid) {
        self.invalidate(&[CacheKey::Game(id)]);
    }

    /// Cached board.
    pub fn get_board(&self, id: Uuid) -> CacheResult<Board> {
        self.get(&CacheKey::Board(id))
    }

    /// Board of `email` in a game, looked up by its player key.
    pub fn get_board_for_player(&self, game_id: Uuid, email: &str) -> CacheResult<Board> {
        self.get(&CacheKey::PlayerBoard {
            game_id,
            email: email.to_owned(),
        })
    }

    /// Store a board under both its identifier and its player key.
    pub fn save_board(&self, board: &Board) {
        self.set(CacheKey::Board(board.id), board);
        self.set(
            CacheKey::PlayerBoard {
                game_id: board.game_id,
                email: board.player.email.clone(),
            },
            board,
        );
    }

    /// Drop both keys of a board and the player's game listing.
    pub fn delete_board(&self, board: &Board) {
        self.invalidate(&[
            CacheKey::Board(board.id),
            CacheKey::PlayerBoard {
                game_id: board.game_id,
                email: board.player.email.clone(),
            },
            CacheKey::Games(board.player.email.clone()),
        ]);
    }

    /// Cached listing for the admin list or a player's e-mail.
    pub fn get_games_for_key(&self, key: &str) -> CacheResult<Vec<GameSummary>> {
        self.get(&CacheKey::Games(key.to_owned()))
    }

    /// Store a listing under `games-<key>`.
    pub fn save_games_for_key(&self, key: &str, games: &[GameSummary]) {
        self.set(CacheKey::Games(key.to_owned()), &games);
    }

    /// Evict the listing of `key`.
    pub fn delete_games_for_key(&self, key: &str) {
        self.invalidate(&[CacheKey::Games(key.to_owned())]);
    }

    /// Refresh the game and every board it holds after a game-wide edit.
    pub fn update_phrase(&self, game: &Game) {
        self.save_game(game);
        for board in game.boards.values() {
            self.save_board(board);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        board::FixedSeed,
        phrase::{BOARD_SIZE, Phrase},
        player::Player,
    };

    fn game() -> Game {
        let phrases = (1..=BOARD_SIZE)
            .map(|n| Phrase::new(n.to_string(), format!("phrase {n}")))
            .collect();
        Game::new("Cached", Player::new("A", "a@x.com"), phrases, BOARD_SIZE).unwrap()
    }

    #[test]
    fn keys_render_like_storage_keys() {
        let id = Uuid::nil();
        assert_eq!(CacheKey::Game(id).to_string(), format!("game-{id}"));
        assert_eq!(
            CacheKey::PlayerBoard {
                game_id: id,
                email: "p@x.com".into()
            }
            .to_string(),
            format!("board-{id}_p@x.com")
        );
        assert_eq!(CacheKey::Games(ADMIN_LIST_KEY.into()).to_string(), "games-admin-list");
    }

    #[test]
    fn saved_game_is_returned_as_an_independent_copy() {
        let cache = Cache::new(true);
        let mut game = game();
        assert_eq!(cache.residency(&CacheKey::Game(game.id)), Residency::Cold);

        cache.save_game(&game);
        assert_eq!(cache.residency(&CacheKey::Game(game.id)), Residency::Warm);

        game.name = "mutated after save".into();
        let cached = cache.get_game(game.id).unwrap();
        assert_eq!(cached.name, "Cached");

        cache.delete_game(game.id);
        assert!(cache.get_game(game.id).is_err());
    }

    #[test]
    fn boards_are_reachable_by_id_and_player() {
        let cache = Cache::new(true);
        let mut game = game();
        let board = game
            .new_board(Player::new("P", "p@x.com"), &FixedSeed(1), None)
            .0
            .clone();

        cache.save_board(&board);
        assert_eq!(cache.get_board(board.id).unwrap(), board);
        assert_eq!(cache.get_board_for_player(game.id, "p@x.com").unwrap(), board);

        cache.delete_board(&board);
        assert!(cache.get_board(board.id).is_err());
        assert!(cache.get_board_for_player(game.id, "p@x.com").is_err());
    }

    #[test]
    fn disabled_cache_always_misses() {
        let cache = Cache::new(false);
        let game = game();
        cache.save_game(&game);
        assert_eq!(
            cache.get_game(game.id).unwrap_err(),
            CacheMiss {
                key: CacheKey::Game(game.id)
            }
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn corrupt_entries_are_evicted() {
        let cache = Cache::new(true);
        let key = CacheKey::Game(Uuid::new_v4());
        cache.entries.insert(key.clone(), "{not json".into());
        assert!(cache.get::<Game>(&key).is_err());
        assert_eq!(cache.residency(&key), Residency::Cold);
    }

    #[test]
    fn listings_are_cached_per_key() {
        let cache = Cache::new(true);
        let summary = game().summary();
        cache.save_games_for_key("p@x.com", &[summary.clone()]);
        assert_eq!(cache.get_games_for_key("p@x.com").unwrap(), vec![summary]);
        assert!(cache.get_games_for_key(ADMIN_LIST_KEY).is_err());

        cache.delete_games_for_key("p@x.com");
        assert!(cache.get_games_for_key("p@x.com").is_err());
    }
}
