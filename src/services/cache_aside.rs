//! Cache-aside reads: serve from the cache, fall through to the durable store
//! on a miss and repopulate the cache before returning.
//!
//! Two concurrent misses may both repopulate the same key; both write the
//! same durable snapshot so the last write wins harmlessly.

use std::time::SystemTime;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    cache::ADMIN_LIST_KEY,
    dao::game_store::GameStore,
    error::ServiceError,
    state::{SharedState, board::Board, game::Game, game::GameSummary},
};

/// Load a game with its boards and messages.
///
/// A game whose board map is empty is treated as possibly stale and gets its
/// boards re-derived from the durable store.
pub async fn load_game(
    state: &SharedState,
    store: &dyn GameStore,
    id: Uuid,
) -> Result<Option<Game>, ServiceError> {
    let cache = state.cache();
    let mut game = match cache.get_game(id) {
        Ok(game) => game,
        Err(_) => {
            debug!(game_id = %id, "loading game from durable store");
            let Some(entity) = store
                .find_game(id)
                .await
                .map_err(ServiceError::storage("load game"))?
            else {
                return Ok(None);
            };
            let boards = store
                .list_boards(id)
                .await
                .map_err(ServiceError::storage("load game boards"))?;
            let messages = store
                .list_messages(id)
                .await
                .map_err(ServiceError::storage("load game messages"))?;
            let game = Game::from((entity, boards, messages));
            cache.save_game(&game);
            return Ok(Some(game));
        }
    };

    if game.boards.is_empty() {
        let boards = store
            .list_boards(id)
            .await
            .map_err(ServiceError::storage("reload game boards"))?;
        if !boards.is_empty() {
            warn!(game_id = %id, boards = boards.len(), "cached game had no boards; re-derived from store");
            for board in boards {
                game.upsert_board(board.into());
            }
            cache.save_game(&game);
        }
    }

    Ok(Some(game))
}

/// Like [`load_game`] but a missing game is an error.
pub async fn require_game(
    state: &SharedState,
    store: &dyn GameStore,
    id: Uuid,
) -> Result<Game, ServiceError> {
    load_game(state, store, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` not found")))
}

/// Take the game's gate, then load it. The gate is released and dropped from
/// the state when the game cannot be loaded.
pub async fn lock_game(
    state: &SharedState,
    store: &dyn GameStore,
    id: Uuid,
) -> Result<(OwnedMutexGuard<()>, Game), ServiceError> {
    let gate = state.lock_game(id).await;
    match require_game(state, store, id).await {
        Ok(game) => Ok((gate, game)),
        Err(err) => {
            drop(gate);
            state.release_idle_gate(id);
            Err(err)
        }
    }
}

/// Load a board of a game through the cache.
pub async fn load_board(
    state: &SharedState,
    store: &dyn GameStore,
    board_id: Uuid,
    game_id: Uuid,
) -> Result<Option<Board>, ServiceError> {
    let cache = state.cache();
    if let Ok(board) = cache.get_board(board_id) {
        if board.game_id == game_id {
            return Ok(Some(board));
        }
    }

    debug!(board_id = %board_id, game_id = %game_id, "loading board from durable store");
    let board: Option<Board> = store
        .find_board(board_id, game_id)
        .await
        .map_err(ServiceError::storage("load board"))?
        .map(Into::into);
    if let Some(board) = &board {
        cache.save_board(board);
    }
    Ok(board)
}

/// Load the board `email` holds in a game, if any.
pub async fn load_board_for_player(
    state: &SharedState,
    store: &dyn GameStore,
    game_id: Uuid,
    email: &str,
) -> Result<Option<Board>, ServiceError> {
    let cache = state.cache();
    if let Ok(board) = cache.get_board_for_player(game_id, email) {
        return Ok(Some(board));
    }

    debug!(game_id = %game_id, email, "loading player board from durable store");
    let board: Option<Board> = store
        .find_board_for_player(game_id, email.to_owned())
        .await
        .map_err(ServiceError::storage("load player board"))?
        .map(Into::into);
    if let Some(board) = &board {
        cache.save_board(board);
    }
    Ok(board)
}

/// Listing for `key`: the admin list key, or a player's e-mail.
///
/// Only the first page at the default page size is cached, under `games-<key>`.
pub async fn load_games_for_key(
    state: &SharedState,
    store: &dyn GameStore,
    key: &str,
    limit: Option<usize>,
    before: Option<SystemTime>,
) -> Result<Vec<GameSummary>, ServiceError> {
    let default_limit = state.config().default_page_size();
    let cacheable = before.is_none() && limit.is_none_or(|limit| limit == default_limit);
    let cache = state.cache();

    if cacheable {
        if let Ok(games) = cache.get_games_for_key(key) {
            return Ok(games);
        }
    }

    let limit = limit.unwrap_or(default_limit);
    let before = before.unwrap_or_else(SystemTime::now);
    let listing = if key == ADMIN_LIST_KEY {
        store.list_active_games(limit, before)
    } else {
        store.list_games_for_player(key.to_owned(), limit, before)
    };
    let entities = listing
        .await
        .map_err(ServiceError::storage("list games"))?;

    let games: Vec<GameSummary> = entities.into_iter().map(Into::into).collect();
    if cacheable {
        cache.save_games_for_key(key, &games);
    }
    Ok(games)
}
