//! Game and board operations. Each mutation loads through the cache, applies the
//! change to the domain aggregate, writes the durable store, then refreshes the
//! cache. Mutations on one game are serialized by [`AppState::lock_game`].
//!
//! [`AppState::lock_game`]: crate::state::AppState::lock_game

use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    cache::ADMIN_LIST_KEY,
    dao::{
        game_store::GameStore,
        models::{BoardEntity, GameEntity, MessageEntity, PhraseEntity, PlayerEntity},
    },
    error::ServiceError,
    services::{cache_aside, notifications},
    state::{
        SharedState,
        board::{Board, BingoTransition},
        game::{Game, GameSummary},
        message::Message,
        phrase::Phrase,
        player::Player,
    },
};

/// Persist messages and append them to the game's log.
async fn post_messages(
    store: &dyn GameStore,
    game: &mut Game,
    messages: Vec<Message>,
) -> Result<(), ServiceError> {
    if messages.is_empty() {
        return Ok(());
    }
    let entities: Vec<MessageEntity> = messages
        .iter()
        .cloned()
        .map(|message| (game.id, message).into())
        .collect();
    store
        .add_messages(entities)
        .await
        .map_err(ServiceError::storage("add messages"))?;
    game.post(messages);
    Ok(())
}

async fn save_board(store: &dyn GameStore, board: &Board) -> Result<(), ServiceError> {
    store
        .save_board(BoardEntity::from(board.clone()))
        .await
        .map_err(ServiceError::storage("save board"))
}

/// Return the player's board for a game, creating it on first access.
pub async fn get_board_for_player(
    state: &SharedState,
    player: &Player,
    game_id: Uuid,
) -> Result<Board, ServiceError> {
    let store = state.require_game_store().await?;
    let (_gate, mut game) = cache_aside::lock_game(state, store.as_ref(), game_id).await?;
    let cache = state.cache();

    if let Some(board) =
        cache_aside::load_board_for_player(state, store.as_ref(), game_id, &player.email).await?
    {
        debug!(game_id = %game_id, board_id = %board.id, "player rejoined");
        game.upsert_board(board.clone());
        let mut messages = vec![notifications::player_rejoined(player)];
        if board.evaluate_bingo() {
            let reports = game.check_board(&board);
            debug!(
                game_id = %game_id,
                board_id = %board.id,
                dubious = reports.is_dubious(),
                "bingo re-reported on rejoin"
            );
            messages.extend(notifications::bingo(
                player,
                BingoTransition::Held,
                &reports,
            ));
        }
        post_messages(store.as_ref(), &mut game, messages).await?;
        cache.save_game(&game);
        return Ok(board);
    }

    if !game.active {
        return Err(ServiceError::Validation(format!(
            "game `{game_id}` is no longer active"
        )));
    }

    let config = state.config();
    let (board, created) = game.new_board(player.clone(), state.seed(), config.free_square());
    let board = board.clone();
    save_board(store.as_ref(), &board).await?;
    if created {
        info!(game_id = %game_id, board_id = %board.id, player = %player.email, "board created");
        post_messages(
            store.as_ref(),
            &mut game,
            vec![notifications::player_joined(player)],
        )
        .await?;
    }

    cache.save_board(&board);
    cache.save_game(&game);
    cache.delete_games_for_key(&player.email);
    Ok(board)
}

/// Fetch a board by identifier within a game.
pub async fn get_board(
    state: &SharedState,
    board_id: Uuid,
    game_id: Uuid,
) -> Result<Board, ServiceError> {
    let store = state.require_game_store().await?;
    cache_aside::load_board(state, store.as_ref(), board_id, game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("board `{board_id}` not found")))
}

/// Create a game from the master phrase pool. The creator becomes its admin.
pub async fn new_game(
    state: &SharedState,
    name: &str,
    player: &Player,
) -> Result<Game, ServiceError> {
    let store = state.require_game_store().await?;
    let config = state.config();

    let mut phrases: Vec<Phrase> = store
        .get_phrases()
        .await
        .map_err(ServiceError::storage("load phrases"))?
        .into_iter()
        .map(Into::into)
        .collect();
    if phrases.is_empty() {
        info!(count = config.default_phrases().len(), "seeding default phrase pool");
        let defaults = config.default_phrases().to_vec();
        store
            .load_phrases(defaults.iter().cloned().map(PhraseEntity::from).collect())
            .await
            .map_err(ServiceError::storage("seed phrases"))?;
        phrases = defaults;
    }

    let mut game = Game::new(name, player.clone(), phrases, config.board_size())?;
    store
        .save_game(GameEntity::from(game.clone()))
        .await
        .map_err(ServiceError::storage("save game"))?;
    post_messages(
        store.as_ref(),
        &mut game,
        vec![notifications::game_started()],
    )
    .await?;
    info!(game_id = %game.id, name = %game.name, admin = %player.email, "game created");

    let cache = state.cache();
    cache.save_game(&game);
    cache.delete_games_for_key(&player.email);
    cache.delete_games_for_key(ADMIN_LIST_KEY);
    Ok(game)
}

/// Load a game through the cache.
pub async fn get_game(state: &SharedState, id: Uuid) -> Result<Game, ServiceError> {
    let store = state.require_game_store().await?;
    cache_aside::require_game(state, store.as_ref(), id).await
}

/// Game snapshot as seen by `viewer`: e-mails are masked unless the viewer manages the game.
pub async fn get_game_for_viewer(
    state: &SharedState,
    id: Uuid,
    viewer: &Player,
    global_admin: bool,
) -> Result<Game, ServiceError> {
    let mut game = get_game(state, id).await?;
    if !global_admin && !game.is_admin(viewer) {
        game.obscure(&viewer.email);
    }
    Ok(game)
}

/// Keys of every listing that may contain the game.
fn listing_keys(game: &Game) -> Vec<String> {
    let mut keys = vec![ADMIN_LIST_KEY.to_owned()];
    keys.extend(game.players.iter().map(|player| player.email.clone()));
    keys.extend(game.boards.values().map(|board| board.player.email.clone()));
    keys.sort();
    keys.dedup();
    keys
}

/// Mark a game inactive so it drops out of every listing.
pub async fn deactivate_game(state: &SharedState, id: Uuid) -> Result<Game, ServiceError> {
    let store = state.require_game_store().await?;
    let (_gate, mut game) = cache_aside::lock_game(state, store.as_ref(), id).await?;

    game.active = false;
    store
        .set_game_active(id, false)
        .await
        .map_err(ServiceError::storage("deactivate game"))?;
    info!(game_id = %id, "game deactivated");

    let cache = state.cache();
    cache.save_game(&game);
    for key in listing_keys(&game) {
        cache.delete_games_for_key(&key);
    }
    Ok(game)
}

/// Delete a game with its boards and messages.
pub async fn delete_game(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    {
        let (_gate, game) = cache_aside::lock_game(state, store.as_ref(), id).await?;
        store
            .delete_game(id)
            .await
            .map_err(ServiceError::storage("delete game"))?;
        info!(game_id = %id, boards = game.boards.len(), "game deleted");

        let cache = state.cache();
        for board in game.boards.values() {
            cache.delete_board(board);
        }
        for key in listing_keys(&game) {
            cache.delete_games_for_key(&key);
        }
        cache.delete_game(id);
    }
    state.forget_game(id);
    Ok(())
}

/// Delete a board, withdraw its selections and tell the player to reset.
pub async fn delete_board(
    state: &SharedState,
    board_id: Uuid,
    game_id: Uuid,
) -> Result<Board, ServiceError> {
    let store = state.require_game_store().await?;
    let (_gate, mut game) = cache_aside::lock_game(state, store.as_ref(), game_id).await?;
    let board = cache_aside::load_board(state, store.as_ref(), board_id, game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("board `{board_id}` not found")))?;

    store
        .delete_board(board_id, game_id)
        .await
        .map_err(ServiceError::storage("delete board"))?;
    game.delete_board(board_id);
    post_messages(
        store.as_ref(),
        &mut game,
        vec![notifications::board_reset(&board.player)],
    )
    .await?;
    info!(game_id = %game_id, board_id = %board_id, player = %board.player.email, "board deleted");

    let cache = state.cache();
    cache.delete_board(&board);
    cache.save_game(&game);
    Ok(board)
}

/// Set the selection of a phrase on a board and propagate it to the ledger.
///
/// Unknown phrases and requests that do not change the board are no-ops.
pub async fn record_select(
    state: &SharedState,
    board_id: Uuid,
    game_id: Uuid,
    phrase_id: &str,
    selected: bool,
) -> Result<Board, ServiceError> {
    let store = state.require_game_store().await?;
    let (_gate, mut game) = cache_aside::lock_game(state, store.as_ref(), game_id).await?;
    let mut board = cache_aside::load_board(state, store.as_ref(), board_id, game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("board `{board_id}` not found")))?;

    if !game.active {
        return Err(ServiceError::Validation(format!(
            "game `{game_id}` is no longer active"
        )));
    }

    match board.set_selection(phrase_id, selected) {
        None => {
            debug!(board_id = %board_id, phrase_id, "ignoring selection of unknown phrase");
            return Ok(board);
        }
        Some(false) => return Ok(board),
        Some(true) => {}
    }

    let player = board.player.clone();
    let transition = board.refresh_bingo();
    game.record_selection(phrase_id, &player, selected);
    game.upsert_board(board.clone());

    save_board(store.as_ref(), &board).await?;
    store
        .save_selection(
            game_id,
            phrase_id.to_owned(),
            PlayerEntity::from(player.clone()),
            selected,
        )
        .await
        .map_err(ServiceError::storage("save selection"))?;

    let mut messages = Vec::new();
    if let Some(phrase) = board.phrases.get(phrase_id) {
        messages.push(notifications::phrase_selected(&player, phrase));
    }
    if transition.has_bingo() {
        let reports = game.check_board(&board);
        info!(
            game_id = %game_id,
            board_id = %board_id,
            player = %player.email,
            ?transition,
            dubious = reports.is_dubious(),
            "bingo on board"
        );
        messages.extend(notifications::bingo(&player, transition, &reports));
    }
    post_messages(store.as_ref(), &mut game, messages).await?;

    let cache = state.cache();
    cache.save_board(&board);
    cache.save_game(&game);
    Ok(board)
}

/// Replace a phrase of the master pool used by future games.
pub async fn update_master_phrase(state: &SharedState, phrase: Phrase) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    store
        .update_master_phrase(phrase.into())
        .await
        .map_err(ServiceError::storage("update master phrase"))
}

/// Edit a phrase of a running game, resetting it on every board.
pub async fn update_game_phrases(
    state: &SharedState,
    game_id: Uuid,
    phrase: Phrase,
) -> Result<Game, ServiceError> {
    let store = state.require_game_store().await?;
    let (_gate, mut game) = cache_aside::lock_game(state, store.as_ref(), game_id).await?;

    let rescinded = game.update_phrase(&phrase).ok_or_else(|| {
        ServiceError::NotFound(format!("phrase `{}` not in game `{game_id}`", phrase.id))
    })?;

    store
        .update_phrase(game_id, phrase.clone().into())
        .await
        .map_err(ServiceError::storage("update game phrase"))?;
    for board in game.boards.values() {
        save_board(store.as_ref(), board).await?;
    }

    let mut messages = vec![notifications::phrase_changed()];
    for board_id in &rescinded {
        if let Some(board) = game.boards.get(board_id) {
            info!(game_id = %game_id, board_id = %board_id, "bingo rescinded by phrase edit");
            messages.extend(notifications::bingo_rescinded(&board.player));
        }
    }
    post_messages(store.as_ref(), &mut game, messages).await?;

    state.cache().update_phrase(&game);
    Ok(game)
}

/// Active games for the admin list key or a player's e-mail.
pub async fn get_games_for_key(
    state: &SharedState,
    key: &str,
    limit: Option<usize>,
    before: Option<SystemTime>,
) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    cache_aside::load_games_for_key(state, store.as_ref(), key, limit, before).await
}

/// Messages of a game addressed to `player`, oldest first.
pub async fn list_messages(
    state: &SharedState,
    game_id: Uuid,
    player: &Player,
) -> Result<Vec<Message>, ServiceError> {
    let game = get_game(state, game_id).await?;
    Ok(game.messages_for(player).into_iter().cloned().collect())
}

/// Record that `player` received a message.
pub async fn acknowledge_message(
    state: &SharedState,
    game_id: Uuid,
    message_id: Uuid,
    player: &Player,
) -> Result<Message, ServiceError> {
    let store = state.require_game_store().await?;
    let (_gate, mut game) = cache_aside::lock_game(state, store.as_ref(), game_id).await?;
    let is_admin = game.is_admin(player);

    let message = game
        .messages
        .iter_mut()
        .find(|message| message.id == message_id && message.is_for(&player.email, is_admin))
        .ok_or_else(|| ServiceError::NotFound(format!("message `{message_id}` not found")))?;

    if message.acknowledge(&player.email) {
        store
            .acknowledge_message(game_id, message_id, player.email.clone())
            .await
            .map_err(ServiceError::storage("acknowledge message"))?;
    }
    let message = message.clone();

    state.cache().save_game(&game);
    Ok(message)
}
