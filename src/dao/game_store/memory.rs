//! Process-local [`GameStore`] used for development and tests.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{
        BoardEntity, GameEntity, GameListItemEntity, MessageEntity, PhraseEntity, PlayerEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Failures of the in-memory store.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// Forced offline with [`MemoryGameStore::set_offline`].
    #[error("in-memory store is offline")]
    Offline,
    /// A board was written for a game the store does not hold.
    #[error("board `{board_id}` refers to unknown game `{game_id}`")]
    UnknownGame {
        /// Board being written.
        board_id: Uuid,
        /// Game it claims to belong to.
        game_id: Uuid,
    },
}

impl From<MemoryStoreError> for StorageError {
    fn from(err: MemoryStoreError) -> Self {
        match err {
            MemoryStoreError::Offline => StorageError::unavailable(err.to_string(), err),
            MemoryStoreError::UnknownGame { .. } => StorageError::Rejected(err.to_string()),
        }
    }
}

#[derive(Default)]
struct MemoryState {
    phrases: IndexMap<String, PhraseEntity>,
    games: HashMap<Uuid, GameEntity>,
    boards: HashMap<Uuid, BoardEntity>,
    messages: Vec<MessageEntity>,
    admins: Vec<PlayerEntity>,
}

#[derive(Default)]
struct MemoryInner {
    state: RwLock<MemoryState>,
    offline: AtomicBool,
}

/// Game store backed by in-process maps. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

impl MemoryGameStore {
    /// Empty store, online.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails until the store is back online.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(MemoryStoreError::Offline.into());
        }
        Ok(())
    }

    /// Run `f` against a read guard once the store is known to be online.
    fn read<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&MemoryState) -> T + Send + 'static,
    {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let guard = store.inner.state.read().await;
            Ok(f(&guard))
        })
    }

    fn write<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut MemoryState) -> T + Send + 'static,
    {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut guard = store.inner.state.write().await;
            Ok(f(&mut guard))
        })
    }

    /// Like [`Self::write`] for mutations that can refuse the request.
    fn try_write<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut MemoryState) -> Result<T, MemoryStoreError> + Send + 'static,
    {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut guard = store.inner.state.write().await;
            f(&mut guard).map_err(Into::into)
        })
    }
}

fn newest_first(
    games: impl Iterator<Item = GameEntity>,
    limit: usize,
    before: SystemTime,
) -> Vec<GameListItemEntity> {
    let mut games: Vec<GameEntity> = games
        .filter(|game| game.active && game.created_at < before)
        .collect();
    games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    games.truncate(limit);
    games.into_iter().map(Into::into).collect()
}

fn add_player(players: &mut Vec<PlayerEntity>, player: PlayerEntity) {
    if !players.iter().any(|existing| existing.email == player.email) {
        players.push(player);
    }
}

impl GameStore for MemoryGameStore {
    fn get_phrases(&self) -> BoxFuture<'static, StorageResult<Vec<PhraseEntity>>> {
        self.read(|state| state.phrases.values().cloned().collect())
    }

    fn load_phrases(&self, phrases: Vec<PhraseEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| {
            for phrase in phrases {
                state.phrases.insert(phrase.id.clone(), phrase);
            }
        })
    }

    fn update_master_phrase(&self, phrase: PhraseEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| {
            state.phrases.insert(phrase.id.clone(), phrase);
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.read(move |state| state.games.get(&id).cloned())
    }

    fn list_boards(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<BoardEntity>>> {
        self.read(move |state| {
            state
                .boards
                .values()
                .filter(|board| board.game_id == game_id)
                .cloned()
                .collect()
        })
    }

    fn list_messages(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        self.read(move |state| {
            state
                .messages
                .iter()
                .filter(|message| message.game_id == game_id)
                .cloned()
                .collect()
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| {
            state.games.insert(game.id, game);
        })
    }

    fn set_game_active(&self, id: Uuid, active: bool) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| {
            if let Some(game) = state.games.get_mut(&id) {
                game.active = active;
            }
        })
    }

    fn set_game_admins(
        &self,
        id: Uuid,
        players: Vec<PlayerEntity>,
        admins: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| {
            if let Some(game) = state.games.get_mut(&id) {
                for player in players {
                    add_player(&mut game.players, player);
                }
                game.admins = admins;
            }
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |state| {
            state.boards.retain(|_, board| board.game_id != id);
            state.messages.retain(|message| message.game_id != id);
            state.games.remove(&id).is_some()
        })
    }

    fn list_active_games(
        &self,
        limit: usize,
        before: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        self.read(move |state| newest_first(state.games.values().cloned(), limit, before))
    }

    fn list_games_for_player(
        &self,
        email: String,
        limit: usize,
        before: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        self.read(move |state| {
            let games = state
                .games
                .values()
                .filter(|game| game.players.iter().any(|player| player.email == email))
                .cloned();
            newest_first(games, limit, before)
        })
    }

    fn games_created_before(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        self.read(move |state| {
            state
                .games
                .values()
                .filter(|game| game.created_at < cutoff)
                .map(|game| game.id)
                .collect()
        })
    }

    fn find_board(
        &self,
        id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        self.read(move |state| {
            state
                .boards
                .get(&id)
                .filter(|board| board.game_id == game_id)
                .cloned()
        })
    }

    fn find_board_for_player(
        &self,
        game_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        self.read(move |state| {
            state
                .boards
                .values()
                .find(|board| board.game_id == game_id && board.player.email == email)
                .cloned()
        })
    }

    fn save_board(&self, board: BoardEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.try_write(move |state| {
            let Some(game) = state.games.get_mut(&board.game_id) else {
                return Err(MemoryStoreError::UnknownGame {
                    board_id: board.id,
                    game_id: board.game_id,
                });
            };
            add_player(&mut game.players, board.player.clone());
            state.boards.insert(board.id, board);
            Ok(())
        })
    }

    fn delete_board(&self, id: Uuid, game_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |state| {
            let Some(board) = state.boards.remove(&id) else {
                return false;
            };
            if let Some(game) = state.games.get_mut(&game_id) {
                for record in &mut game.records {
                    record
                        .players
                        .retain(|player| player.email != board.player.email);
                    record.phrase.selected = !record.players.is_empty();
                }
            }
            true
        })
    }

    fn save_selection(
        &self,
        game_id: Uuid,
        phrase_id: String,
        player: PlayerEntity,
        selected: bool,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| {
            let Some(game) = state.games.get_mut(&game_id) else {
                return;
            };
            let Some(record) = game
                .records
                .iter_mut()
                .find(|record| record.phrase.id == phrase_id)
            else {
                return;
            };
            if selected {
                add_player(&mut record.players, player);
            } else {
                record.players.retain(|existing| existing.email != player.email);
            }
            record.phrase.selected = !record.players.is_empty();
        })
    }

    fn update_phrase(
        &self,
        game_id: Uuid,
        phrase: PhraseEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| {
            let Some(game) = state.games.get_mut(&game_id) else {
                return;
            };
            if let Some(record) = game
                .records
                .iter_mut()
                .find(|record| record.phrase.id == phrase.id)
            {
                record.phrase.text = phrase.text;
                record.phrase.selected = false;
                record.players.clear();
            }
        })
    }

    fn add_messages(&self, messages: Vec<MessageEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| state.messages.extend(messages))
    }

    fn acknowledge_message(
        &self,
        game_id: Uuid,
        message_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |state| {
            let Some(message) = state
                .messages
                .iter_mut()
                .find(|message| message.id == message_id && message.game_id == game_id)
            else {
                return false;
            };
            if !message.received_by.contains(&email) {
                message.received_by.push(email);
            }
            true
        })
    }

    fn add_admin(&self, admin: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |state| add_player(&mut state.admins, admin))
    }

    fn delete_admin(&self, email: String) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |state| {
            let before = state.admins.len();
            state.admins.retain(|admin| admin.email != email);
            before != state.admins.len()
        })
    }

    fn list_admins(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        self.read(|state| state.admins.clone())
    }

    fn is_admin(&self, email: String) -> BoxFuture<'static, StorageResult<bool>> {
        self.read(move |state| state.admins.iter().any(|admin| admin.email == email))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dao::models::RecordEntity;

    fn player(email: &str) -> PlayerEntity {
        PlayerEntity {
            name: email.into(),
            email: email.into(),
        }
    }

    fn game(created_at: SystemTime) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            name: "g".into(),
            active: true,
            created_at,
            players: vec![player("a@x.com")],
            admins: vec![player("a@x.com")],
            records: vec![RecordEntity {
                phrase: PhraseEntity {
                    id: "1".into(),
                    text: "one".into(),
                    selected: false,
                    column: None,
                    row: None,
                    display_order: 0,
                },
                players: Vec::new(),
            }],
        }
    }

    #[tokio::test]
    async fn selections_update_only_the_targeted_record() {
        let store = MemoryGameStore::new();
        let game = game(SystemTime::now());
        store.save_game(game.clone()).await.unwrap();

        store
            .save_selection(game.id, "1".into(), player("p@x.com"), true)
            .await
            .unwrap();
        store
            .save_selection(game.id, "1".into(), player("q@x.com"), true)
            .await
            .unwrap();
        store
            .save_selection(game.id, "1".into(), player("p@x.com"), false)
            .await
            .unwrap();

        let stored = store.find_game(game.id).await.unwrap().unwrap();
        let record = &stored.records[0];
        assert!(record.phrase.selected);
        assert_eq!(record.players, vec![player("q@x.com")]);
    }

    #[tokio::test]
    async fn boards_for_unknown_games_are_rejected() {
        let store = MemoryGameStore::new();
        let board = BoardEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            player: player("p@x.com"),
            bingo_declared: false,
            free_phrase: None,
            phrases: Vec::new(),
        };

        let err = store.save_board(board.clone()).await.unwrap_err();
        assert!(err.is_rejected());
        assert!(store.find_board(board.id, board.game_id).await.unwrap().is_none());

        let game = game(SystemTime::now());
        store.save_game(game.clone()).await.unwrap();
        let board = BoardEntity {
            game_id: game.id,
            ..board
        };
        store.save_board(board.clone()).await.unwrap();
        let stored = store.find_game(game.id).await.unwrap().unwrap();
        assert!(stored.players.contains(&player("p@x.com")));
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_skip_inactive_games() {
        let store = MemoryGameStore::new();
        let now = SystemTime::now();
        let old = game(now - Duration::from_secs(60));
        let new = game(now - Duration::from_secs(10));
        let mut inactive = game(now - Duration::from_secs(5));
        inactive.active = false;
        for game in [&old, &new, &inactive] {
            store.save_game(game.clone()).await.unwrap();
        }

        let listed = store.list_active_games(10, now).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|game| game.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);

        let limited = store.list_active_games(1, now).await.unwrap();
        assert_eq!(limited.len(), 1);

        let cutoff = store.games_created_before(now - Duration::from_secs(30)).await.unwrap();
        assert_eq!(cutoff, vec![old.id]);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryGameStore::new();
        store.set_offline(true);
        assert!(store.health_check().await.is_err());
        assert!(store.find_game(Uuid::new_v4()).await.is_err());

        store.set_offline(false);
        assert!(store.try_reconnect().await.is_ok());
    }
}
