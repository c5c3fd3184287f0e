#![allow(dead_code)]

use std::{sync::Arc, time::SystemTime};

use bingo_back::{
    config::AppConfig,
    dao::{
        game_store::{GameStore, memory::MemoryGameStore},
        models::{
            BoardEntity, GameEntity, GameListItemEntity, MessageEntity, PhraseEntity,
            PlayerEntity,
        },
        storage::StorageResult,
    },
    state::{AppState, SharedState, board::FixedSeed, player::Player},
};
use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Wraps [`MemoryGameStore`] and counts calls per trait method.
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: MemoryGameStore,
    calls: Arc<DashMap<&'static str, usize>>,
}

impl CountingStore {
    pub fn calls(&self, method: &str) -> usize {
        self.calls.get(method).map(|count| *count).unwrap_or_default()
    }

    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    fn hit(&self, method: &'static str) {
        *self.calls.entry(method).or_default() += 1;
    }
}

impl GameStore for CountingStore {
    fn get_phrases(&self) -> BoxFuture<'static, StorageResult<Vec<PhraseEntity>>> {
        self.hit("get_phrases");
        self.inner.get_phrases()
    }

    fn load_phrases(&self, phrases: Vec<PhraseEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("load_phrases");
        self.inner.load_phrases(phrases)
    }

    fn update_master_phrase(&self, phrase: PhraseEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("update_master_phrase");
        self.inner.update_master_phrase(phrase)
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.hit("find_game");
        self.inner.find_game(id)
    }

    fn list_boards(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<BoardEntity>>> {
        self.hit("list_boards");
        self.inner.list_boards(game_id)
    }

    fn list_messages(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        self.hit("list_messages");
        self.inner.list_messages(game_id)
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("save_game");
        self.inner.save_game(game)
    }

    fn set_game_active(&self, id: Uuid, active: bool) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("set_game_active");
        self.inner.set_game_active(id, active)
    }

    fn set_game_admins(
        &self,
        id: Uuid,
        players: Vec<PlayerEntity>,
        admins: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("set_game_admins");
        self.inner.set_game_admins(id, players, admins)
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.hit("delete_game");
        self.inner.delete_game(id)
    }

    fn list_active_games(
        &self,
        limit: usize,
        before: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        self.hit("list_active_games");
        self.inner.list_active_games(limit, before)
    }

    fn list_games_for_player(
        &self,
        email: String,
        limit: usize,
        before: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        self.hit("list_games_for_player");
        self.inner.list_games_for_player(email, limit, before)
    }

    fn games_created_before(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        self.hit("games_created_before");
        self.inner.games_created_before(cutoff)
    }

    fn find_board(
        &self,
        id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        self.hit("find_board");
        self.inner.find_board(id, game_id)
    }

    fn find_board_for_player(
        &self,
        game_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        self.hit("find_board_for_player");
        self.inner.find_board_for_player(game_id, email)
    }

    fn save_board(&self, board: BoardEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("save_board");
        self.inner.save_board(board)
    }

    fn delete_board(&self, id: Uuid, game_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.hit("delete_board");
        self.inner.delete_board(id, game_id)
    }

    fn save_selection(
        &self,
        game_id: Uuid,
        phrase_id: String,
        player: PlayerEntity,
        selected: bool,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("save_selection");
        self.inner.save_selection(game_id, phrase_id, player, selected)
    }

    fn update_phrase(
        &self,
        game_id: Uuid,
        phrase: PhraseEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("update_phrase");
        self.inner.update_phrase(game_id, phrase)
    }

    fn add_messages(&self, messages: Vec<MessageEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("add_messages");
        self.inner.add_messages(messages)
    }

    fn acknowledge_message(
        &self,
        game_id: Uuid,
        message_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.hit("acknowledge_message");
        self.inner.acknowledge_message(game_id, message_id, email)
    }

    fn add_admin(&self, admin: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("add_admin");
        self.inner.add_admin(admin)
    }

    fn delete_admin(&self, email: String) -> BoxFuture<'static, StorageResult<bool>> {
        self.hit("delete_admin");
        self.inner.delete_admin(email)
    }

    fn list_admins(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        self.hit("list_admins");
        self.inner.list_admins()
    }

    fn is_admin(&self, email: String) -> BoxFuture<'static, StorageResult<bool>> {
        self.hit("is_admin");
        self.inner.is_admin(email)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("health_check");
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.hit("try_reconnect");
        self.inner.try_reconnect()
    }
}

/// Shared state backed by a counting in-memory store and a fixed shuffle seed.
pub async fn setup() -> (SharedState, CountingStore) {
    setup_with(AppConfig::default()).await
}

pub async fn setup_with(config: AppConfig) -> (SharedState, CountingStore) {
    let state = AppState::with_seed(config, Arc::new(FixedSeed(7)));
    let store = CountingStore::default();
    state.set_game_store(Arc::new(store.clone())).await;
    (state, store)
}

pub fn alice() -> Player {
    Player::new("Alice", "alice@example.com")
}

pub fn bob() -> Player {
    Player::new("Bob", "bob@example.com")
}

pub fn carol() -> Player {
    Player::new("Carol", "carol@example.com")
}
