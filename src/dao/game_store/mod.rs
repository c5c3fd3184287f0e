#[cfg(feature = "mongo-store")]
pub mod mongodb;

/// In-process store used by tests and local runs.
pub mod memory;

use std::time::SystemTime;

use crate::dao::models::{
    BoardEntity, GameEntity, GameListItemEntity, MessageEntity, PhraseEntity, PlayerEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the durable store for phrases, games, boards, messages and admins.
///
/// Writes are atomic per document only. Selections are stored with targeted
/// updates so concurrent players never overwrite each other's ledger changes.
pub trait GameStore: Send + Sync {
    /// Master phrase pool.
    fn get_phrases(&self) -> BoxFuture<'static, StorageResult<Vec<PhraseEntity>>>;
    /// Insert or replace phrases of the master pool.
    fn load_phrases(&self, phrases: Vec<PhraseEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the text of one master phrase.
    fn update_master_phrase(&self, phrase: PhraseEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Game by identifier.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Every board of a game.
    fn list_boards(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<BoardEntity>>>;
    /// Messages of a game, oldest first.
    fn list_messages(&self, game_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>>;
    /// Insert or replace the game document.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Flip the active flag of a game.
    fn set_game_active(&self, id: Uuid, active: bool) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the admin set of a game.
    fn set_game_admins(
        &self,
        id: Uuid,
        players: Vec<PlayerEntity>,
        admins: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a game together with its boards and messages.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Active games created before `before`, newest first.
    fn list_active_games(
        &self,
        limit: usize,
        before: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Active games where `email` is a player, newest first.
    fn list_games_for_player(
        &self,
        email: String,
        limit: usize,
        before: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Identifiers of games created before `cutoff`, active or not.
    fn games_created_before(&self, cutoff: SystemTime)
    -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;

    /// Board by identifier within a game.
    fn find_board(
        &self,
        id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>>;
    /// Board owned by `email` in a game.
    fn find_board_for_player(
        &self,
        game_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>>;
    /// Insert or replace a board and register its player on the game.
    fn save_board(&self, board: BoardEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a board and withdraw its player's ledger selections.
    fn delete_board(&self, id: Uuid, game_id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Add or remove a player from the selectors of one ledger record.
    fn save_selection(
        &self,
        game_id: Uuid,
        phrase_id: String,
        player: PlayerEntity,
        selected: bool,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a ledger phrase's text and clear its selectors.
    fn update_phrase(
        &self,
        game_id: Uuid,
        phrase: PhraseEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Append messages to their games.
    fn add_messages(&self, messages: Vec<MessageEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Add `email` to the recipients that received a message.
    fn acknowledge_message(
        &self,
        game_id: Uuid,
        message_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Global admins.
    fn add_admin(&self, admin: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove a global admin. Returns `false` if the e-mail was not one.
    fn delete_admin(&self, email: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Every global admin.
    fn list_admins(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Whether `email` is a global admin.
    fn is_admin(&self, email: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
