use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Phrase as stored in the phrase pool, in a ledger record or on a board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhraseEntity {
    /// Stable identifier shared by every copy of the phrase.
    pub id: String,
    /// Display text.
    pub text: String,
    /// Selection flag; board-local on boards, derived from selectors on records.
    #[serde(default)]
    pub selected: bool,
    /// Column letter assigned at board generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Row number assigned at board generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u8>,
    /// Post-shuffle index of the phrase on a board.
    #[serde(default)]
    pub display_order: usize,
}

/// Player identity as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Display name.
    pub name: String,
    /// Unique key of the player.
    pub email: String,
}

/// Ledger record: a phrase and the players who selected it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordEntity {
    /// Master phrase.
    pub phrase: PhraseEntity,
    /// Players who selected the phrase, in selection order.
    #[serde(default)]
    pub players: Vec<PlayerEntity>,
}

/// Game document. Boards and messages live in their own collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name of the game.
    pub name: String,
    /// Whether the game still accepts play.
    pub active: bool,
    /// Creation timestamp, used for listing order and purging.
    pub created_at: SystemTime,
    /// Players holding (or having held) a board.
    pub players: Vec<PlayerEntity>,
    /// Players allowed to manage the game.
    pub admins: Vec<PlayerEntity>,
    /// Master ledger records in load order.
    pub records: Vec<RecordEntity>,
}

/// Game list item (subset of [`GameEntity`]) returned by listing queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameListItemEntity {
    /// Identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether the game still accepts play.
    pub active: bool,
    /// Creation time.
    pub created_at: SystemTime,
    /// Number of players in the game.
    pub player_count: usize,
}

impl From<GameEntity> for GameListItemEntity {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            active: value.active,
            created_at: value.created_at,
            player_count: value.players.len(),
        }
    }
}

/// Board document, one per player and game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardEntity {
    /// Identifier.
    pub id: Uuid,
    /// Game the item belongs to.
    pub game_id: Uuid,
    /// Owner of the board.
    pub player: PlayerEntity,
    /// Sticky bingo flag.
    #[serde(default)]
    pub bingo_declared: bool,
    /// Identifier of the free phrase, if the board has one.
    #[serde(default)]
    pub free_phrase: Option<String>,
    /// Board phrases with their cells and local selection.
    pub phrases: Vec<PhraseEntity>,
}

/// Notification appended to a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEntity {
    /// Identifier.
    pub id: Uuid,
    /// Game the item belongs to.
    pub game_id: Uuid,
    /// HTML fragment shown to the audience.
    pub text: String,
    /// `all`, `admin` or player e-mails.
    pub audience: Vec<String>,
    /// Bingo announcement flag.
    #[serde(default)]
    pub bingo: bool,
    /// Client instruction such as `reset`.
    #[serde(default)]
    pub operation: Option<String>,
    /// Creation time.
    pub created_at: SystemTime,
    /// E-mails of players who acknowledged the message.
    #[serde(default)]
    pub received_by: Vec<String>,
}
