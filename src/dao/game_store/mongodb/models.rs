use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    BoardEntity, GameEntity, MessageEntity, PhraseEntity, PlayerEntity, RecordEntity,
};

pub const GAME_COLLECTION: &str = "games";
pub const BOARD_COLLECTION: &str = "boards";
pub const MESSAGE_COLLECTION: &str = "messages";
pub const PHRASE_COLLECTION: &str = "phrases";
pub const ADMIN_COLLECTION: &str = "admins";

fn parse_id(collection: &'static str, id: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(id).map_err(|source| MongoDaoError::CorruptDocument {
        collection,
        id: id.to_owned(),
        source,
    })
}

pub fn doc_id(id: impl ToString) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn player_doc(player: &PlayerEntity) -> Document {
    doc! {"name": player.name.as_str(), "email": player.email.as_str()}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    active: bool,
    created_at: DateTime,
    #[serde(default)]
    players: Vec<PlayerEntity>,
    #[serde(default)]
    admins: Vec<PlayerEntity>,
    #[serde(default)]
    records: Vec<RecordEntity>,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            active: value.active,
            created_at: DateTime::from_system_time(value.created_at),
            players: value.players,
            admins: value.admins,
            records: value.records,
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(GAME_COLLECTION, &value.id)?,
            name: value.name,
            active: value.active,
            created_at: value.created_at.to_system_time(),
            players: value.players,
            admins: value.admins,
            records: value.records,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBoardDocument {
    #[serde(rename = "_id")]
    id: String,
    game_id: String,
    player: PlayerEntity,
    #[serde(default)]
    bingo_declared: bool,
    #[serde(default)]
    free_phrase: Option<String>,
    phrases: Vec<PhraseEntity>,
}

impl MongoBoardDocument {
    pub fn player(&self) -> &PlayerEntity {
        &self.player
    }
}

impl From<BoardEntity> for MongoBoardDocument {
    fn from(value: BoardEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            player: value.player,
            bingo_declared: value.bingo_declared,
            free_phrase: value.free_phrase,
            phrases: value.phrases,
        }
    }
}

impl TryFrom<MongoBoardDocument> for BoardEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoBoardDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(BOARD_COLLECTION, &value.id)?,
            game_id: parse_id(BOARD_COLLECTION, &value.game_id)?,
            player: value.player,
            bingo_declared: value.bingo_declared,
            free_phrase: value.free_phrase,
            phrases: value.phrases,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessageDocument {
    #[serde(rename = "_id")]
    id: String,
    game_id: String,
    text: String,
    audience: Vec<String>,
    #[serde(default)]
    bingo: bool,
    #[serde(default)]
    operation: Option<String>,
    created_at: DateTime,
    #[serde(default)]
    received_by: Vec<String>,
}

impl From<MessageEntity> for MongoMessageDocument {
    fn from(value: MessageEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            text: value.text,
            audience: value.audience,
            bingo: value.bingo,
            operation: value.operation,
            created_at: DateTime::from_system_time(value.created_at),
            received_by: value.received_by,
        }
    }
}

impl TryFrom<MongoMessageDocument> for MessageEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMessageDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(MESSAGE_COLLECTION, &value.id)?,
            game_id: parse_id(MESSAGE_COLLECTION, &value.game_id)?,
            text: value.text,
            audience: value.audience,
            bingo: value.bingo,
            operation: value.operation,
            created_at: value.created_at.to_system_time(),
            received_by: value.received_by,
        })
    }
}

/// Master phrase, keyed by its identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPhraseDocument {
    #[serde(rename = "_id")]
    id: String,
    text: String,
}

impl From<PhraseEntity> for MongoPhraseDocument {
    fn from(value: PhraseEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
        }
    }
}

impl From<MongoPhraseDocument> for PhraseEntity {
    fn from(value: MongoPhraseDocument) -> Self {
        Self {
            id: value.id,
            text: value.text,
            selected: false,
            column: None,
            row: None,
            display_order: 0,
        }
    }
}

/// Global admin, keyed by e-mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAdminDocument {
    #[serde(rename = "_id")]
    email: String,
    #[serde(default)]
    name: String,
}

impl From<PlayerEntity> for MongoAdminDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            email: value.email,
            name: value.name,
        }
    }
}

impl From<MongoAdminDocument> for PlayerEntity {
    fn from(value: MongoAdminDocument) -> Self {
        Self {
            name: value.name,
            email: value.email,
        }
    }
}
