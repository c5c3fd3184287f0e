use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to {action} in collection `{collection}`")]
    Query {
        action: &'static str,
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to update game `{id}` ({action})")]
    UpdateGame {
        id: Uuid,
        action: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("board `{board_id}` refers to unknown game `{game_id}`")]
    UnknownGame { board_id: Uuid, game_id: Uuid },
    #[error("document `{id}` in collection `{collection}` has a malformed identifier")]
    CorruptDocument {
        collection: &'static str,
        id: String,
        #[source]
        source: uuid::Error,
    },
}

impl MongoDaoError {
    pub fn query(
        action: &'static str,
        collection: &'static str,
    ) -> impl FnOnce(MongoError) -> Self {
        move |source| MongoDaoError::Query {
            action,
            collection,
            source,
        }
    }

    pub fn update_game(id: Uuid, action: &'static str) -> impl FnOnce(MongoError) -> Self {
        move |source| MongoDaoError::UpdateGame { id, action, source }
    }
}
