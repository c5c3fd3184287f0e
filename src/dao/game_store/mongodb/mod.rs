//! MongoDB implementation of the game store.

mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use store::MongoGameStore;

use error::MongoDaoError;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::UnknownGame { .. } => StorageError::Rejected(err.to_string()),
            err => StorageError::unavailable(err.to_string(), err),
        }
    }
}
