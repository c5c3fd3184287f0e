use std::error::Error;
use thiserror::Error;

/// Result alias for game store calls.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a game store, whichever backend is installed.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or the call failed mid-flight.
    #[error("game store unavailable: {message}")]
    Unavailable {
        /// Backend description of the failure.
        message: String,
        /// Underlying driver error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend refused a write that would leave orphaned data, such as a
    /// board for a game it does not hold.
    #[error("game store rejected write: {0}")]
    Rejected(String),
}

impl StorageError {
    /// Wrap a backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Whether the store is healthy but refused the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, StorageError::Rejected(_))
    }
}
