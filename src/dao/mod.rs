/// Game, board, message and admin persistence.
pub mod game_store;
/// Persisted entity definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
