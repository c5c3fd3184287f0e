//! Library crate for bingo-back, exposing modules for binaries and integration tests.

pub mod cache;
pub mod config;
/// Durable storage: entities, the store trait and its backends.
pub mod dao;
/// Request and response bodies of the HTTP API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes and handlers.
pub mod routes;
/// Game operations on top of the cache and the store.
pub mod services;
/// Application state and the game domain model.
pub mod state;
