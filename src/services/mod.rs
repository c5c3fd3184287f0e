/// Administration and authorization checks.
pub mod admin_service;
/// Cache-aside reads shared by the service operations.
pub mod cache_aside;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game, board, selection and message operations.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Message composition for game events.
pub mod notifications;
/// Background storage connection supervision.
pub mod storage_supervisor;
