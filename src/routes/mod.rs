use axum::Router;

use crate::state::SharedState;

/// Global administration endpoints.
pub mod admin;
/// Board and selection endpoints.
pub mod board;
/// Swagger UI and OpenAPI document.
pub mod docs;
/// Game endpoints.
pub mod game;
/// Health check endpoint.
pub mod health;
/// Caller identity extraction.
pub mod identity;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(board::router())
        .merge(game::router())
        .merge(admin::router());

    api_router.merge(docs::router()).with_state(state)
}
