use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::board::{BoardResponse, GameQuery, RecordRequest},
    error::AppError,
    routes::identity::Caller,
    services::{admin_service, game_service},
    state::{SharedState, board::Board, player::Player},
};

/// Board retrieval, deletion and square selection.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/board", get(get_my_board))
        .route("/api/board/{id}", get(get_board).delete(delete_board))
        .route("/api/record", post(record))
}

/// Only the owner of a board or an admin of its game may act on it.
async fn ensure_board_access(
    state: &SharedState,
    board: &Board,
    caller: &Player,
) -> Result<(), AppError> {
    if board.player.email != caller.email {
        admin_service::require_game_admin(state, board.game_id, caller).await?;
    }
    Ok(())
}

/// Return the caller's board for a game, dealing one on first access.
#[utoipa::path(
    get,
    path = "/api/board",
    tag = "board",
    params(GameQuery, ("X-Player-Email" = String, Header, description = "Caller e-mail")),
    responses(
        (status = 200, description = "Caller board", body = BoardResponse),
        (status = 409, description = "Game no longer active")
    )
)]
pub async fn get_my_board(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Query(query): Query<GameQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = game_service::get_board_for_player(&state, &caller, query.g).await?;
    Ok(Json(BoardResponse::from(&board)))
}

/// Fetch a board by identifier.
#[utoipa::path(
    get,
    path = "/api/board/{id}",
    tag = "board",
    params(
        ("id" = String, Path, description = "Board identifier"),
        GameQuery,
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    responses((status = 200, description = "Board", body = BoardResponse))
)]
pub async fn get_board(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Query(query): Query<GameQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = game_service::get_board(&state, id, query.g).await?;
    ensure_board_access(&state, &board, &caller).await?;
    Ok(Json(BoardResponse::from(&board)))
}

/// Delete a board; its player is told to fetch a fresh one.
#[utoipa::path(
    delete,
    path = "/api/board/{id}",
    tag = "board",
    params(
        ("id" = String, Path, description = "Board identifier"),
        GameQuery,
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    responses((status = 200, description = "Deleted board", body = BoardResponse))
)]
pub async fn delete_board(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Query(query): Query<GameQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = game_service::get_board(&state, id, query.g).await?;
    ensure_board_access(&state, &board, &caller).await?;
    let board = game_service::delete_board(&state, id, query.g).await?;
    Ok(Json(BoardResponse::from(&board)))
}

/// Select or unselect a square on the caller's board.
#[utoipa::path(
    post,
    path = "/api/record",
    tag = "board",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    request_body = RecordRequest,
    responses((status = 200, description = "Updated board", body = BoardResponse))
)]
pub async fn record(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<RecordRequest>>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = game_service::get_board(&state, payload.board, payload.game).await?;
    if board.player.email != caller.email {
        return Err(AppError::Forbidden(format!(
            "board `{}` belongs to another player",
            payload.board
        )));
    }
    let board = game_service::record_select(
        &state,
        payload.board,
        payload.game,
        &payload.phrase,
        payload.selected,
    )
    .await?;
    Ok(Json(BoardResponse::from(&board)))
}
