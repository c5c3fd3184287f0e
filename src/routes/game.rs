use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        board::PhraseUpdateRequest,
        game::{GameListItem, GameResponse, GamesQuery, NewGameRequest},
        message::MessageResponse,
        player::{AdminRemoval, AdminRequest},
    },
    error::AppError,
    routes::identity::Caller,
    services::{admin_service, game_service},
    state::SharedState,
};

/// Game lifecycle, game admins and message log.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/game/new", post(new_game))
        .route("/api/game/{id}", get(get_game).delete(delete_game))
        .route("/api/game/{id}/deactivate", post(deactivate_game))
        .route("/api/game/{id}/phrase", put(update_game_phrase))
        .route(
            "/api/game/{id}/admins",
            post(add_game_admin).delete(remove_game_admin),
        )
        .route("/api/game/{id}/messages", get(list_messages))
        .route(
            "/api/game/{id}/messages/{message_id}/ack",
            post(acknowledge_message),
        )
        .route("/api/player/games", get(player_games))
}

/// Start a game from the master phrase pool; the caller becomes its admin.
#[utoipa::path(
    post,
    path = "/api/game/new",
    tag = "game",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    request_body = NewGameRequest,
    responses((status = 200, description = "Game created", body = GameResponse))
)]
pub async fn new_game(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<NewGameRequest>>,
) -> Result<Json<GameResponse>, AppError> {
    let game = game_service::new_game(&state, payload.name.trim(), &caller).await?;
    Ok(Json(GameResponse::from(&game)))
}

/// Game snapshot. E-mails other than the caller's are masked unless the caller is an admin.
#[utoipa::path(
    get,
    path = "/api/game/{id}",
    tag = "game",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    responses((status = 200, description = "Game", body = GameResponse))
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let global_admin = admin_service::is_admin(&state, &caller.email).await?;
    let game = game_service::get_game_for_viewer(&state, id, &caller, global_admin).await?;
    Ok(Json(GameResponse::from(&game)))
}

/// Delete a game with its boards and messages.
#[utoipa::path(
    delete,
    path = "/api/game/{id}",
    tag = "game",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    responses((status = 204, description = "Game deleted"))
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    admin_service::require_game_admin(&state, id, &caller).await?;
    game_service::delete_game(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Close a game to further play.
#[utoipa::path(
    post,
    path = "/api/game/{id}/deactivate",
    tag = "game",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    responses((status = 200, description = "Game deactivated", body = GameResponse))
)]
pub async fn deactivate_game(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    admin_service::require_game_admin(&state, id, &caller).await?;
    let game = game_service::deactivate_game(&state, id).await?;
    Ok(Json(GameResponse::from(&game)))
}

/// Edit a phrase in a running game. The square is reset on every board.
#[utoipa::path(
    put,
    path = "/api/game/{id}/phrase",
    tag = "game",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    request_body = PhraseUpdateRequest,
    responses((status = 200, description = "Updated game", body = GameResponse))
)]
pub async fn update_game_phrase(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<PhraseUpdateRequest>>,
) -> Result<Json<GameResponse>, AppError> {
    admin_service::require_game_admin(&state, id, &caller).await?;
    let game = game_service::update_game_phrases(&state, id, payload.into()).await?;
    Ok(Json(GameResponse::from(&game)))
}

/// Grant admin rights on one game.
#[utoipa::path(
    post,
    path = "/api/game/{id}/admins",
    tag = "game",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    request_body = AdminRequest,
    responses((status = 200, description = "Updated game", body = GameResponse))
)]
pub async fn add_game_admin(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<AdminRequest>>,
) -> Result<Json<GameResponse>, AppError> {
    admin_service::require_game_admin(&state, id, &caller).await?;
    let game = admin_service::add_game_admin(&state, id, payload.into_player()).await?;
    Ok(Json(GameResponse::from(&game)))
}

/// Revoke admin rights on one game.
#[utoipa::path(
    delete,
    path = "/api/game/{id}/admins",
    tag = "game",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    request_body = AdminRemoval,
    responses(
        (status = 200, description = "Updated game", body = GameResponse),
        (status = 409, description = "Last admin of the game")
    )
)]
pub async fn remove_game_admin(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<AdminRemoval>>,
) -> Result<Json<GameResponse>, AppError> {
    admin_service::require_game_admin(&state, id, &caller).await?;
    let game = admin_service::remove_game_admin(&state, id, &payload.email).await?;
    Ok(Json(GameResponse::from(&game)))
}

/// Messages addressed to the caller, oldest first.
#[utoipa::path(
    get,
    path = "/api/game/{id}/messages",
    tag = "game",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    responses((status = 200, description = "Messages", body = [MessageResponse]))
)]
pub async fn list_messages(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let messages = game_service::list_messages(&state, id, &caller).await?;
    Ok(Json(
        messages
            .iter()
            .map(|message| MessageResponse::for_player(message, &caller.email))
            .collect(),
    ))
}

/// Mark a message as received by the caller.
#[utoipa::path(
    post,
    path = "/api/game/{id}/messages/{message_id}/ack",
    tag = "game",
    params(
        ("id" = String, Path, description = "Game identifier"),
        ("message_id" = String, Path, description = "Message identifier"),
        ("X-Player-Email" = String, Header, description = "Caller e-mail")
    ),
    responses((status = 200, description = "Acknowledged message", body = MessageResponse))
)]
pub async fn acknowledge_message(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path((id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = game_service::acknowledge_message(&state, id, message_id, &caller).await?;
    Ok(Json(MessageResponse::for_player(&message, &caller.email)))
}

/// Active games the caller plays in, newest first.
#[utoipa::path(
    get,
    path = "/api/player/games",
    tag = "game",
    params(GamesQuery, ("X-Player-Email" = String, Header, description = "Caller e-mail")),
    responses((status = 200, description = "Games", body = [GameListItem]))
)]
pub async fn player_games(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Query(query)): Valid<Query<GamesQuery>>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    let games =
        game_service::get_games_for_key(&state, &caller.email, query.limit, query.before())
            .await?;
    Ok(Json(games.into_iter().map(Into::into).collect()))
}
