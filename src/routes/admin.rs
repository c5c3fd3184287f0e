use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    cache::ADMIN_LIST_KEY,
    dto::{
        board::PhraseUpdateRequest,
        game::{CacheClearResponse, GameListItem, GamesQuery, PurgeResponse},
        player::{AdminRemoval, AdminRequest, IsAdminResponse, PlayerSummary},
    },
    error::AppError,
    routes::identity::Caller,
    services::{admin_service, game_service},
    state::SharedState,
};

/// Endpoints reserved to global admins, plus the admin self-check.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/games", get(list_games))
        .route("/api/games/purge", post(purge_games))
        .route("/api/phrase", put(update_master_phrase))
        .route(
            "/api/admins",
            get(list_admins).post(add_admin).delete(delete_admin),
        )
        .route("/api/player/isadmin", get(is_admin))
        .route("/api/cache/clear", post(clear_cache))
}

/// Active games, newest first.
#[utoipa::path(
    get,
    path = "/api/games",
    tag = "admin",
    params(GamesQuery, ("X-Player-Email" = String, Header, description = "Caller e-mail")),
    responses((status = 200, description = "Games", body = [GameListItem]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Query(query)): Valid<Query<GamesQuery>>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    admin_service::require_global_admin(&state, &caller).await?;
    let games =
        game_service::get_games_for_key(&state, ADMIN_LIST_KEY, query.limit, query.before())
            .await?;
    Ok(Json(games.into_iter().map(Into::into).collect()))
}

/// Delete games older than the configured retention.
#[utoipa::path(
    post,
    path = "/api/games/purge",
    tag = "admin",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    responses((status = 200, description = "Purged games", body = PurgeResponse))
)]
pub async fn purge_games(
    State(state): State<SharedState>,
    Caller(caller): Caller,
) -> Result<Json<PurgeResponse>, AppError> {
    admin_service::require_global_admin(&state, &caller).await?;
    let purged = admin_service::purge_old_games(&state).await?;
    Ok(Json(PurgeResponse { purged }))
}

/// Replace a phrase of the master pool used for future games.
#[utoipa::path(
    put,
    path = "/api/phrase",
    tag = "admin",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    request_body = PhraseUpdateRequest,
    responses((status = 204, description = "Phrase updated"))
)]
pub async fn update_master_phrase(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<PhraseUpdateRequest>>,
) -> Result<StatusCode, AppError> {
    admin_service::require_global_admin(&state, &caller).await?;
    game_service::update_master_phrase(&state, payload.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List global admins.
#[utoipa::path(
    get,
    path = "/api/admins",
    tag = "admin",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    responses((status = 200, description = "Global admins", body = [PlayerSummary]))
)]
pub async fn list_admins(
    State(state): State<SharedState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    let admins = admin_service::get_admins(&state).await?;
    if !admins.iter().any(|admin| admin.email == caller.email) {
        return Err(AppError::Forbidden(format!(
            "`{}` is not an administrator",
            caller.email
        )));
    }
    Ok(Json(admins.iter().map(PlayerSummary::from).collect()))
}

/// Grant global admin rights.
#[utoipa::path(
    post,
    path = "/api/admins",
    tag = "admin",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    request_body = AdminRequest,
    responses((status = 204, description = "Admin added"))
)]
pub async fn add_admin(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<AdminRequest>>,
) -> Result<StatusCode, AppError> {
    admin_service::require_global_admin(&state, &caller).await?;
    admin_service::add_admin(&state, payload.into_player()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Revoke global admin rights.
#[utoipa::path(
    delete,
    path = "/api/admins",
    tag = "admin",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    request_body = AdminRemoval,
    responses(
        (status = 204, description = "Admin removed"),
        (status = 404, description = "Not an admin")
    )
)]
pub async fn delete_admin(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<AdminRemoval>>,
) -> Result<StatusCode, AppError> {
    admin_service::require_global_admin(&state, &caller).await?;
    if admin_service::delete_admin(&state, &payload.email).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "`{}` is not an administrator",
            payload.email
        )))
    }
}

/// Whether the caller is a global admin.
#[utoipa::path(
    get,
    path = "/api/player/isadmin",
    tag = "admin",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    responses((status = 200, description = "Admin flag", body = IsAdminResponse))
)]
pub async fn is_admin(
    State(state): State<SharedState>,
    Caller(caller): Caller,
) -> Result<Json<IsAdminResponse>, AppError> {
    let admin = admin_service::is_admin(&state, &caller.email).await?;
    Ok(Json(IsAdminResponse { admin }))
}

/// Evict every cache entry.
#[utoipa::path(
    post,
    path = "/api/cache/clear",
    tag = "admin",
    params(("X-Player-Email" = String, Header, description = "Caller e-mail")),
    responses((status = 200, description = "Cache cleared", body = CacheClearResponse))
)]
pub async fn clear_cache(
    State(state): State<SharedState>,
    Caller(caller): Caller,
) -> Result<Json<CacheClearResponse>, AppError> {
    admin_service::require_global_admin(&state, &caller).await?;
    let evicted = admin_service::clear_cache(&state);
    Ok(Json(CacheClearResponse { evicted }))
}
