use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the bingo backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::board::get_my_board,
        crate::routes::board::get_board,
        crate::routes::board::delete_board,
        crate::routes::board::record,
        crate::routes::game::new_game,
        crate::routes::game::get_game,
        crate::routes::game::delete_game,
        crate::routes::game::deactivate_game,
        crate::routes::game::update_game_phrase,
        crate::routes::game::add_game_admin,
        crate::routes::game::remove_game_admin,
        crate::routes::game::list_messages,
        crate::routes::game::acknowledge_message,
        crate::routes::game::player_games,
        crate::routes::admin::list_games,
        crate::routes::admin::purge_games,
        crate::routes::admin::update_master_phrase,
        crate::routes::admin::list_admins,
        crate::routes::admin::add_admin,
        crate::routes::admin::delete_admin,
        crate::routes::admin::is_admin,
        crate::routes::admin::clear_cache,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::board::BoardResponse,
            crate::dto::board::PhraseSummary,
            crate::dto::board::RecordRequest,
            crate::dto::board::PhraseUpdateRequest,
            crate::dto::game::NewGameRequest,
            crate::dto::game::GameResponse,
            crate::dto::game::GameListItem,
            crate::dto::game::RecordSummary,
            crate::dto::game::PurgeResponse,
            crate::dto::game::CacheClearResponse,
            crate::dto::message::MessageResponse,
            crate::dto::message::OperationKind,
            crate::dto::player::PlayerSummary,
            crate::dto::player::AdminRequest,
            crate::dto::player::AdminRemoval,
            crate::dto::player::IsAdminResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "board", description = "Player boards and square selection"),
        (name = "game", description = "Game lifecycle, game admins and messages"),
        (name = "admin", description = "Global administration"),
    )
)]
pub struct ApiDoc;
