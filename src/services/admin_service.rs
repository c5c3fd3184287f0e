//! Administration: global admin membership, per-game admin rights, purging and
//! cache maintenance, plus the authorization checks used by the routes.

use std::time::{Duration, SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    cache::ADMIN_LIST_KEY,
    dao::models::PlayerEntity,
    error::ServiceError,
    services::{cache_aside, game_service},
    state::{SharedState, game::Game, player::Player},
};

/// Address seeded as the only global admin when none are configured.
pub const PLACEHOLDER_ADMIN: &str = "notrealemail";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Grant global admin rights.
pub async fn add_admin(state: &SharedState, admin: Player) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    info!(email = %admin.email, "granting global admin");
    store
        .add_admin(admin.into())
        .await
        .map_err(ServiceError::storage("add admin"))
}

/// Revoke a global admin. Returns `false` when the address was not an admin.
pub async fn delete_admin(state: &SharedState, email: &str) -> Result<bool, ServiceError> {
    let store = state.require_game_store().await?;
    let removed = store
        .delete_admin(email.to_owned())
        .await
        .map_err(ServiceError::storage("delete admin"))?;
    if removed {
        info!(email, "revoked global admin");
    }
    Ok(removed)
}

/// Global admins, seeding the placeholder entry on first use.
pub async fn get_admins(state: &SharedState) -> Result<Vec<Player>, ServiceError> {
    let store = state.require_game_store().await?;
    let admins = store
        .list_admins()
        .await
        .map_err(ServiceError::storage("list admins"))?;
    if !admins.is_empty() {
        return Ok(admins.into_iter().map(Into::into).collect());
    }

    warn!("no global admins configured; seeding placeholder");
    let placeholder = PlayerEntity {
        name: "Admin".to_owned(),
        email: PLACEHOLDER_ADMIN.to_owned(),
    };
    store
        .add_admin(placeholder.clone())
        .await
        .map_err(ServiceError::storage("seed admin"))?;
    Ok(vec![placeholder.into()])
}

/// Whether `email` is a global admin.
pub async fn is_admin(state: &SharedState, email: &str) -> Result<bool, ServiceError> {
    let store = state.require_game_store().await?;
    store
        .is_admin(email.to_owned())
        .await
        .map_err(ServiceError::storage("check admin"))
}

/// Fail with [`ServiceError::Unauthorized`] unless `player` is a global admin.
pub async fn require_global_admin(state: &SharedState, player: &Player) -> Result<(), ServiceError> {
    if is_admin(state, &player.email).await? {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(format!(
            "`{}` is not an administrator",
            player.email
        )))
    }
}

/// Succeeds for admins of the game and for global admins.
pub async fn require_game_admin(
    state: &SharedState,
    game_id: Uuid,
    player: &Player,
) -> Result<Game, ServiceError> {
    let game = game_service::get_game(state, game_id).await?;
    if game.is_admin(player) || is_admin(state, &player.email).await? {
        Ok(game)
    } else {
        Err(ServiceError::Unauthorized(format!(
            "`{}` cannot manage game `{game_id}`",
            player.email
        )))
    }
}

async fn save_game_admins(
    state: &SharedState,
    game: &Game,
    email: &str,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    store
        .set_game_admins(
            game.id,
            game.players.iter().cloned().map(Into::into).collect(),
            game.admins.iter().cloned().map(Into::into).collect(),
        )
        .await
        .map_err(ServiceError::storage("save game admins"))?;

    let cache = state.cache();
    cache.save_game(game);
    cache.delete_games_for_key(email);
    Ok(())
}

/// Grant `player` admin rights on a game, joining them to it if needed.
pub async fn add_game_admin(
    state: &SharedState,
    game_id: Uuid,
    player: Player,
) -> Result<Game, ServiceError> {
    let store = state.require_game_store().await?;
    let (_gate, mut game) = cache_aside::lock_game(state, store.as_ref(), game_id).await?;

    let email = player.email.clone();
    if game.add_admin(player) {
        info!(game_id = %game_id, email = %email, "granted game admin");
        save_game_admins(state, &game, &email).await?;
    }
    Ok(game)
}

/// Revoke game admin rights. A game always keeps at least one admin.
pub async fn remove_game_admin(
    state: &SharedState,
    game_id: Uuid,
    email: &str,
) -> Result<Game, ServiceError> {
    let store = state.require_game_store().await?;
    let (_gate, mut game) = cache_aside::lock_game(state, store.as_ref(), game_id).await?;

    if !game.admins.contains(email) {
        return Err(ServiceError::NotFound(format!(
            "`{email}` is not an admin of game `{game_id}`"
        )));
    }
    if game.admins.len() == 1 {
        return Err(ServiceError::Validation(format!(
            "game `{game_id}` must keep at least one admin"
        )));
    }

    game.remove_admin(email);
    info!(game_id = %game_id, email, "revoked game admin");
    save_game_admins(state, &game, email).await?;
    Ok(game)
}

/// Delete every game older than the configured retention. Returns the deleted identifiers.
pub async fn purge_old_games(state: &SharedState) -> Result<Vec<Uuid>, ServiceError> {
    let store = state.require_game_store().await?;
    let retention = Duration::from_secs(state.config().purge_after_days() * SECONDS_PER_DAY);
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let ids = store
        .games_created_before(cutoff)
        .await
        .map_err(ServiceError::storage("list old games"))?;
    for id in &ids {
        game_service::delete_game(state, *id).await?;
    }

    state.cache().delete_games_for_key(ADMIN_LIST_KEY);
    info!(purged = ids.len(), "purged old games");
    Ok(ids)
}

/// Drop every cache entry. Returns the number of entries evicted.
pub fn clear_cache(state: &SharedState) -> usize {
    let cache = state.cache();
    let evicted = cache.len();
    cache.clear();
    info!(evicted, "cache cleared");
    evicted
}
