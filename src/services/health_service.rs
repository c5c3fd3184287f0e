use tracing::warn;

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

/// Check storage and report whether the service runs degraded.
///
/// A failed check flips the shared degraded flag; the storage supervisor
/// clears it again once the backend recovers.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.game_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                state.update_degraded(true).await;
            }
        }
        None => warn!("no storage backend installed (degraded mode)"),
    }

    let status = if state.is_degraded().await {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    };
    let cache = state.cache();
    HealthResponse::new(status, cache.is_enabled(), cache.len())
}
