use serde::Serialize;
use utoipa::ToSchema;

/// Storage availability as seen by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Storage answers.
    Ok,
    /// Storage is unreachable; writes are refused.
    Degraded,
}

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Storage status.
    pub status: HealthStatus,
    /// Whether the cache is on.
    pub cache_enabled: bool,
    /// Live cache entries.
    pub cache_entries: usize,
}

impl HealthResponse {
    /// Health payload from the storage status and cache stats.
    pub fn new(status: HealthStatus, cache_enabled: bool, cache_entries: usize) -> Self {
        Self {
            status,
            cache_enabled,
            cache_entries,
        }
    }
}
