use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the healthcheck endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service status string.
    pub status: &'static str,
    /// Whether the storage backend answered the last probe.
    pub storage: bool,
}

impl HealthResponse {
    /// Everything reachable.
    pub fn ok() -> Self {
        Self {
            status: "ok",
            storage: true,
        }
    }

    /// Serving requests but the storage probe failed.
    pub fn degraded() -> Self {
        Self {
            status: "degraded",
            storage: false,
        }
    }
}
