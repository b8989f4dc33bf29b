use tracing::warn;

use crate::{
    dao::room_store::RoomStore, dto::health::HealthResponse, state::SharedState,
};

/// Probe the storage backend and report overall health.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded()
        }
    }
}
