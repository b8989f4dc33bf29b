use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::room_store::{ChangeOp, StoreTable};

#[derive(Clone, Debug)]
/// Dispatched payload carried on an SSE stream.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Raw data field.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from a plain string payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Body of a change signal forwarded to SSE clients. Carries no row data:
/// the receiving client re-fetches the named table's collection.
pub struct ChangeNotification {
    /// Table the change happened on.
    pub table: StoreTable,
    /// What kind of change it was.
    pub op: ChangeOp,
    /// Room whose rows changed.
    pub room_id: Uuid,
}
