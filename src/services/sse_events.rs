//! Conversion from change-feed events to SSE payloads.

use crate::{
    dao::room_store::ChangeEvent,
    dto::sse::{ChangeNotification, ServerEvent},
};

/// Wrap a change signal for the wire. The SSE event name is the table name,
/// and the payload repeats the signal fields; clients re-fetch the affected
/// collection rather than reading row data out of the event.
pub fn change_notification(event: ChangeEvent) -> ServerEvent {
    ServerEvent::json(
        Some(event.table.as_str().to_string()),
        &ChangeNotification {
            table: event.table,
            op: event.op,
            room_id: event.room_id,
        },
    )
    .unwrap_or_else(|_| {
        ServerEvent::new(
            Some(event.table.as_str().to_string()),
            event.table.as_str().to_string(),
        )
    })
}

/// Send a human-readable info message onto a room stream.
pub fn info_message(message: &str) -> ServerEvent {
    ServerEvent::new(Some("info".to_string()), message.to_string())
}
