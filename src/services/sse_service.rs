//! Server-Sent Events stream for a room's change feed.
//!
//! The stream is pure signal fan-out: connected browsers learn *that* a
//! table changed and re-fetch through the REST surface. A dropped stream is
//! silent by design; the client reconnects and reloads everything from
//! scratch.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dao::models::RoomEntity,
    dao::room_store::{ChangeEvent, RoomStore},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Resolve a room by code and subscribe to its change feed.
pub async fn subscribe_room(
    state: &SharedState,
    code: &str,
) -> Result<(broadcast::Receiver<ChangeEvent>, RoomEntity), ServiceError> {
    let store = state.store();
    let room = store
        .find_room_by_code(code.to_string())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))?;
    let receiver = store.subscribe_changes(room.id).await?;
    Ok((receiver, room))
}

/// Convert a change-feed receiver into an SSE response, forwarding signals
/// and cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ChangeEvent>,
    room_code: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from the feed and pushes into the mpsc
    tokio::spawn(async move {
        let _ = tx
            .send(Ok(server_event_to_sse(sse_events::info_message(
                "room stream connected",
            ))))
            .await;

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(change) => {
                            let event =
                                server_event_to_sse(sse_events::change_notification(change));
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skipped signals are recovered by the client's
                            // next full re-fetch; keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(room = %room_code, "room SSE stream disconnected");
    });

    // response stream reads from the mpsc; axum drops it on client disconnect
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn server_event_to_sse(payload: crate::dto::sse::ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
