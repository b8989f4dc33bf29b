use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/api/rooms/{code}/events",
    tag = "sse",
    params(("code" = String, Path, description = "Room code")),
    responses((status = 200, description = "Room change-signal stream", content_type = "text/event-stream", body = String))
)]
/// Stream a room's change signals to a connected frontend. Each event names
/// the table that changed; the client re-fetches that collection.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, room) = sse_service::subscribe_room(&state, &code).await?;
    info!(room = %room.code, "new room SSE connection");
    Ok(sse_service::to_sse_stream(receiver, room.code))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{code}/events", get(room_stream))
}
