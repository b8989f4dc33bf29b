use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::common::ClientConfigResponse,
    dto::player::PlayerResponse,
    dto::room::{
        CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse, RoomResponse,
        UpdateConfigRequest, UpdateStatusRequest,
    },
    error::AppError,
    services::{player_service, room_service},
    state::SharedState,
};

/// Routes handling room lifecycle and the players inside a room.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(get_room))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/status", post(update_status))
        .route("/rooms/{code}/config", patch(update_config))
        .route("/rooms/{code}/players", get(list_players))
        .route("/players/{id}/heartbeat", post(heartbeat))
        .route("/config", get(client_config))
}

/// Create a room and its host player.
#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = CreateRoomResponse),
        (status = 409, description = "Room code already in use")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateRoomRequest>>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    let (room, host) = room_service::create_room(&state, payload).await?;
    Ok(Json(CreateRoomResponse {
        room: room.into(),
        host: host.into(),
    }))
}

/// Fetch a room by its code (case-insensitive).
#[utoipa::path(
    get,
    path = "/api/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "The room", body = RoomResponse),
        (status = 404, description = "No room with that code")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    Ok(Json(room.into()))
}

/// Join a room, creating or resuming the player row for the username.
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined", body = JoinRoomResponse),
        (status = 404, description = "No room with that code"),
        (status = 409, description = "The game has already ended")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinRoomRequest>>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    let (room, player) = room_service::join_room(&state, &code, &payload.username).await?;
    Ok(Json(JoinRoomResponse {
        room: room.into(),
        player: player.into(),
    }))
}

/// Move the room to a new lifecycle status (host-driven, trusted).
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/status",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated room", body = RoomResponse)
    )
)]
pub async fn update_status(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let room = room_service::transition_status(&state, room.id, payload.status).await?;
    Ok(Json(room.into()))
}

/// Patch the room configuration.
#[utoipa::path(
    patch,
    path = "/api/rooms/{code}/config",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = UpdateConfigRequest,
    responses(
        (status = 200, description = "Updated room", body = RoomResponse)
    )
)]
pub async fn update_config(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<UpdateConfigRequest>>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let room = room_service::update_config(&state, room.id, payload.into()).await?;
    Ok(Json(room.into()))
}

/// Full roster in join order, host included.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/players",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Players in join order", body = [PlayerResponse])
    )
)]
pub async fn list_players(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<PlayerResponse>>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let players = player_service::list_players(&state, room.id).await?;
    Ok(Json(players.into_iter().map(Into::into).collect()))
}

/// Presence heartbeat; clients call this on a fixed interval.
#[utoipa::path(
    post,
    path = "/api/players/{id}/heartbeat",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Player id")),
    responses(
        (status = 200, description = "Refreshed player", body = PlayerResponse)
    )
)]
pub async fn heartbeat(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerResponse>, AppError> {
    let player = player_service::heartbeat(&state, id).await?;
    Ok(Json(player.into()))
}

/// Client-facing configuration: timing constants and the audio flag.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "rooms",
    responses(
        (status = 200, description = "Client configuration", body = ClientConfigResponse)
    )
)]
pub async fn client_config(State(state): State<SharedState>) -> Json<ClientConfigResponse> {
    Json(state.config().into())
}
