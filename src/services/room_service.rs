//! Room lifecycle: creation, join-by-code, refresh, status transitions and
//! configuration updates.

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    content,
    dao::models::{PlayerEntity, RoomEntity, RoomStatus},
    dao::room_store::{NewPlayer, NewRoom, RoomConfigPatch, RoomStore},
    dto::room::CreateRoomRequest,
    error::ServiceError,
    services::player_service,
    state::SharedState,
};

const CODE_LENGTH: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Create a room plus its host player row.
///
/// The host player's id is generated up front so the room row can reference
/// it as `host_id` from the start; that reference never changes afterwards.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<(RoomEntity, PlayerEntity), ServiceError> {
    let store = state.store();
    let code = match request.code {
        Some(code) => normalize_code(&code)?,
        None => generate_code(),
    };
    let username = request.username.trim();
    let username = if username.is_empty() { "Host" } else { username };

    let host_id = Uuid::new_v4();
    let room = store
        .insert_room(NewRoom {
            code,
            host_id,
            game_mode: request.game_mode,
            topic: request.topic,
            content_pack: Some(request.content_pack.unwrap_or_else(content::default_pack)),
            team_size: request.team_size.unwrap_or(4),
            target_score: request.target_score.unwrap_or(5),
        })
        .await?;

    let host = store
        .insert_player(NewPlayer {
            id: host_id,
            room_id: room.id,
            username: username.to_string(),
            is_host: true,
        })
        .await?;

    info!(room = %room.code, host = %host.username, "room created");
    Ok((room, host))
}

/// Join a room by its code (case-insensitive), creating or resuming the
/// player row for `username`.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    username: &str,
) -> Result<(RoomEntity, PlayerEntity), ServiceError> {
    let store = state.store();
    let room = store
        .find_room_by_code(code.to_string())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))?;

    if room.status.is_terminal() {
        return Err(ServiceError::InvalidState("this game has ended".into()));
    }

    let player = player_service::join_as_player(&store, room.id, username).await?;
    Ok((room, player))
}

/// Resolve a room by its code, case-insensitively.
pub async fn room_by_code(state: &SharedState, code: &str) -> Result<RoomEntity, ServiceError> {
    state
        .store()
        .find_room_by_code(code.to_string())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))
}

/// Re-read the authoritative room row. Used after any change notification.
pub async fn refresh_room(state: &SharedState, room_id: Uuid) -> Result<RoomEntity, ServiceError> {
    state
        .store()
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))
}

/// Write a new room status.
///
/// Callers are trusted to request legal transitions; nothing is rejected
/// here, but edges outside the normal flow are logged for observability.
pub async fn transition_status(
    state: &SharedState,
    room_id: Uuid,
    status: RoomStatus,
) -> Result<RoomEntity, ServiceError> {
    let store = state.store();
    let room = store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;

    if room.status != status && !room.status.expected_next().contains(&status) {
        warn!(
            room = %room.code,
            from = ?room.status,
            to = ?status,
            "unusual status transition requested"
        );
    }

    store.update_room_status(room_id, status).await?;
    refresh_room(state, room_id).await
}

/// Apply a partial configuration update. A provided content pack replaces
/// the stored one wholesale.
pub async fn update_config(
    state: &SharedState,
    room_id: Uuid,
    patch: RoomConfigPatch,
) -> Result<RoomEntity, ServiceError> {
    let store = state.store();
    store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;
    store.update_room_config(room_id, patch).await?;
    refresh_room(state, room_id).await
}

/// Uppercase and validate a caller-supplied room code.
fn normalize_code(code: &str) -> Result<String, ServiceError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != CODE_LENGTH || !code.bytes().all(|b| CODE_CHARSET.contains(&b)) {
        return Err(ServiceError::InvalidInput(format!(
            "room code must be {CODE_LENGTH} letters or digits"
        )));
    }
    Ok(code)
}

/// Six uppercase alphanumeric characters. Uniqueness is not checked here;
/// the store's constraint rejects collisions at insert time.
fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::room_store::memory::MemoryRoomStore;
    use crate::state::AppState;
    use std::sync::Arc;

    fn test_state() -> SharedState {
        AppState::new(Arc::new(MemoryRoomStore::new()), AppConfig::default())
    }

    fn request(code: Option<&str>) -> CreateRoomRequest {
        CreateRoomRequest {
            username: "quinn".into(),
            topic: None,
            game_mode: None,
            team_size: None,
            target_score: None,
            code: code.map(Into::into),
            content_pack: None,
        }
    }

    #[tokio::test]
    async fn create_room_links_host_player() {
        let state = test_state();
        let (room, host) = create_room(&state, request(Some("ROOMAA"))).await.unwrap();

        assert_eq!(room.host_id, host.id);
        assert!(host.is_host);
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.team_size, 4);
        assert_eq!(room.target_score, 5);
        assert!(room.content_pack.is_some());
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict() {
        let state = test_state();
        create_room(&state, request(Some("ROOMAB"))).await.unwrap();

        let err = create_room(&state, request(Some("roomab"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn generated_codes_are_well_formed() {
        let code = generate_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
    }

    #[tokio::test]
    async fn malformed_codes_are_rejected() {
        let state = test_state();
        let err = create_room(&state, request(Some("ab!"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn join_is_case_insensitive_and_idempotent() {
        let state = test_state();
        let (room, _) = create_room(&state, request(Some("ROOMAC"))).await.unwrap();

        let (found, first) = join_room(&state, "roomac", "dana").await.unwrap();
        assert_eq!(found.id, room.id);
        let (_, second) = join_room(&state, "ROOMAC", "dana").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn finished_rooms_cannot_be_joined() {
        let state = test_state();
        let (room, _) = create_room(&state, request(Some("ROOMAD"))).await.unwrap();
        transition_status(&state, room.id, RoomStatus::Finished)
            .await
            .unwrap();

        let err = join_room(&state, "ROOMAD", "late").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let state = test_state();
        let err = join_room(&state, "NOROOM", "dana").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn config_patch_updates_only_provided_fields() {
        let state = test_state();
        let (room, _) = create_room(&state, request(Some("ROOMAE"))).await.unwrap();

        let updated = update_config(
            &state,
            room.id,
            RoomConfigPatch {
                target_score: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.target_score, 7);
        assert_eq!(updated.team_size, room.team_size);
        assert_eq!(updated.content_pack, room.content_pack);
    }
}
