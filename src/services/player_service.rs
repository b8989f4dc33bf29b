//! Player identity within a room: create, join-or-reconnect, rosters,
//! team membership, presence.

use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, PresenceStatus},
    dao::room_store::{NewPlayer, RoomStore},
    error::ServiceError,
    state::SharedState,
};
use std::sync::Arc;

/// Insert a player row unconditionally. The caller is responsible for not
/// double-creating the host.
pub async fn create_player(
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
    username: &str,
    is_host: bool,
) -> Result<PlayerEntity, ServiceError> {
    let username = normalized_username(username)?;
    Ok(store
        .insert_player(NewPlayer {
            id: Uuid::new_v4(),
            room_id,
            username,
            is_host,
        })
        .await?)
}

/// Find-or-create by (room, username).
///
/// The insert is attempted first; a uniqueness conflict from the store is
/// the signal that the name is taken, in which case the existing row is
/// returned with its presence refreshed (reconnect-by-name). There is no
/// separate existence check to race against.
pub async fn join_as_player(
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
    username: &str,
) -> Result<PlayerEntity, ServiceError> {
    let username = normalized_username(username)?;

    let inserted = store
        .insert_player(NewPlayer {
            id: Uuid::new_v4(),
            room_id,
            username: username.clone(),
            is_host: false,
        })
        .await;

    match inserted {
        Ok(player) => Ok(player),
        Err(err) if err.is_conflict() => {
            let existing = store
                .find_player_by_username(room_id, username.clone())
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("player `{username}` not found"))
                })?;
            store
                .touch_presence(existing.id, PresenceStatus::Online)
                .await?;
            store
                .find_player(existing.id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("player `{username}` not found")))
        }
        Err(err) => Err(err.into()),
    }
}

/// All players of a room, in insertion order.
pub async fn list_players(
    state: &SharedState,
    room_id: Uuid,
) -> Result<Vec<PlayerEntity>, ServiceError> {
    Ok(state.store().list_players(room_id).await?)
}

/// Players of one team, in insertion order.
pub async fn list_players_by_team(
    state: &SharedState,
    room_id: Uuid,
    team_id: Uuid,
) -> Result<Vec<PlayerEntity>, ServiceError> {
    Ok(state.store().list_players_by_team(room_id, team_id).await?)
}

/// Move a player onto a team, or off any team with `None`.
pub async fn set_player_team(
    state: &SharedState,
    player_id: Uuid,
    team_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let store = state.store();
    store
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))?;
    if let Some(team_id) = team_id {
        store
            .find_team(team_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;
    }
    store.set_player_team(player_id, team_id).await?;
    Ok(())
}

/// Presence heartbeat: mark the player online and bump `last_seen`. Clients
/// call this on a fixed interval while connected; nothing on the server ever
/// marks a row offline.
pub async fn heartbeat(state: &SharedState, player_id: Uuid) -> Result<PlayerEntity, ServiceError> {
    let store = state.store();
    store
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))?;
    store
        .touch_presence(player_id, PresenceStatus::Online)
        .await?;
    store
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))
}

fn normalized_username(username: &str) -> Result<String, ServiceError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ServiceError::InvalidInput(
            "username must not be empty".into(),
        ));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::room_store::NewRoom;
    use crate::dao::room_store::memory::MemoryRoomStore;

    async fn seeded_store() -> (Arc<dyn RoomStore>, Uuid) {
        let store: Arc<dyn RoomStore> = Arc::new(MemoryRoomStore::new());
        let room = store
            .insert_room(NewRoom {
                code: "PLYRS1".into(),
                host_id: Uuid::new_v4(),
                game_mode: None,
                topic: None,
                content_pack: None,
                team_size: 4,
                target_score: 5,
            })
            .await
            .unwrap();
        (store, room.id)
    }

    #[tokio::test]
    async fn create_player_always_inserts() {
        let (store, room_id) = seeded_store().await;

        let host = create_player(&store, room_id, "quinn", true).await.unwrap();
        assert!(host.is_host);
        assert_eq!(host.presence_status, PresenceStatus::Online);

        // Unlike join, creation does not resume an existing row.
        let err = create_player(&store, room_id, "quinn", false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn join_twice_returns_the_same_player() {
        let (store, room_id) = seeded_store().await;

        let first = join_as_player(&store, room_id, "casey").await.unwrap();
        let second = join_as_player(&store, room_id, "casey").await.unwrap();

        assert_eq!(first.id, second.id);
        let all = store.list_players(room_id).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn join_trims_whitespace() {
        let (store, room_id) = seeded_store().await;

        let first = join_as_player(&store, room_id, "casey").await.unwrap();
        let second = join_as_player(&store, room_id, "  casey  ").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn blank_usernames_are_rejected() {
        let (store, room_id) = seeded_store().await;
        let err = join_as_player(&store, room_id, "   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn team_membership_updates_and_filters_rosters() {
        let (store, room_id) = seeded_store().await;
        let state = crate::state::AppState::new(store.clone(), crate::config::AppConfig::default());

        let a = join_as_player(&store, room_id, "a").await.unwrap();
        let b = join_as_player(&store, room_id, "b").await.unwrap();
        let team = store
            .insert_team(crate::dao::room_store::NewTeam {
                room_id,
                original_name: "Team 1".into(),
                custom_name: None,
                color: "bg-blue-500".into(),
            })
            .await
            .unwrap();

        set_player_team(&state, a.id, Some(team.id)).await.unwrap();

        let roster = list_players_by_team(&state, room_id, team.id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, a.id);

        // Unassigning drops the player off the roster again.
        set_player_team(&state, a.id, None).await.unwrap();
        let roster = list_players_by_team(&state, room_id, team.id).await.unwrap();
        assert!(roster.is_empty());
        assert_eq!(list_players(&state, room_id).await.unwrap().len(), 2);

        let err = set_player_team(&state, b.id, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn reconnect_refreshes_presence() {
        let (store, room_id) = seeded_store().await;

        let joined = join_as_player(&store, room_id, "casey").await.unwrap();
        let reconnected = join_as_player(&store, room_id, "casey").await.unwrap();

        assert_eq!(reconnected.presence_status, PresenceStatus::Online);
        assert!(reconnected.last_seen >= joined.last_seen);
    }
}
