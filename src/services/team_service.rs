//! Team allocation and naming.
//!
//! Allocation is a full replace: every team row is deleted and recreated,
//! players are dealt round-robin by roster index. Custom names survive the
//! replace keyed by stable team index, so re-running allocation no longer
//! discards what players already chose.

use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, RoomStatus, TeamEntity, TeamNameSuggestionEntity},
    dao::room_store::{NewTeam, NewTeamNameSuggestion, RoomStore},
    error::ServiceError,
    state::SharedState,
};

/// Number of teams for a roster: `max(2, ceil(players / team_size))`.
pub fn team_count(player_count: usize, team_size: u32) -> usize {
    let size = team_size.max(1) as usize;
    player_count.div_ceil(size).max(2)
}

/// Replace the room's teams and deal non-host players onto them round-robin.
///
/// Player order is store insertion order, so the assignment is deterministic:
/// player `i` lands on team `i % team_count`. Sizes come out balanced to
/// within one player; there is no skill balancing, only position.
pub async fn allocate_teams(
    state: &SharedState,
    room_id: Uuid,
    team_size_override: Option<u32>,
) -> Result<Vec<TeamEntity>, ServiceError> {
    let store = state.store();
    let room = store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;

    let team_size = team_size_override.unwrap_or(room.team_size);
    if team_size == 0 {
        return Err(ServiceError::InvalidInput(
            "team size must be at least 1".into(),
        ));
    }

    let players: Vec<PlayerEntity> = store
        .list_players(room_id)
        .await?
        .into_iter()
        .filter(|player| !player.is_host)
        .collect();
    if players.is_empty() {
        return Err(ServiceError::InvalidInput("no players to assign".into()));
    }

    let count = team_count(players.len(), team_size);

    // Keep player-chosen names across the replace, keyed by team index.
    let prior_names: Vec<Option<String>> = store
        .list_teams(room_id)
        .await?
        .into_iter()
        .map(|team| team.custom_name)
        .collect();

    store.delete_teams(room_id).await?;

    let mut teams = Vec::with_capacity(count);
    for index in 0..count {
        let team = store
            .insert_team(NewTeam {
                room_id,
                original_name: format!("Team {}", index + 1),
                custom_name: prior_names.get(index).cloned().flatten(),
                color: state.config().team_color(index).to_string(),
            })
            .await?;
        teams.push(team);
    }

    for (index, player) in players.iter().enumerate() {
        let team = &teams[index % count];
        store.set_player_team(player.id, Some(team.id)).await?;
    }

    store
        .update_room_status(room_id, RoomStatus::TeamAssignment)
        .await?;

    Ok(teams)
}

/// Teams of a room with their rosters, both in creation/join order.
pub async fn list_teams_with_rosters(
    state: &SharedState,
    room_id: Uuid,
) -> Result<Vec<crate::sync::TeamRoster>, ServiceError> {
    let store = state.store();
    let teams = store.list_teams(room_id).await?;
    let players = store.list_players(room_id).await?;
    Ok(teams
        .into_iter()
        .map(|team| {
            let roster = players
                .iter()
                .filter(|player| player.team_id == Some(team.id))
                .cloned()
                .collect();
            crate::sync::TeamRoster {
                team,
                players: roster,
            }
        })
        .collect())
}

/// Set or overwrite a team's custom name.
pub async fn rename_team(
    state: &SharedState,
    team_id: Uuid,
    custom_name: String,
) -> Result<TeamEntity, ServiceError> {
    let custom_name = custom_name.trim().to_string();
    if custom_name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "team name must not be empty".into(),
        ));
    }

    let store = state.store();
    store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;

    store
        .set_team_custom_name(team_id, Some(custom_name))
        .await?;
    store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
}

/// Record a player's name idea for their team. Re-suggesting replaces the
/// earlier idea (upsert keyed team + player).
pub async fn suggest_team_name(
    state: &SharedState,
    team_id: Uuid,
    player_id: Uuid,
    suggested_name: String,
) -> Result<(), ServiceError> {
    let suggested_name = suggested_name.trim().to_string();
    if suggested_name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "suggestion must not be empty".into(),
        ));
    }

    let store = state.store();
    store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;
    store
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))?;

    store
        .upsert_team_name_suggestion(NewTeamNameSuggestion {
            team_id,
            player_id,
            suggested_name,
        })
        .await?;
    Ok(())
}

/// Every suggestion recorded for a team, in submission order.
pub async fn list_team_name_suggestions(
    state: &SharedState,
    team_id: Uuid,
) -> Result<Vec<TeamNameSuggestionEntity>, ServiceError> {
    let store = state.store();
    store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;
    Ok(store.list_team_name_suggestions(team_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::room_store::memory::MemoryRoomStore;
    use crate::dao::room_store::{NewPlayer, NewRoom, RoomStore};
    use crate::state::AppState;
    use std::sync::Arc;

    async fn room_with_players(player_count: usize, team_size: u32) -> (SharedState, Uuid) {
        let store = Arc::new(MemoryRoomStore::new());
        let state = AppState::new(store.clone(), AppConfig::default());
        let room = store
            .insert_room(NewRoom {
                code: "TEAMUP".into(),
                host_id: Uuid::new_v4(),
                game_mode: None,
                topic: None,
                content_pack: None,
                team_size,
                target_score: 5,
            })
            .await
            .unwrap();
        store
            .insert_player(NewPlayer {
                id: Uuid::new_v4(),
                room_id: room.id,
                username: "host".into(),
                is_host: true,
            })
            .await
            .unwrap();
        for i in 0..player_count {
            store
                .insert_player(NewPlayer {
                    id: Uuid::new_v4(),
                    room_id: room.id,
                    username: format!("p{i}"),
                    is_host: false,
                })
                .await
                .unwrap();
        }
        (state, room.id)
    }

    #[test]
    fn team_count_formula() {
        assert_eq!(team_count(9, 4), 3);
        assert_eq!(team_count(8, 4), 2);
        assert_eq!(team_count(3, 4), 2);
        assert_eq!(team_count(17, 4), 5);
        assert_eq!(team_count(1, 1), 2);
    }

    #[tokio::test]
    async fn nine_players_at_size_four_make_three_balanced_teams() {
        let (state, room_id) = room_with_players(9, 4).await;
        let teams = allocate_teams(&state, room_id, None).await.unwrap();
        assert_eq!(teams.len(), 3);

        let store = state.store();
        for team in &teams {
            let roster = store.list_players_by_team(room_id, team.id).await.unwrap();
            assert_eq!(roster.len(), 3);
        }
    }

    #[tokio::test]
    async fn assignment_is_round_robin_by_roster_index() {
        let (state, room_id) = room_with_players(5, 2).await;
        let teams = allocate_teams(&state, room_id, None).await.unwrap();
        assert_eq!(teams.len(), 3);

        let store = state.store();
        let players: Vec<_> = store
            .list_players(room_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|p| !p.is_host)
            .collect();
        for (index, player) in players.iter().enumerate() {
            assert_eq!(player.team_id, Some(teams[index % teams.len()].id));
        }
    }

    #[tokio::test]
    async fn host_is_never_assigned() {
        let (state, room_id) = room_with_players(4, 2).await;
        allocate_teams(&state, room_id, None).await.unwrap();

        let store = state.store();
        let host = store
            .list_players(room_id)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.is_host)
            .unwrap();
        assert_eq!(host.team_id, None);
    }

    #[tokio::test]
    async fn colors_cycle_past_the_palette() {
        let (state, room_id) = room_with_players(10, 2).await;
        let teams = allocate_teams(&state, room_id, None).await.unwrap();
        assert_eq!(teams.len(), 5);
        assert_eq!(teams[0].color, teams[4].color);
    }

    #[tokio::test]
    async fn reallocation_preserves_custom_names_by_index() {
        let (state, room_id) = room_with_players(6, 3).await;
        let teams = allocate_teams(&state, room_id, None).await.unwrap();
        rename_team(&state, teams[0].id, "The Quizzards".into())
            .await
            .unwrap();

        let teams = allocate_teams(&state, room_id, None).await.unwrap();
        assert_eq!(teams[0].custom_name.as_deref(), Some("The Quizzards"));
        assert_eq!(teams[1].custom_name, None);
    }

    #[tokio::test]
    async fn allocation_without_players_is_rejected() {
        let (state, room_id) = room_with_players(0, 4).await;
        let err = allocate_teams(&state, room_id, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
