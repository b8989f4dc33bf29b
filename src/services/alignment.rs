//! Opinion-alignment round engine. One vote per player per round,
//! upsert-keyed; there is no correct answer, only agreement.

use uuid::Uuid;

use crate::{
    dao::models::AlignmentAnswerEntity,
    dao::room_store::{NewAlignmentAnswer, RoomStore},
    error::ServiceError,
    services::quiz::require_room_player,
    state::SharedState,
};

/// Record a player's vote for the round.
pub async fn submit_answer(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
    round_number: u32,
    selected_answer: u32,
) -> Result<AlignmentAnswerEntity, ServiceError> {
    let store = state.store();
    let room = store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;
    let pack = room
        .content_pack
        .as_ref()
        .ok_or_else(|| ServiceError::InvalidState("room has no content pack".into()))?;
    let prompt = pack.alignment_prompt(round_number).ok_or_else(|| {
        ServiceError::InvalidState("content pack has no alignment prompts".into())
    })?;
    if selected_answer as usize >= prompt.options.len() {
        return Err(ServiceError::InvalidInput(format!(
            "option {selected_answer} is out of range"
        )));
    }
    let question_index = round_number % pack.alignment_prompts.len() as u32;

    let player = require_room_player(state, room_id, player_id).await?;

    Ok(store
        .upsert_alignment_answer(NewAlignmentAnswer {
            room_id,
            player_id,
            team_id: player.team_id,
            round_number,
            question_index,
            selected_answer,
        })
        .await?)
}

/// All votes recorded for a round.
pub async fn list_answers(
    state: &SharedState,
    room_id: Uuid,
    round_number: u32,
) -> Result<Vec<AlignmentAnswerEntity>, ServiceError> {
    Ok(state
        .store()
        .list_alignment_answers(room_id, round_number)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::content;
    use crate::dao::models::GameMode;
    use crate::dao::room_store::memory::MemoryRoomStore;
    use crate::dto::room::CreateRoomRequest;
    use crate::services::room_service;
    use crate::state::AppState;
    use std::sync::Arc;

    async fn alignment_room() -> (SharedState, Uuid, Uuid) {
        let state = AppState::new(Arc::new(MemoryRoomStore::new()), AppConfig::default());
        let (room, _) = room_service::create_room(
            &state,
            CreateRoomRequest {
                username: "host".into(),
                topic: None,
                game_mode: Some(GameMode::Alignment),
                team_size: None,
                target_score: None,
                code: None,
                content_pack: Some(content::default_pack()),
            },
        )
        .await
        .unwrap();
        let (_, player) = room_service::join_room(&state, &room.code, "dana")
            .await
            .unwrap();
        (state, room.id, player.id)
    }

    #[tokio::test]
    async fn votes_upsert_to_a_single_row() {
        let (state, room_id, player_id) = alignment_room().await;

        submit_answer(&state, room_id, player_id, 0, 0).await.unwrap();
        submit_answer(&state, room_id, player_id, 0, 2).await.unwrap();

        let votes = list_answers(&state, room_id, 0).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].selected_answer, 2);
    }

    #[tokio::test]
    async fn out_of_range_options_are_rejected() {
        let (state, room_id, player_id) = alignment_room().await;
        let err = submit_answer(&state, room_id, player_id, 0, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
