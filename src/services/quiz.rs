//! Trivia rally round engine.
//!
//! One answer per player per round, upsert-keyed so a re-submit replaces the
//! earlier pick. Correctness is computed here against the room's content
//! pack rather than trusted from the client.

use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, QuizAnswerEntity},
    dao::room_store::{NewQuizAnswer, RoomStore},
    error::ServiceError,
    state::SharedState,
};

/// Record a player's answer for the round. The player's current team is
/// denormalized onto the row at write time so scoring never needs a join.
pub async fn submit_answer(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
    round_number: u32,
    selected_answer: i32,
) -> Result<QuizAnswerEntity, ServiceError> {
    let store = state.store();
    let room = store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;
    let pack = room
        .content_pack
        .as_ref()
        .ok_or_else(|| ServiceError::InvalidState("room has no content pack".into()))?;
    let question = pack
        .quiz_question(round_number)
        .ok_or_else(|| ServiceError::InvalidState("content pack has no quiz questions".into()))?;
    let question_index = round_number % pack.quiz_questions.len() as u32;

    let player = require_room_player(state, room_id, player_id).await?;
    let is_correct = selected_answer >= 0 && selected_answer as usize == question.correct;

    Ok(store
        .upsert_quiz_answer(NewQuizAnswer {
            room_id,
            player_id,
            team_id: player.team_id,
            round_number,
            question_index,
            selected_answer,
            is_correct,
        })
        .await?)
}

/// All answers recorded for a round.
pub async fn list_answers(
    state: &SharedState,
    room_id: Uuid,
    round_number: u32,
) -> Result<Vec<QuizAnswerEntity>, ServiceError> {
    Ok(state.store().list_quiz_answers(room_id, round_number).await?)
}

pub(crate) async fn require_room_player(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
) -> Result<PlayerEntity, ServiceError> {
    let player = state
        .store()
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))?;
    if player.room_id != room_id {
        return Err(ServiceError::InvalidInput(
            "player does not belong to this room".into(),
        ));
    }
    Ok(player)
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

    async fn quiz_room() -> (SharedState, Uuid, Uuid) {
        let state = AppState::new(Arc::new(MemoryRoomStore::new()), AppConfig::default());
        let (room, _) = room_service::create_room(
            &state,
            CreateRoomRequest {
                username: "host".into(),
                topic: None,
                game_mode: Some(GameMode::PopQuiz),
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
    async fn correctness_is_computed_from_the_pack() {
        let (state, room_id, player_id) = quiz_room().await;

        // Round 0's question has correct index 1.
        let wrong = submit_answer(&state, room_id, player_id, 0, 0).await.unwrap();
        assert!(!wrong.is_correct);
        let right = submit_answer(&state, room_id, player_id, 0, 1).await.unwrap();
        assert!(right.is_correct);
    }

    #[tokio::test]
    async fn resubmits_leave_one_row_with_the_second_pick() {
        let (state, room_id, player_id) = quiz_room().await;

        submit_answer(&state, room_id, player_id, 0, 0).await.unwrap();
        submit_answer(&state, room_id, player_id, 0, 1).await.unwrap();

        let answers = list_answers(&state, room_id, 0).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].selected_answer, 1);
        assert!(answers[0].is_correct);
    }

    #[tokio::test]
    async fn no_pick_counts_as_incorrect() {
        let (state, room_id, player_id) = quiz_room().await;
        let answer = submit_answer(&state, room_id, player_id, 0, -1).await.unwrap();
        assert!(!answer.is_correct);
    }

    #[tokio::test]
    async fn foreign_players_are_rejected() {
        let (state, room_id, _) = quiz_room().await;
        let err = submit_answer(&state, room_id, Uuid::new_v4(), 0, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
