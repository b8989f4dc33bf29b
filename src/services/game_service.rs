//! Game-state lifecycle: starting the game, opening rounds, scoring them,
//! and ending the session.
//!
//! The host drives every transition here. Round timing is anchored to a
//! single `round_ends_at` timestamp written when the round opens; clients
//! derive their countdowns from it instead of running independent timers,
//! so the round cutoff cannot drift between screens.

use std::time::{Duration, SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{GameMode, GameStateEntity, GameStatus, RoomEntity, RoomStatus},
    dao::room_store::{GameStatePatch, RoomStore},
    dto::game::{RoundOutcomeResponse, TeamRoundResult},
    error::ServiceError,
    services::scoring,
    state::SharedState,
};

/// Initialize the game-state singleton and move the room to `playing`.
pub async fn start_game(
    state: &SharedState,
    room_id: Uuid,
) -> Result<GameStateEntity, ServiceError> {
    let store = state.store();
    let room = require_room(state, room_id).await?;
    let game_mode = room
        .game_mode
        .ok_or_else(|| ServiceError::InvalidState("room has no game mode selected".into()))?;

    let game_state = store
        .upsert_game_state(
            room_id,
            GameStatePatch {
                game_mode: Some(game_mode),
                current_round: Some(0),
                status: Some(GameStatus::Starting),
                ..Default::default()
            },
        )
        .await?;
    store
        .update_room_status(room_id, RoomStatus::Playing)
        .await?;

    info!(room = %room.code, mode = ?game_mode, "game started");
    Ok(game_state)
}

/// Open a round: snapshot the content for it and write the authoritative
/// start/end timestamps. When `round_number` is absent the next round after
/// the current one is opened (or round 0 before any round ran).
pub async fn start_round(
    state: &SharedState,
    room_id: Uuid,
    round_number: Option<u32>,
) -> Result<GameStateEntity, ServiceError> {
    let store = state.store();
    let room = require_room(state, room_id).await?;
    let (mode, pack) = require_mode_and_pack(&room)?;

    let round_number = match round_number {
        Some(round) => round,
        None => match store.find_game_state(room_id).await? {
            Some(gs) if gs.status != GameStatus::Starting => gs.current_round + 1,
            Some(gs) => gs.current_round,
            None => 0,
        },
    };

    let (question_index, question, countdown_secs) = match mode {
        GameMode::PopQuiz => {
            let question = pack.quiz_question(round_number).ok_or_else(|| {
                ServiceError::InvalidState("content pack has no quiz questions".into())
            })?;
            let index = round_number % pack.quiz_questions.len() as u32;
            let snapshot = serde_json::to_value(question)
                .map_err(|err| ServiceError::InvalidState(err.to_string()))?;
            (index, Some(snapshot), state.config().round_seconds(mode))
        }
        GameMode::Alignment => {
            let prompt = pack.alignment_prompt(round_number).ok_or_else(|| {
                ServiceError::InvalidState("content pack has no alignment prompts".into())
            })?;
            let index = round_number % pack.alignment_prompts.len() as u32;
            let snapshot = serde_json::to_value(prompt)
                .map_err(|err| ServiceError::InvalidState(err.to_string()))?;
            (index, Some(snapshot), state.config().round_seconds(mode))
        }
        GameMode::SecretPhrase => {
            // The phrase is already on every client via the room's content
            // pack; the round is bounded by the full clue rotation instead
            // of a single countdown.
            let phrase = pack.phrase(round_number).ok_or_else(|| {
                ServiceError::InvalidState("content pack has no phrases".into())
            })?;
            let index = round_number % pack.phrases.len() as u32;
            let secs = phrase.clues.len() as u32 * state.config().clue_rotation_secs();
            (index, None, secs)
        }
    };

    let started_at = SystemTime::now();
    let ends_at = started_at + Duration::from_secs(u64::from(countdown_secs));
    let game_state = store
        .upsert_game_state(
            room_id,
            GameStatePatch {
                game_mode: Some(mode),
                current_round: Some(round_number),
                current_question_index: Some(Some(question_index)),
                current_question: Some(question),
                time_left: Some(Some(countdown_secs)),
                round_started_at: Some(Some(started_at)),
                round_ends_at: Some(Some(ends_at)),
                status: Some(GameStatus::Playing),
            },
        )
        .await?;

    Ok(game_state)
}

/// Score a closed round by re-reading every answer row for it from the
/// store, apply the per-team points through atomic increments, and check
/// whether any team reached the room's target score.
pub async fn score_round(
    state: &SharedState,
    room_id: Uuid,
    round_number: u32,
) -> Result<RoundOutcomeResponse, ServiceError> {
    let store = state.store();
    let room = require_room(state, room_id).await?;
    let (mode, _) = require_mode_and_pack(&room)?;

    let mut alignment: Option<indexmap::IndexMap<Uuid, scoring::AlignmentOutcome>> = None;
    let points: indexmap::IndexMap<Uuid, i32> = match mode {
        GameMode::PopQuiz => {
            let answers = store.list_quiz_answers(room_id, round_number).await?;
            scoring::quiz_round_points(&answers)
        }
        GameMode::SecretPhrase => {
            let guesses = store.list_phrase_guesses(room_id, round_number).await?;
            scoring::phrase_round_winner(&guesses)
                .into_iter()
                .map(|team_id| (team_id, 1))
                .collect()
        }
        GameMode::Alignment => {
            let answers = store.list_alignment_answers(room_id, round_number).await?;
            let outcomes = scoring::alignment_round_outcomes(&answers);
            let points = outcomes
                .iter()
                .filter(|(_, outcome)| outcome.points > 0)
                .map(|(team_id, outcome)| (*team_id, outcome.points))
                .collect();
            alignment = Some(outcomes);
            points
        }
    };

    for (team_id, team_points) in &points {
        store.increment_team_score(*team_id, *team_points).await?;
    }

    let teams = store.list_teams(room_id).await?;
    let winner = scoring::leader(&teams)
        .filter(|team| team.score >= room.target_score)
        .cloned();
    let finished = winner.is_some();

    if finished {
        end_game(state, room_id).await?;
    } else {
        store
            .upsert_game_state(
                room_id,
                GameStatePatch {
                    status: Some(GameStatus::RoundResults),
                    ..Default::default()
                },
            )
            .await?;
    }

    let results = teams
        .iter()
        .map(|team| TeamRoundResult {
            team_id: team.id,
            display_name: team.display_name().to_string(),
            points_earned: points.get(&team.id).copied().unwrap_or(0),
            total_score: team.score,
            alignment_pct: alignment
                .as_ref()
                .and_then(|outcomes| outcomes.get(&team.id))
                .map(|outcome| outcome.alignment_pct),
        })
        .collect();

    Ok(RoundOutcomeResponse {
        round_number,
        teams: results,
        winner: winner.map(Into::into),
        finished,
    })
}

/// Mark the room and its game state finished. The rows are kept, only
/// marked; no transition is ever rolled back.
pub async fn end_game(state: &SharedState, room_id: Uuid) -> Result<(), ServiceError> {
    let store = state.store();
    let room = require_room(state, room_id).await?;
    store
        .update_room_status(room_id, RoomStatus::Finished)
        .await?;
    store
        .upsert_game_state(
            room_id,
            GameStatePatch {
                status: Some(GameStatus::Finished),
                ..Default::default()
            },
        )
        .await?;
    info!(room = %room.code, "game ended");
    Ok(())
}

/// The game-state singleton for a room, when the game has started.
pub async fn game_state(
    state: &SharedState,
    room_id: Uuid,
) -> Result<Option<GameStateEntity>, ServiceError> {
    Ok(state.store().find_game_state(room_id).await?)
}

/// Seconds left in the live round as derived from the authoritative cutoff.
/// Every client computes this the same way, so displays agree to within a
/// network round trip.
pub fn remaining_seconds(game_state: &GameStateEntity, now: SystemTime) -> u32 {
    let Some(ends_at) = game_state.round_ends_at else {
        return 0;
    };
    match ends_at.duration_since(now) {
        Ok(remaining) => remaining.as_secs() as u32,
        Err(_) => 0,
    }
}

async fn require_room(state: &SharedState, room_id: Uuid) -> Result<RoomEntity, ServiceError> {
    state
        .store()
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))
}

fn require_mode_and_pack(
    room: &RoomEntity,
) -> Result<(GameMode, &crate::content::ContentPack), ServiceError> {
    let mode = room
        .game_mode
        .ok_or_else(|| ServiceError::InvalidState("room has no game mode selected".into()))?;
    let pack = room
        .content_pack
        .as_ref()
        .ok_or_else(|| ServiceError::InvalidState("room has no content pack".into()))?;
    Ok((mode, pack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::content;
    use crate::dao::room_store::memory::MemoryRoomStore;
    use crate::dto::room::CreateRoomRequest;
    use crate::services::{alignment, quiz, room_service, team_service};
    use crate::state::AppState;
    use std::sync::Arc;

    async fn playing_room(mode: GameMode, players: usize) -> (SharedState, Uuid, Vec<Uuid>) {
        let state = AppState::new(Arc::new(MemoryRoomStore::new()), AppConfig::default());
        let (room, _) = room_service::create_room(
            &state,
            CreateRoomRequest {
                username: "host".into(),
                topic: None,
                game_mode: Some(mode),
                team_size: Some(3),
                target_score: Some(2),
                code: None,
                content_pack: Some(content::default_pack()),
            },
        )
        .await
        .unwrap();

        let mut player_ids = Vec::new();
        for i in 0..players {
            let (_, player) = room_service::join_room(&state, &room.code, &format!("p{i}"))
                .await
                .unwrap();
            player_ids.push(player.id);
        }
        team_service::allocate_teams(&state, room.id, None).await.unwrap();
        start_game(&state, room.id).await.unwrap();
        (state, room.id, player_ids)
    }

    #[tokio::test]
    async fn start_round_writes_snapshot_and_cutoff() {
        let (state, room_id, _) = playing_room(GameMode::PopQuiz, 4).await;

        let gs = start_round(&state, room_id, None).await.unwrap();
        assert_eq!(gs.current_round, 0);
        assert_eq!(gs.status, GameStatus::Playing);
        assert!(gs.current_question.is_some());
        assert_eq!(gs.time_left, Some(10));

        let started = gs.round_started_at.unwrap();
        let ends = gs.round_ends_at.unwrap();
        assert_eq!(ends.duration_since(started).unwrap().as_secs(), 10);
    }

    #[tokio::test]
    async fn rounds_advance_when_no_number_is_given() {
        let (state, room_id, _) = playing_room(GameMode::PopQuiz, 4).await;

        let gs = start_round(&state, room_id, None).await.unwrap();
        assert_eq!(gs.current_round, 0);
        let gs = start_round(&state, room_id, None).await.unwrap();
        assert_eq!(gs.current_round, 1);
    }

    #[tokio::test]
    async fn quiz_round_scores_correct_answers_per_team() {
        let (state, room_id, players) = playing_room(GameMode::PopQuiz, 6).await;
        start_round(&state, room_id, None).await.unwrap();

        let store = state.store();
        let teams = store.list_teams(room_id).await.unwrap();
        assert_eq!(teams.len(), 2);
        let team_a = teams[0].id;

        // Two members of team A answer correctly; team B stays silent.
        let mut scored = 0;
        for player_id in &players {
            let player = store.find_player(*player_id).await.unwrap().unwrap();
            if player.team_id == Some(team_a) && scored < 2 {
                quiz::submit_answer(&state, room_id, *player_id, 0, 1).await.unwrap();
                scored += 1;
            }
        }

        let outcome = score_round(&state, room_id, 0).await.unwrap();
        let result_a = outcome
            .teams
            .iter()
            .find(|t| t.team_id == team_a)
            .unwrap();
        assert_eq!(result_a.points_earned, 2);
        let result_b = outcome
            .teams
            .iter()
            .find(|t| t.team_id != team_a)
            .unwrap();
        assert_eq!(result_b.points_earned, 0);
        assert!(outcome.finished, "target of 2 reached");
        assert_eq!(
            outcome.winner.as_ref().map(|w| w.id),
            Some(team_a)
        );
    }

    #[tokio::test]
    async fn alignment_round_reports_share_and_points() {
        let (state, room_id, players) = playing_room(GameMode::Alignment, 4).await;
        start_round(&state, room_id, None).await.unwrap();

        let store = state.store();
        let teams = store.list_teams(room_id).await.unwrap();
        let team_a = teams[0].id;
        // Team A members vote [0, 0]; team B splits [1, 2].
        let mut a_votes = 0;
        for player_id in &players {
            let player = store.find_player(*player_id).await.unwrap().unwrap();
            let choice = if player.team_id == Some(team_a) {
                0
            } else {
                a_votes += 1;
                a_votes
            };
            alignment::submit_answer(&state, room_id, *player_id, 0, choice).await.unwrap();
        }

        let outcome = score_round(&state, room_id, 0).await.unwrap();
        let result_a = outcome.teams.iter().find(|t| t.team_id == team_a).unwrap();
        assert_eq!(result_a.alignment_pct, Some(100));
        assert_eq!(result_a.points_earned, 1);
        let result_b = outcome.teams.iter().find(|t| t.team_id != team_a).unwrap();
        assert_eq!(result_b.alignment_pct, Some(50));
        assert_eq!(result_b.points_earned, 1);
    }

    #[tokio::test]
    async fn unfinished_round_moves_state_to_results() {
        let (state, room_id, _) = playing_room(GameMode::PopQuiz, 4).await;
        start_round(&state, room_id, None).await.unwrap();

        // Nobody answered; no points, no winner.
        let outcome = score_round(&state, room_id, 0).await.unwrap();
        assert!(!outcome.finished);
        assert!(outcome.winner.is_none());

        let gs = game_state(&state, room_id).await.unwrap().unwrap();
        assert_eq!(gs.status, GameStatus::RoundResults);
    }

    #[tokio::test]
    async fn end_game_marks_room_and_state_finished() {
        let (state, room_id, _) = playing_room(GameMode::PopQuiz, 4).await;
        end_game(&state, room_id).await.unwrap();

        let room = room_service::refresh_room(&state, room_id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Finished);
        let gs = game_state(&state, room_id).await.unwrap().unwrap();
        assert_eq!(gs.status, GameStatus::Finished);
    }

    #[test]
    fn remaining_seconds_derives_from_cutoff() {
        let now = SystemTime::now();
        let gs = GameStateEntity {
            room_id: Uuid::new_v4(),
            game_mode: Some(GameMode::PopQuiz),
            current_round: 0,
            current_question_index: None,
            current_question: None,
            time_left: Some(10),
            round_started_at: Some(now),
            round_ends_at: Some(now + Duration::from_secs(10)),
            status: GameStatus::Playing,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(remaining_seconds(&gs, now), 10);
        assert_eq!(remaining_seconds(&gs, now + Duration::from_secs(4)), 6);
        // Past the cutoff the countdown pins at zero rather than wrapping.
        assert_eq!(remaining_seconds(&gs, now + Duration::from_secs(30)), 0);
    }
}
