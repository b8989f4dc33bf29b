use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{
        AlignmentAnswerEntity, GameMode, GameStateEntity, GameStatus, PhraseClueEntity,
        PhraseGuessEntity, QuizAnswerEntity,
    },
    dto::{format_optional_time, format_system_time, team::TeamResponse},
    services::{game_service, pulse::PulseQuestionResult},
};

/// Payload for opening a round.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartRoundRequest {
    /// Round to open; the next round when omitted.
    #[serde(default)]
    pub round_number: Option<u32>,
}

/// Public projection of the game-state singleton.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStateResponse {
    /// Owning room.
    pub room_id: Uuid,
    /// Mini-game being played.
    pub game_mode: Option<GameMode>,
    /// Round counter, from 0.
    pub current_round: u32,
    /// Content index of the live question.
    pub current_question_index: Option<u32>,
    /// Snapshot of the live question.
    pub current_question: Option<serde_json::Value>,
    /// Seconds left, derived from the authoritative cutoff at response time.
    pub remaining_seconds: u32,
    /// When the round opened, RFC 3339.
    pub round_started_at: Option<String>,
    /// Authoritative cutoff, RFC 3339. Clients count down against this.
    pub round_ends_at: Option<String>,
    /// Round lifecycle phase.
    pub status: GameStatus,
    /// Last write, RFC 3339.
    pub updated_at: String,
}

impl GameStateResponse {
    /// Project an entity, deriving the countdown from `now`.
    pub fn from_entity(entity: GameStateEntity, now: SystemTime) -> Self {
        let remaining_seconds = game_service::remaining_seconds(&entity, now);
        Self {
            room_id: entity.room_id,
            game_mode: entity.game_mode,
            current_round: entity.current_round,
            current_question_index: entity.current_question_index,
            current_question: entity.current_question,
            remaining_seconds,
            round_started_at: format_optional_time(entity.round_started_at),
            round_ends_at: format_optional_time(entity.round_ends_at),
            status: entity.status,
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Per-team result of scoring one round.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamRoundResult {
    /// The team.
    pub team_id: Uuid,
    /// Name to show.
    pub display_name: String,
    /// Points added this round.
    pub points_earned: i32,
    /// Cumulative score after the round.
    pub total_score: i32,
    /// Alignment rounds only: share of the team on the modal answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_pct: Option<u32>,
}

/// Outcome of scoring a round, including the win check.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundOutcomeResponse {
    /// The round that was scored.
    pub round_number: u32,
    /// Every team's result, creation order.
    pub teams: Vec<TeamRoundResult>,
    /// The winning team when the target score was reached.
    pub winner: Option<TeamResponse>,
    /// Whether the game ended with this round.
    pub finished: bool,
}

/// Payload for a trivia answer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuizAnswerRequest {
    /// Answering player.
    pub player_id: Uuid,
    /// Round the answer belongs to.
    pub round_number: u32,
    /// Chosen option index; -1 when time ran out with no pick.
    pub selected_answer: i32,
}

/// Public projection of a trivia answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizAnswerResponse {
    /// Answering player.
    pub player_id: Uuid,
    /// Player's team at write time.
    pub team_id: Option<Uuid>,
    /// Round of the answer.
    pub round_number: u32,
    /// Content index of the question.
    pub question_index: u32,
    /// Chosen option index.
    pub selected_answer: i32,
    /// Whether it was correct.
    pub is_correct: bool,
    /// Submission time, RFC 3339.
    pub answered_at: String,
}

impl From<QuizAnswerEntity> for QuizAnswerResponse {
    fn from(answer: QuizAnswerEntity) -> Self {
        Self {
            player_id: answer.player_id,
            team_id: answer.team_id,
            round_number: answer.round_number,
            question_index: answer.question_index,
            selected_answer: answer.selected_answer,
            is_correct: answer.is_correct,
            answered_at: format_system_time(answer.answered_at),
        }
    }
}

/// Payload for a phrase guess.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PhraseGuessRequest {
    /// Guessing player.
    pub player_id: Uuid,
    /// Round the guess belongs to.
    pub round_number: u32,
    /// Guessed text.
    #[validate(length(min = 1, max = 64))]
    pub guess: String,
}

/// Public projection of a phrase guess.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhraseGuessResponse {
    /// Guessing player.
    pub player_id: Uuid,
    /// Player's team at write time.
    pub team_id: Option<Uuid>,
    /// Round of the guess.
    pub round_number: u32,
    /// The guessed text, uppercased.
    pub guess: String,
    /// Whether it matched the phrase.
    pub is_correct: bool,
    /// Submission time, RFC 3339.
    pub guessed_at: String,
}

impl From<PhraseGuessEntity> for PhraseGuessResponse {
    fn from(guess: PhraseGuessEntity) -> Self {
        Self {
            player_id: guess.player_id,
            team_id: guess.team_id,
            round_number: guess.round_number,
            guess: guess.guess,
            is_correct: guess.is_correct,
            guessed_at: format_system_time(guess.guessed_at),
        }
    }
}

/// Payload for advancing the clue rotation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RotateClueRequest {
    /// Round being played.
    pub round_number: u32,
    /// Clue to reveal next.
    pub clue_index: u32,
}

/// Public projection of the live clue.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClueResponse {
    /// Round being played.
    pub round_number: u32,
    /// Position in the phrase's clue list.
    pub clue_index: u32,
    /// Player holding the clue.
    pub recipient_player_id: Option<Uuid>,
    /// The clue text.
    pub clue_text: String,
    /// Display seconds on the rotation.
    pub time_left: u32,
}

impl From<PhraseClueEntity> for ClueResponse {
    fn from(clue: PhraseClueEntity) -> Self {
        Self {
            round_number: clue.round_number,
            clue_index: clue.clue_index,
            recipient_player_id: clue.recipient_player_id,
            clue_text: clue.clue_text,
            time_left: clue.time_left,
        }
    }
}

/// Payload for an alignment vote.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AlignmentAnswerRequest {
    /// Voting player.
    pub player_id: Uuid,
    /// Round the vote belongs to.
    pub round_number: u32,
    /// Chosen option index.
    pub selected_answer: u32,
}

/// Public projection of an alignment vote.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlignmentAnswerResponse {
    /// Voting player.
    pub player_id: Uuid,
    /// Player's team at write time.
    pub team_id: Option<Uuid>,
    /// Round of the vote.
    pub round_number: u32,
    /// Content index of the prompt.
    pub question_index: u32,
    /// Chosen option index.
    pub selected_answer: u32,
    /// Submission time, RFC 3339.
    pub locked_at: String,
}

impl From<AlignmentAnswerEntity> for AlignmentAnswerResponse {
    fn from(answer: AlignmentAnswerEntity) -> Self {
        Self {
            player_id: answer.player_id,
            team_id: answer.team_id,
            round_number: answer.round_number,
            question_index: answer.question_index,
            selected_answer: answer.selected_answer,
            locked_at: format_system_time(answer.locked_at),
        }
    }
}

/// Payload for a warm-up vote.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PulseSubmitRequest {
    /// Voting player.
    pub player_id: Uuid,
    /// Which warm-up question.
    pub question_index: u32,
    /// Chosen option index.
    pub answer_index: u32,
}

/// Distribution of answers for one warm-up question.
#[derive(Debug, Serialize, ToSchema)]
pub struct PulseQuestionResultDto {
    /// Which question.
    pub question_index: u32,
    /// The question text.
    pub question: String,
    /// Votes per option index.
    pub counts: Vec<u32>,
    /// Total respondents.
    pub total: u32,
}

impl From<PulseQuestionResult> for PulseQuestionResultDto {
    fn from(result: PulseQuestionResult) -> Self {
        Self {
            question_index: result.question_index,
            question: result.question,
            counts: result.counts,
            total: result.total,
        }
    }
}

/// Aggregated warm-up results.
#[derive(Debug, Serialize, ToSchema)]
pub struct PulseResultsResponse {
    /// Per-question distributions, in question order.
    pub questions: Vec<PulseQuestionResultDto>,
}
