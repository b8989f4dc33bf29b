use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::content::ContentPack;

/// Lifecycle of a room, from lobby to final scoreboard.
///
/// This is the single canonical vocabulary. Older clients used hyphenated
/// spellings and `ended`; those are accepted as input aliases only and are
/// never written back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Lobby: players are joining by code.
    Waiting,
    /// Host has run team allocation; rosters are visible.
    #[serde(alias = "team-assignment")]
    TeamAssignment,
    /// Teams are choosing custom names.
    #[serde(alias = "team-naming")]
    TeamNaming,
    /// Warm-up voting before the main game.
    #[serde(alias = "group-pulse")]
    GroupPulse,
    /// A mini-game is running.
    Playing,
    /// Terminal. The row is kept, only marked.
    #[serde(alias = "ended")]
    Finished,
}

impl RoomStatus {
    /// Whether the room can no longer accept joins or transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoomStatus::Finished)
    }

    /// The statuses a room normally moves to from here. Transitions are not
    /// enforced (callers are trusted), only logged when they leave this path.
    pub fn expected_next(self) -> &'static [RoomStatus] {
        match self {
            RoomStatus::Waiting => &[RoomStatus::TeamAssignment, RoomStatus::GroupPulse],
            RoomStatus::TeamAssignment => &[RoomStatus::TeamNaming],
            RoomStatus::TeamNaming => &[RoomStatus::GroupPulse],
            RoomStatus::GroupPulse => &[RoomStatus::Playing],
            RoomStatus::Playing => &[RoomStatus::Finished],
            RoomStatus::Finished => &[],
        }
    }
}

/// Which mini-game a room is configured to play.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Trivia rally: teams race to answer multiple-choice questions.
    PopQuiz,
    /// Clue-rotation phrase guessing.
    SecretPhrase,
    /// Opinion voting scored on team agreement. Its answer table keeps the
    /// schema's legacy `sync_answers` name.
    #[serde(alias = "sync")]
    Alignment,
}

/// Phase of the per-room game-state singleton.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Intro screen before the first round.
    Starting,
    /// A round is live; answers are being accepted.
    Playing,
    /// Round closed, results on display.
    RoundResults,
    /// Terminal.
    #[serde(alias = "ended")]
    Finished,
}

/// Presence marker maintained by the client heartbeat. There is no
/// server-side expiry: a silent client simply stops refreshing `last_seen`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// Heartbeat seen recently.
    Online,
    /// Explicitly marked away (never set automatically).
    Offline,
}

/// One game session, identified by a human-shareable code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Six uppercase alphanumeric characters, unique case-insensitively.
    pub code: String,
    /// The creating player. Set once, never changes for the room's lifetime.
    pub host_id: Uuid,
    /// Current lifecycle status.
    pub status: RoomStatus,
    /// Selected mini-game, if one has been chosen yet.
    pub game_mode: Option<GameMode>,
    /// Free-text topic entered by the host.
    pub topic: Option<String>,
    /// Content snapshot taken at creation; replaced wholesale on update.
    pub content_pack: Option<ContentPack>,
    /// Target players per team used by allocation.
    pub team_size: u32,
    /// Cumulative score at which a team wins.
    pub target_score: i32,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last write to this row.
    pub updated_at: SystemTime,
}

/// A participant in a room. The host is a player row with `is_host` set and
/// is excluded from gameplay rosters by convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Unique within the room; reconnecting with the same name resumes the
    /// same row.
    pub username: String,
    /// Set once at creation. Trusted client-side, not enforced.
    pub is_host: bool,
    /// Team membership, assigned during allocation.
    pub team_id: Option<Uuid>,
    /// Presence marker refreshed by the heartbeat.
    pub presence_status: PresenceStatus,
    /// Last heartbeat time.
    pub last_seen: SystemTime,
    /// Creation timestamp; roster order is insertion order.
    pub created_at: SystemTime,
}

/// A team within a room. Teams are fully replaced on every allocation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier (changes when allocation replaces the team).
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Deterministic "Team N" label from allocation.
    pub original_name: String,
    /// Player-chosen name, when the naming flow has run.
    pub custom_name: Option<String>,
    /// Palette entry assigned by creation index.
    pub color: String,
    /// Cumulative score. Only moves through the atomic increment.
    pub score: i32,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl TeamEntity {
    /// Name shown to players: the custom name when chosen, else "Team N".
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.original_name)
    }
}

/// Singleton per-room row tracking the live round. Created on first game
/// start, upserted thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStateEntity {
    /// Owning room; also the upsert key.
    pub room_id: Uuid,
    /// Mini-game being played.
    pub game_mode: Option<GameMode>,
    /// Round counter, from 0.
    pub current_round: u32,
    /// Index into the content pack for the live round.
    pub current_question_index: Option<u32>,
    /// Denormalized snapshot of the live question/prompt.
    pub current_question: Option<serde_json::Value>,
    /// Display seconds remaining when the round started. Authority is
    /// `round_ends_at`; this is only what clients show before first derive.
    pub time_left: Option<u32>,
    /// When the host opened the round.
    pub round_started_at: Option<SystemTime>,
    /// Authoritative cutoff written once by the host. All clients derive
    /// remaining time from this instead of running their own countdowns.
    pub round_ends_at: Option<SystemTime>,
    /// Phase of the round lifecycle.
    pub status: GameStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last write to this row.
    pub updated_at: SystemTime,
}

/// One trivia answer. Upsert keyed (room, player, round): a second submit
/// replaces the first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizAnswerEntity {
    /// Owning room.
    pub room_id: Uuid,
    /// Answering player.
    pub player_id: Uuid,
    /// Player's team at write time, denormalized for scoring.
    pub team_id: Option<Uuid>,
    /// Round the answer belongs to.
    pub round_number: u32,
    /// Index of the question within the pack.
    pub question_index: u32,
    /// Chosen option index; -1 when time ran out with no pick.
    pub selected_answer: i32,
    /// Whether the chosen option was the correct one.
    pub is_correct: bool,
    /// Submission time.
    pub answered_at: SystemTime,
}

/// One phrase guess. Append-only: wrong guesses accumulate within a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhraseGuessEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Guessing player.
    pub player_id: Uuid,
    /// Player's team at write time.
    pub team_id: Option<Uuid>,
    /// Round the guess belongs to.
    pub round_number: u32,
    /// Guessed text, compared case-insensitively to the phrase.
    pub guess: String,
    /// Whether this guess matched.
    pub is_correct: bool,
    /// Submission time; guesses are listed in this order.
    pub guessed_at: SystemTime,
}

/// Clue-rotation state for a phrase round. Upsert keyed
/// (room, round, clue_index); the current clue is the highest index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhraseClueEntity {
    /// Owning room.
    pub room_id: Uuid,
    /// Round the clue belongs to.
    pub round_number: u32,
    /// Position in the phrase's clue list.
    pub clue_index: u32,
    /// Player the clue rotated to.
    pub recipient_player_id: Option<Uuid>,
    /// The clue text itself.
    pub clue_text: String,
    /// Display seconds left on the rotation when written.
    pub time_left: u32,
}

/// One alignment vote. Upsert keyed (room, player, round).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlignmentAnswerEntity {
    /// Owning room.
    pub room_id: Uuid,
    /// Voting player.
    pub player_id: Uuid,
    /// Player's team at write time, denormalized for scoring.
    pub team_id: Option<Uuid>,
    /// Round the vote belongs to.
    pub round_number: u32,
    /// Index of the prompt within the pack.
    pub question_index: u32,
    /// Chosen option index.
    pub selected_answer: u32,
    /// Submission time.
    pub locked_at: SystemTime,
}

/// One warm-up vote. Upsert keyed (room, player, question_index); pulse
/// results are distributions, never team scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PulseResponseEntity {
    /// Owning room.
    pub room_id: Uuid,
    /// Voting player.
    pub player_id: Uuid,
    /// Which warm-up question.
    pub question_index: u32,
    /// Chosen option index.
    pub answer_index: u32,
    /// Submission time.
    pub created_at: SystemTime,
}

/// A player's suggestion during team naming. Upsert keyed (team, player):
/// re-suggesting replaces the earlier idea.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamNameSuggestionEntity {
    /// Team being named.
    pub team_id: Uuid,
    /// Suggesting player.
    pub player_id: Uuid,
    /// The proposed name.
    pub suggested_name: String,
    /// Submission time; suggestions are listed in this order.
    pub created_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_status_spellings_parse_to_canonical() {
        let status: RoomStatus = serde_json::from_str("\"team-assignment\"").unwrap();
        assert_eq!(status, RoomStatus::TeamAssignment);
        let status: RoomStatus = serde_json::from_str("\"group-pulse\"").unwrap();
        assert_eq!(status, RoomStatus::GroupPulse);
        let status: RoomStatus = serde_json::from_str("\"ended\"").unwrap();
        assert_eq!(status, RoomStatus::Finished);
    }

    #[test]
    fn statuses_serialize_underscored_only() {
        let json = serde_json::to_string(&RoomStatus::TeamAssignment).unwrap();
        assert_eq!(json, "\"team_assignment\"");
        let json = serde_json::to_string(&RoomStatus::Finished).unwrap();
        assert_eq!(json, "\"finished\"");
    }

    #[test]
    fn display_name_prefers_custom() {
        let mut team = TeamEntity {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            original_name: "Team 1".into(),
            custom_name: None,
            color: "bg-blue-500".into(),
            score: 0,
            created_at: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(team.display_name(), "Team 1");
        team.custom_name = Some("The Quizzards".into());
        assert_eq!(team.display_name(), "The Quizzards");
    }
}
