//! Abstraction over the persisted store backing every room.
//!
//! The store is the single source of truth: clients hold no authoritative
//! state, only disposable caches rebuilt from here. Besides row CRUD the
//! contract exposes a per-room change feed whose events carry only a signal
//! (table + operation), never a delta — consumers re-fetch the affected
//! collection in full.

pub mod memory;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::content::ContentPack;
use crate::dao::models::{
    AlignmentAnswerEntity, GameMode, GameStateEntity, GameStatus, PhraseClueEntity,
    PhraseGuessEntity, PlayerEntity, PresenceStatus, PulseResponseEntity, QuizAnswerEntity,
    RoomEntity, RoomStatus, TeamEntity, TeamNameSuggestionEntity,
};
use crate::dao::storage::StorageResult;

/// Tables covered by the change feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StoreTable {
    /// Room rows.
    Rooms,
    /// Player rows.
    Players,
    /// Team rows.
    Teams,
    /// The per-room game-state singleton.
    GameState,
    /// Trivia answers.
    PopQuizAnswers,
    /// Phrase guesses.
    SecretPhraseGuesses,
    /// Phrase clue-rotation state.
    SecretPhraseClues,
    /// Alignment votes (legacy table name).
    SyncAnswers,
    /// Warm-up votes.
    GroupPulseResponses,
    /// Team name suggestions.
    TeamNames,
}

impl StoreTable {
    /// The table's name in the external schema.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreTable::Rooms => "rooms",
            StoreTable::Players => "players",
            StoreTable::Teams => "teams",
            StoreTable::GameState => "game_state",
            StoreTable::PopQuizAnswers => "pop_quiz_answers",
            StoreTable::SecretPhraseGuesses => "secret_phrase_guesses",
            StoreTable::SecretPhraseClues => "secret_phrase_clues",
            StoreTable::SyncAnswers => "sync_answers",
            StoreTable::GroupPulseResponses => "group_pulse_responses",
            StoreTable::TeamNames => "team_names",
        }
    }
}

/// Kind of row change behind a feed event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    /// A row was inserted.
    Insert,
    /// A row was updated (includes upserts that replaced an existing row).
    Update,
    /// One or more rows were deleted.
    Delete,
}

/// Signal published on the change feed after a committed mutation.
///
/// Deliberately carries no row payload: the refetch-on-notify strategy means
/// consumers always re-pull current state rather than merging deltas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ChangeEvent {
    /// Table the change happened on.
    pub table: StoreTable,
    /// What kind of change it was.
    pub op: ChangeOp,
    /// Room whose rows changed; the feed is already filtered per room.
    pub room_id: Uuid,
}

/// Input for creating a room row.
#[derive(Debug, Clone)]
pub struct NewRoom {
    /// Six uppercase alphanumeric characters; unique case-insensitively.
    pub code: String,
    /// The creating player's id.
    pub host_id: Uuid,
    /// Selected mini-game, if chosen at creation.
    pub game_mode: Option<GameMode>,
    /// Free-text topic.
    pub topic: Option<String>,
    /// Denormalized content snapshot.
    pub content_pack: Option<ContentPack>,
    /// Target players per team.
    pub team_size: u32,
    /// Winning score threshold.
    pub target_score: i32,
}

/// Partial update for a room's configuration. Absent fields are left
/// untouched; `content_pack` is replaced wholesale when present, never
/// merged structurally.
#[derive(Debug, Clone, Default)]
pub struct RoomConfigPatch {
    /// New team-size target.
    pub team_size: Option<u32>,
    /// New winning threshold.
    pub target_score: Option<i32>,
    /// New mini-game selection.
    pub game_mode: Option<GameMode>,
    /// New topic text.
    pub topic: Option<String>,
    /// Replacement content snapshot.
    pub content_pack: Option<ContentPack>,
}

/// Input for creating a player row.
#[derive(Debug, Clone)]
pub struct NewPlayer {
    /// Caller-generated id, so a room row can reference its host player
    /// before that player row exists.
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Username, unique within the room.
    pub username: String,
    /// Whether this row is the room's host.
    pub is_host: bool,
}

/// Input for creating a team row.
#[derive(Debug, Clone)]
pub struct NewTeam {
    /// Owning room.
    pub room_id: Uuid,
    /// Deterministic "Team N" label.
    pub original_name: String,
    /// Carried-over custom name, when re-allocation preserves one.
    pub custom_name: Option<String>,
    /// Palette entry for this team.
    pub color: String,
}

/// Partial upsert for the game-state singleton. Absent fields keep their
/// current value (or the field default when the row is being created).
#[derive(Debug, Clone, Default)]
pub struct GameStatePatch {
    /// Mini-game being played.
    pub game_mode: Option<GameMode>,
    /// Round counter.
    pub current_round: Option<u32>,
    /// Content index of the live question.
    pub current_question_index: Option<Option<u32>>,
    /// Snapshot of the live question.
    pub current_question: Option<Option<serde_json::Value>>,
    /// Display seconds for clients that have not derived from the cutoff yet.
    pub time_left: Option<Option<u32>>,
    /// When the round opened.
    pub round_started_at: Option<Option<std::time::SystemTime>>,
    /// Authoritative round cutoff.
    pub round_ends_at: Option<Option<std::time::SystemTime>>,
    /// Round lifecycle phase.
    pub status: Option<GameStatus>,
}

/// Input for a trivia answer upsert, keyed (room, player, round).
#[derive(Debug, Clone)]
pub struct NewQuizAnswer {
    /// Owning room.
    pub room_id: Uuid,
    /// Answering player.
    pub player_id: Uuid,
    /// Player's team at write time.
    pub team_id: Option<Uuid>,
    /// Round of the answer.
    pub round_number: u32,
    /// Content index of the question.
    pub question_index: u32,
    /// Chosen option, -1 for no pick.
    pub selected_answer: i32,
    /// Whether the pick was correct.
    pub is_correct: bool,
}

/// Input for an append-only phrase guess.
#[derive(Debug, Clone)]
pub struct NewPhraseGuess {
    /// Owning room.
    pub room_id: Uuid,
    /// Guessing player.
    pub player_id: Uuid,
    /// Player's team at write time.
    pub team_id: Option<Uuid>,
    /// Round of the guess.
    pub round_number: u32,
    /// Guessed text.
    pub guess: String,
    /// Whether the guess matched the phrase.
    pub is_correct: bool,
}

/// Input for an alignment vote upsert, keyed (room, player, round).
#[derive(Debug, Clone)]
pub struct NewAlignmentAnswer {
    /// Owning room.
    pub room_id: Uuid,
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
}

/// Input for a warm-up vote upsert, keyed (room, player, question).
#[derive(Debug, Clone)]
pub struct NewPulseResponse {
    /// Owning room.
    pub room_id: Uuid,
    /// Voting player.
    pub player_id: Uuid,
    /// Which warm-up question.
    pub question_index: u32,
    /// Chosen option index.
    pub answer_index: u32,
}

/// Input for a team-name suggestion upsert, keyed (team, player).
#[derive(Debug, Clone)]
pub struct NewTeamNameSuggestion {
    /// Team being named.
    pub team_id: Uuid,
    /// Suggesting player.
    pub player_id: Uuid,
    /// The proposed name.
    pub suggested_name: String,
}

/// Abstraction over the persistence layer for rooms and everything keyed to
/// them. Every mutation publishes a [`ChangeEvent`] on the owning room's feed
/// after commit.
pub trait RoomStore: Send + Sync {
    /// Insert a room; fails with a conflict when the code is already taken
    /// (case-insensitively).
    fn insert_room(&self, room: NewRoom) -> BoxFuture<'static, StorageResult<RoomEntity>>;
    /// Fetch a room by id.
    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Fetch a room by code, case-insensitively.
    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Write a new lifecycle status. No transition table is enforced here.
    fn update_room_status(
        &self,
        room_id: Uuid,
        status: RoomStatus,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Apply a partial configuration update.
    fn update_room_config(
        &self,
        room_id: Uuid,
        patch: RoomConfigPatch,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert a player; fails with a conflict when the username is already
    /// taken within the room. The conflict is the idempotency signal for
    /// join-or-reconnect.
    fn insert_player(&self, player: NewPlayer)
    -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    /// Fetch a player by id.
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Fetch a player by (room, username).
    fn find_player_by_username(
        &self,
        room_id: Uuid,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// All players of a room, in insertion order.
    fn list_players(&self, room_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Players of one team, in insertion order.
    fn list_players_by_team(
        &self,
        room_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Move a player onto a team (or off any team with `None`).
    fn set_player_team(
        &self,
        player_id: Uuid,
        team_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Refresh a player's presence marker and `last_seen`.
    fn touch_presence(
        &self,
        player_id: Uuid,
        status: PresenceStatus,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert a team row.
    fn insert_team(&self, team: NewTeam) -> BoxFuture<'static, StorageResult<TeamEntity>>;
    /// Delete every team of a room (the full-replace half of allocation).
    fn delete_teams(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// All teams of a room, in insertion order.
    fn list_teams(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Fetch a team by id.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Set or clear a team's custom name.
    fn set_team_custom_name(
        &self,
        team_id: Uuid,
        custom_name: Option<String>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically add `delta` to a team's score, returning the new value.
    /// This is the only score-write path; there is no read-modify-write.
    fn increment_team_score(
        &self,
        team_id: Uuid,
        delta: i32,
    ) -> BoxFuture<'static, StorageResult<i32>>;

    /// Create or patch the game-state singleton for a room.
    fn upsert_game_state(
        &self,
        room_id: Uuid,
        patch: GameStatePatch,
    ) -> BoxFuture<'static, StorageResult<GameStateEntity>>;
    /// Fetch the game-state singleton, if the game has started.
    fn find_game_state(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>>;

    /// Upsert a trivia answer keyed (room, player, round).
    fn upsert_quiz_answer(
        &self,
        answer: NewQuizAnswer,
    ) -> BoxFuture<'static, StorageResult<QuizAnswerEntity>>;
    /// All trivia answers for a round, in submission order.
    fn list_quiz_answers(
        &self,
        room_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizAnswerEntity>>>;

    /// Append a phrase guess.
    fn insert_phrase_guess(
        &self,
        guess: NewPhraseGuess,
    ) -> BoxFuture<'static, StorageResult<PhraseGuessEntity>>;
    /// All guesses for a round, in submission order.
    fn list_phrase_guesses(
        &self,
        room_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<PhraseGuessEntity>>>;

    /// Upsert clue-rotation state keyed (room, round, clue_index).
    fn upsert_phrase_clue(
        &self,
        clue: PhraseClueEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// The highest-index clue written for a round, i.e. the current one.
    fn latest_phrase_clue(
        &self,
        room_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<PhraseClueEntity>>>;

    /// Upsert an alignment vote keyed (room, player, round).
    fn upsert_alignment_answer(
        &self,
        answer: NewAlignmentAnswer,
    ) -> BoxFuture<'static, StorageResult<AlignmentAnswerEntity>>;
    /// All alignment votes for a round, in submission order.
    fn list_alignment_answers(
        &self,
        room_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<AlignmentAnswerEntity>>>;

    /// Upsert a warm-up vote keyed (room, player, question).
    fn upsert_pulse_response(
        &self,
        response: NewPulseResponse,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Every warm-up vote of a room, in submission order.
    fn list_pulse_responses(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PulseResponseEntity>>>;

    /// Upsert a name suggestion keyed (team, player).
    fn upsert_team_name_suggestion(
        &self,
        suggestion: NewTeamNameSuggestion,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Suggestions for a team, in submission order.
    fn list_team_name_suggestions(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamNameSuggestionEntity>>>;

    /// Subscribe to the change feed filtered to one room's rows.
    fn subscribe_changes(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<broadcast::Receiver<ChangeEvent>>>;

    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
