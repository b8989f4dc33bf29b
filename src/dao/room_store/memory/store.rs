use std::sync::Arc;
use std::time::SystemTime;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use super::feed::ChangeFeed;
use crate::dao::models::{
    AlignmentAnswerEntity, GameStateEntity, GameStatus, PhraseClueEntity, PhraseGuessEntity,
    PlayerEntity, PresenceStatus, PulseResponseEntity, QuizAnswerEntity, RoomEntity, RoomStatus,
    TeamEntity, TeamNameSuggestionEntity,
};
use crate::dao::room_store::{
    ChangeEvent, ChangeOp, GameStatePatch, NewAlignmentAnswer, NewPhraseGuess, NewPlayer,
    NewPulseResponse, NewQuizAnswer, NewRoom, NewTeam, NewTeamNameSuggestion, RoomConfigPatch,
    RoomStore, StoreTable,
};
use crate::dao::storage::{StorageError, StorageResult};

/// Events buffered per room before slow subscribers start lagging.
const FEED_CAPACITY: usize = 64;

/// In-memory [`RoomStore`] backend. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct MemoryRoomStore {
    inner: Arc<Inner>,
}

struct Inner {
    tables: RwLock<Tables>,
    feed: ChangeFeed,
}

/// Upsert keys follow the external schema's conflict targets.
#[derive(Default)]
struct Tables {
    rooms: IndexMap<Uuid, RoomEntity>,
    players: IndexMap<Uuid, PlayerEntity>,
    teams: IndexMap<Uuid, TeamEntity>,
    game_state: IndexMap<Uuid, GameStateEntity>,
    quiz_answers: IndexMap<(Uuid, Uuid, u32), QuizAnswerEntity>,
    phrase_guesses: Vec<PhraseGuessEntity>,
    phrase_clues: IndexMap<(Uuid, u32, u32), PhraseClueEntity>,
    alignment_answers: IndexMap<(Uuid, Uuid, u32), AlignmentAnswerEntity>,
    pulse_responses: IndexMap<(Uuid, Uuid, u32), PulseResponseEntity>,
    team_name_suggestions: IndexMap<(Uuid, Uuid), TeamNameSuggestionEntity>,
}

impl MemoryRoomStore {
    /// Build an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(Tables::default()),
                feed: ChangeFeed::new(FEED_CAPACITY),
            }),
        }
    }
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore for MemoryRoomStore {
    fn insert_room(&self, room: NewRoom) -> BoxFuture<'static, StorageResult<RoomEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            if tables
                .rooms
                .values()
                .any(|existing| existing.code.eq_ignore_ascii_case(&room.code))
            {
                return Err(StorageError::conflict(format!(
                    "room code `{}` already in use",
                    room.code
                )));
            }

            let now = SystemTime::now();
            let entity = RoomEntity {
                id: Uuid::new_v4(),
                code: room.code,
                host_id: room.host_id,
                status: RoomStatus::Waiting,
                game_mode: room.game_mode,
                topic: room.topic,
                content_pack: room.content_pack,
                team_size: room.team_size,
                target_score: room.target_score,
                created_at: now,
                updated_at: now,
            };
            tables.rooms.insert(entity.id, entity.clone());
            drop(tables);

            inner
                .feed
                .publish(entity.id, StoreTable::Rooms, ChangeOp::Insert);
            Ok(entity)
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables.rooms.get(&id).cloned())
        })
    }

    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .rooms
                .values()
                .find(|room| room.code.eq_ignore_ascii_case(&code))
                .cloned())
        })
    }

    fn update_room_status(
        &self,
        room_id: Uuid,
        status: RoomStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            let Some(room) = tables.rooms.get_mut(&room_id) else {
                return Ok(());
            };
            room.status = status;
            room.updated_at = SystemTime::now();
            drop(tables);

            inner
                .feed
                .publish(room_id, StoreTable::Rooms, ChangeOp::Update);
            Ok(())
        })
    }

    fn update_room_config(
        &self,
        room_id: Uuid,
        patch: RoomConfigPatch,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            let Some(room) = tables.rooms.get_mut(&room_id) else {
                return Ok(());
            };
            if let Some(team_size) = patch.team_size {
                room.team_size = team_size;
            }
            if let Some(target_score) = patch.target_score {
                room.target_score = target_score;
            }
            if let Some(game_mode) = patch.game_mode {
                room.game_mode = Some(game_mode);
            }
            if let Some(topic) = patch.topic {
                room.topic = Some(topic);
            }
            if let Some(content_pack) = patch.content_pack {
                // Wholesale replacement; packs are never merged structurally.
                room.content_pack = Some(content_pack);
            }
            room.updated_at = SystemTime::now();
            drop(tables);

            inner
                .feed
                .publish(room_id, StoreTable::Rooms, ChangeOp::Update);
            Ok(())
        })
    }

    fn insert_player(
        &self,
        player: NewPlayer,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            if tables
                .players
                .values()
                .any(|existing| existing.room_id == player.room_id && existing.username == player.username)
            {
                return Err(StorageError::conflict(format!(
                    "username `{}` already taken in room",
                    player.username
                )));
            }

            let now = SystemTime::now();
            let entity = PlayerEntity {
                id: player.id,
                room_id: player.room_id,
                username: player.username,
                is_host: player.is_host,
                team_id: None,
                presence_status: PresenceStatus::Online,
                last_seen: now,
                created_at: now,
            };
            tables.players.insert(entity.id, entity.clone());
            drop(tables);

            inner
                .feed
                .publish(entity.room_id, StoreTable::Players, ChangeOp::Insert);
            Ok(entity)
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables.players.get(&id).cloned())
        })
    }

    fn find_player_by_username(
        &self,
        room_id: Uuid,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .players
                .values()
                .find(|player| player.room_id == room_id && player.username == username)
                .cloned())
        })
    }

    fn list_players(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .players
                .values()
                .filter(|player| player.room_id == room_id)
                .cloned()
                .collect())
        })
    }

    fn list_players_by_team(
        &self,
        room_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .players
                .values()
                .filter(|player| player.room_id == room_id && player.team_id == Some(team_id))
                .cloned()
                .collect())
        })
    }

    fn set_player_team(
        &self,
        player_id: Uuid,
        team_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            let Some(player) = tables.players.get_mut(&player_id) else {
                return Ok(());
            };
            player.team_id = team_id;
            let room_id = player.room_id;
            drop(tables);

            inner
                .feed
                .publish(room_id, StoreTable::Players, ChangeOp::Update);
            Ok(())
        })
    }

    fn touch_presence(
        &self,
        player_id: Uuid,
        status: PresenceStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            let Some(player) = tables.players.get_mut(&player_id) else {
                return Ok(());
            };
            player.presence_status = status;
            player.last_seen = SystemTime::now();
            let room_id = player.room_id;
            drop(tables);

            inner
                .feed
                .publish(room_id, StoreTable::Players, ChangeOp::Update);
            Ok(())
        })
    }

    fn insert_team(&self, team: NewTeam) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = TeamEntity {
                id: Uuid::new_v4(),
                room_id: team.room_id,
                original_name: team.original_name,
                custom_name: team.custom_name,
                color: team.color,
                score: 0,
                created_at: SystemTime::now(),
            };
            let mut tables = inner.tables.write().await;
            tables.teams.insert(entity.id, entity.clone());
            drop(tables);

            inner
                .feed
                .publish(entity.room_id, StoreTable::Teams, ChangeOp::Insert);
            Ok(entity)
        })
    }

    fn delete_teams(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            let before = tables.teams.len();
            tables.teams.retain(|_, team| team.room_id != room_id);
            let removed = before != tables.teams.len();
            drop(tables);

            if removed {
                inner
                    .feed
                    .publish(room_id, StoreTable::Teams, ChangeOp::Delete);
            }
            Ok(())
        })
    }

    fn list_teams(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .teams
                .values()
                .filter(|team| team.room_id == room_id)
                .cloned()
                .collect())
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables.teams.get(&id).cloned())
        })
    }

    fn set_team_custom_name(
        &self,
        team_id: Uuid,
        custom_name: Option<String>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            let Some(team) = tables.teams.get_mut(&team_id) else {
                return Ok(());
            };
            team.custom_name = custom_name;
            let room_id = team.room_id;
            drop(tables);

            inner
                .feed
                .publish(room_id, StoreTable::Teams, ChangeOp::Update);
            Ok(())
        })
    }

    fn increment_team_score(
        &self,
        team_id: Uuid,
        delta: i32,
    ) -> BoxFuture<'static, StorageResult<i32>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.tables.write().await;
            let Some(team) = tables.teams.get_mut(&team_id) else {
                // The team vanished under us (e.g. re-allocation raced the
                // scoring step); surface it instead of inventing a row.
                return Err(StorageError::conflict(format!(
                    "team `{team_id}` no longer exists"
                )));
            };
            team.score += delta;
            let new_score = team.score;
            let room_id = team.room_id;
            drop(tables);

            inner
                .feed
                .publish(room_id, StoreTable::Teams, ChangeOp::Update);
            Ok(new_score)
        })
    }

    fn upsert_game_state(
        &self,
        room_id: Uuid,
        patch: GameStatePatch,
    ) -> BoxFuture<'static, StorageResult<GameStateEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let now = SystemTime::now();
            let mut tables = inner.tables.write().await;
            let created = !tables.game_state.contains_key(&room_id);
            let state = tables
                .game_state
                .entry(room_id)
                .or_insert_with(|| GameStateEntity {
                    room_id,
                    game_mode: None,
                    current_round: 0,
                    current_question_index: None,
                    current_question: None,
                    time_left: None,
                    round_started_at: None,
                    round_ends_at: None,
                    status: GameStatus::Starting,
                    created_at: now,
                    updated_at: now,
                });

            if let Some(game_mode) = patch.game_mode {
                state.game_mode = Some(game_mode);
            }
            if let Some(current_round) = patch.current_round {
                state.current_round = current_round;
            }
            if let Some(current_question_index) = patch.current_question_index {
                state.current_question_index = current_question_index;
            }
            if let Some(current_question) = patch.current_question {
                state.current_question = current_question;
            }
            if let Some(time_left) = patch.time_left {
                state.time_left = time_left;
            }
            if let Some(round_started_at) = patch.round_started_at {
                state.round_started_at = round_started_at;
            }
            if let Some(round_ends_at) = patch.round_ends_at {
                state.round_ends_at = round_ends_at;
            }
            if let Some(status) = patch.status {
                state.status = status;
            }
            state.updated_at = now;
            let entity = state.clone();
            drop(tables);

            let op = if created {
                ChangeOp::Insert
            } else {
                ChangeOp::Update
            };
            inner.feed.publish(room_id, StoreTable::GameState, op);
            Ok(entity)
        })
    }

    fn find_game_state(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables.game_state.get(&room_id).cloned())
        })
    }

    fn upsert_quiz_answer(
        &self,
        answer: NewQuizAnswer,
    ) -> BoxFuture<'static, StorageResult<QuizAnswerEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = QuizAnswerEntity {
                room_id: answer.room_id,
                player_id: answer.player_id,
                team_id: answer.team_id,
                round_number: answer.round_number,
                question_index: answer.question_index,
                selected_answer: answer.selected_answer,
                is_correct: answer.is_correct,
                answered_at: SystemTime::now(),
            };
            let key = (answer.room_id, answer.player_id, answer.round_number);
            let mut tables = inner.tables.write().await;
            let replaced = tables.quiz_answers.insert(key, entity.clone()).is_some();
            drop(tables);

            let op = if replaced {
                ChangeOp::Update
            } else {
                ChangeOp::Insert
            };
            inner
                .feed
                .publish(entity.room_id, StoreTable::PopQuizAnswers, op);
            Ok(entity)
        })
    }

    fn list_quiz_answers(
        &self,
        room_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizAnswerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .quiz_answers
                .values()
                .filter(|answer| answer.room_id == room_id && answer.round_number == round_number)
                .cloned()
                .collect())
        })
    }

    fn insert_phrase_guess(
        &self,
        guess: NewPhraseGuess,
    ) -> BoxFuture<'static, StorageResult<PhraseGuessEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = PhraseGuessEntity {
                id: Uuid::new_v4(),
                room_id: guess.room_id,
                player_id: guess.player_id,
                team_id: guess.team_id,
                round_number: guess.round_number,
                guess: guess.guess,
                is_correct: guess.is_correct,
                guessed_at: SystemTime::now(),
            };
            let mut tables = inner.tables.write().await;
            tables.phrase_guesses.push(entity.clone());
            drop(tables);

            inner.feed.publish(
                entity.room_id,
                StoreTable::SecretPhraseGuesses,
                ChangeOp::Insert,
            );
            Ok(entity)
        })
    }

    fn list_phrase_guesses(
        &self,
        room_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<PhraseGuessEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .phrase_guesses
                .iter()
                .filter(|guess| guess.room_id == room_id && guess.round_number == round_number)
                .cloned()
                .collect())
        })
    }

    fn upsert_phrase_clue(
        &self,
        clue: PhraseClueEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let key = (clue.room_id, clue.round_number, clue.clue_index);
            let room_id = clue.room_id;
            let mut tables = inner.tables.write().await;
            let replaced = tables.phrase_clues.insert(key, clue).is_some();
            drop(tables);

            let op = if replaced {
                ChangeOp::Update
            } else {
                ChangeOp::Insert
            };
            inner
                .feed
                .publish(room_id, StoreTable::SecretPhraseClues, op);
            Ok(())
        })
    }

    fn latest_phrase_clue(
        &self,
        room_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<PhraseClueEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .phrase_clues
                .values()
                .filter(|clue| clue.room_id == room_id && clue.round_number == round_number)
                .max_by_key(|clue| clue.clue_index)
                .cloned())
        })
    }

    fn upsert_alignment_answer(
        &self,
        answer: NewAlignmentAnswer,
    ) -> BoxFuture<'static, StorageResult<AlignmentAnswerEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = AlignmentAnswerEntity {
                room_id: answer.room_id,
                player_id: answer.player_id,
                team_id: answer.team_id,
                round_number: answer.round_number,
                question_index: answer.question_index,
                selected_answer: answer.selected_answer,
                locked_at: SystemTime::now(),
            };
            let key = (answer.room_id, answer.player_id, answer.round_number);
            let mut tables = inner.tables.write().await;
            let replaced = tables
                .alignment_answers
                .insert(key, entity.clone())
                .is_some();
            drop(tables);

            let op = if replaced {
                ChangeOp::Update
            } else {
                ChangeOp::Insert
            };
            inner
                .feed
                .publish(entity.room_id, StoreTable::SyncAnswers, op);
            Ok(entity)
        })
    }

    fn list_alignment_answers(
        &self,
        room_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<AlignmentAnswerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .alignment_answers
                .values()
                .filter(|answer| answer.room_id == room_id && answer.round_number == round_number)
                .cloned()
                .collect())
        })
    }

    fn upsert_pulse_response(
        &self,
        response: NewPulseResponse,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = PulseResponseEntity {
                room_id: response.room_id,
                player_id: response.player_id,
                question_index: response.question_index,
                answer_index: response.answer_index,
                created_at: SystemTime::now(),
            };
            let key = (response.room_id, response.player_id, response.question_index);
            let room_id = response.room_id;
            let mut tables = inner.tables.write().await;
            let replaced = tables.pulse_responses.insert(key, entity).is_some();
            drop(tables);

            let op = if replaced {
                ChangeOp::Update
            } else {
                ChangeOp::Insert
            };
            inner
                .feed
                .publish(room_id, StoreTable::GroupPulseResponses, op);
            Ok(())
        })
    }

    fn list_pulse_responses(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PulseResponseEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .pulse_responses
                .values()
                .filter(|response| response.room_id == room_id)
                .cloned()
                .collect())
        })
    }

    fn upsert_team_name_suggestion(
        &self,
        suggestion: NewTeamNameSuggestion,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = TeamNameSuggestionEntity {
                team_id: suggestion.team_id,
                player_id: suggestion.player_id,
                suggested_name: suggestion.suggested_name,
                created_at: SystemTime::now(),
            };
            let key = (suggestion.team_id, suggestion.player_id);
            let mut tables = inner.tables.write().await;
            let room_id = tables
                .teams
                .get(&suggestion.team_id)
                .map(|team| team.room_id);
            let replaced = tables.team_name_suggestions.insert(key, entity).is_some();
            drop(tables);

            if let Some(room_id) = room_id {
                let op = if replaced {
                    ChangeOp::Update
                } else {
                    ChangeOp::Insert
                };
                inner.feed.publish(room_id, StoreTable::TeamNames, op);
            }
            Ok(())
        })
    }

    fn list_team_name_suggestions(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamNameSuggestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.tables.read().await;
            Ok(tables
                .team_name_suggestions
                .values()
                .filter(|suggestion| suggestion.team_id == team_id)
                .cloned()
                .collect())
        })
    }

    fn subscribe_changes(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<broadcast::Receiver<ChangeEvent>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.feed.subscribe(room_id)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_room(code: &str) -> NewRoom {
        NewRoom {
            code: code.into(),
            host_id: Uuid::new_v4(),
            game_mode: None,
            topic: None,
            content_pack: None,
            team_size: 4,
            target_score: 5,
        }
    }

    fn new_player(room_id: Uuid, username: &str) -> NewPlayer {
        NewPlayer {
            id: Uuid::new_v4(),
            room_id,
            username: username.into(),
            is_host: false,
        }
    }

    #[tokio::test]
    async fn duplicate_room_code_conflicts_case_insensitively() {
        let store = MemoryRoomStore::new();
        store.insert_room(new_room("ABC123")).await.unwrap();

        let err = store.insert_room(new_room("abc123")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn room_lookup_by_code_ignores_case() {
        let store = MemoryRoomStore::new();
        let room = store.insert_room(new_room("QWERTY")).await.unwrap();

        let found = store
            .find_room_by_code("qwerty".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, room.id);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_within_room_only() {
        let store = MemoryRoomStore::new();
        let room_a = store.insert_room(new_room("AAAAAA")).await.unwrap();
        let room_b = store.insert_room(new_room("BBBBBB")).await.unwrap();

        store.insert_player(new_player(room_a.id, "ana")).await.unwrap();
        let err = store
            .insert_player(new_player(room_a.id, "ana"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // Same name in a different room is fine.
        store.insert_player(new_player(room_b.id, "ana")).await.unwrap();
    }

    #[tokio::test]
    async fn players_list_in_insertion_order() {
        let store = MemoryRoomStore::new();
        let room = store.insert_room(new_room("CCCCCC")).await.unwrap();
        for name in ["first", "second", "third"] {
            store.insert_player(new_player(room.id, name)).await.unwrap();
        }

        let players = store.list_players(room.id).await.unwrap();
        let names: Vec<&str> = players.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn quiz_answer_upsert_keeps_exactly_one_row() {
        let store = MemoryRoomStore::new();
        let room = store.insert_room(new_room("DDDDDD")).await.unwrap();
        let player = store.insert_player(new_player(room.id, "p1")).await.unwrap();

        let base = NewQuizAnswer {
            room_id: room.id,
            player_id: player.id,
            team_id: None,
            round_number: 0,
            question_index: 0,
            selected_answer: 1,
            is_correct: false,
        };
        store.upsert_quiz_answer(base.clone()).await.unwrap();
        store
            .upsert_quiz_answer(NewQuizAnswer {
                selected_answer: 2,
                is_correct: true,
                ..base
            })
            .await
            .unwrap();

        let answers = store.list_quiz_answers(room.id, 0).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].selected_answer, 2);
        assert!(answers[0].is_correct);
    }

    #[tokio::test]
    async fn phrase_guesses_append() {
        let store = MemoryRoomStore::new();
        let room = store.insert_room(new_room("EEEEEE")).await.unwrap();
        let player = store.insert_player(new_player(room.id, "p1")).await.unwrap();

        for guess in ["WRONG ONE", "WRONG TWO"] {
            store
                .insert_phrase_guess(NewPhraseGuess {
                    room_id: room.id,
                    player_id: player.id,
                    team_id: None,
                    round_number: 0,
                    guess: guess.into(),
                    is_correct: false,
                })
                .await
                .unwrap();
        }

        let guesses = store.list_phrase_guesses(room.id, 0).await.unwrap();
        assert_eq!(guesses.len(), 2);
    }

    #[tokio::test]
    async fn score_increment_is_cumulative_and_returns_new_value() {
        let store = MemoryRoomStore::new();
        let room = store.insert_room(new_room("FFFFFF")).await.unwrap();
        let team = store
            .insert_team(NewTeam {
                room_id: room.id,
                original_name: "Team 1".into(),
                custom_name: None,
                color: "bg-blue-500".into(),
            })
            .await
            .unwrap();

        assert_eq!(store.increment_team_score(team.id, 2).await.unwrap(), 2);
        assert_eq!(store.increment_team_score(team.id, 3).await.unwrap(), 5);

        let stored = store.find_team(team.id).await.unwrap().unwrap();
        assert_eq!(stored.score, 5);
    }

    #[tokio::test]
    async fn increment_on_deleted_team_is_a_conflict() {
        let store = MemoryRoomStore::new();
        let room = store.insert_room(new_room("GGGGGG")).await.unwrap();
        let team = store
            .insert_team(NewTeam {
                room_id: room.id,
                original_name: "Team 1".into(),
                custom_name: None,
                color: "bg-blue-500".into(),
            })
            .await
            .unwrap();
        store.delete_teams(room.id).await.unwrap();

        let err = store.increment_team_score(team.id, 1).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn game_state_upsert_creates_then_patches() {
        let store = MemoryRoomStore::new();
        let room = store.insert_room(new_room("HHHHHH")).await.unwrap();

        let state = store
            .upsert_game_state(room.id, GameStatePatch::default())
            .await
            .unwrap();
        assert_eq!(state.current_round, 0);
        assert_eq!(state.status, GameStatus::Starting);

        let state = store
            .upsert_game_state(
                room.id,
                GameStatePatch {
                    current_round: Some(3),
                    status: Some(GameStatus::Playing),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(state.current_round, 3);
        assert_eq!(state.status, GameStatus::Playing);
    }

    #[tokio::test]
    async fn mutations_signal_subscribed_feeds() {
        let store = MemoryRoomStore::new();
        let room = store.insert_room(new_room("JJJJJJ")).await.unwrap();
        let mut feed = store.subscribe_changes(room.id).await.unwrap();

        store.insert_player(new_player(room.id, "watcher")).await.unwrap();

        let event = feed.recv().await.unwrap();
        assert_eq!(event.table, StoreTable::Players);
        assert_eq!(event.op, ChangeOp::Insert);
        assert_eq!(event.room_id, room.id);
    }

    #[tokio::test]
    async fn feeds_are_filtered_per_room() {
        let store = MemoryRoomStore::new();
        let room_a = store.insert_room(new_room("KKKKKK")).await.unwrap();
        let room_b = store.insert_room(new_room("LLLLLL")).await.unwrap();
        let mut feed_a = store.subscribe_changes(room_a.id).await.unwrap();

        store.insert_player(new_player(room_b.id, "other")).await.unwrap();
        store.insert_player(new_player(room_a.id, "mine")).await.unwrap();

        let event = feed_a.recv().await.unwrap();
        assert_eq!(event.room_id, room_a.id);
    }
}
