//! Clue-rotation phrase round engine.
//!
//! Guesses append (wrong ones accumulate); the clue rotation is persisted
//! state driven by the host, with each clue rotating to the player at
//! `clue_index % roster length`.

use uuid::Uuid;

use crate::{
    dao::models::{PhraseClueEntity, PhraseGuessEntity},
    dao::room_store::{NewPhraseGuess, RoomStore},
    error::ServiceError,
    services::quiz::require_room_player,
    state::SharedState,
};

/// Record a guess. Matching is case-insensitive on the trimmed text; a wrong
/// guess is stored too so everyone sees the attempts roll in.
pub async fn submit_guess(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
    round_number: u32,
    guess: &str,
) -> Result<PhraseGuessEntity, ServiceError> {
    let guess = guess.trim();
    if guess.is_empty() {
        return Err(ServiceError::InvalidInput("guess must not be empty".into()));
    }

    let store = state.store();
    let room = store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;
    let pack = room
        .content_pack
        .as_ref()
        .ok_or_else(|| ServiceError::InvalidState("room has no content pack".into()))?;
    let phrase = pack
        .phrase(round_number)
        .ok_or_else(|| ServiceError::InvalidState("content pack has no phrases".into()))?;

    let player = require_room_player(state, room_id, player_id).await?;
    let is_correct = guess.eq_ignore_ascii_case(&phrase.phrase);

    Ok(store
        .insert_phrase_guess(NewPhraseGuess {
            room_id,
            player_id,
            team_id: player.team_id,
            round_number,
            guess: guess.to_ascii_uppercase(),
            is_correct,
        })
        .await?)
}

/// All guesses for a round, oldest first.
pub async fn list_guesses(
    state: &SharedState,
    room_id: Uuid,
    round_number: u32,
) -> Result<Vec<PhraseGuessEntity>, ServiceError> {
    Ok(state
        .store()
        .list_phrase_guesses(room_id, round_number)
        .await?)
}

/// Advance the rotation to `clue_index`, handing the clue to the next player
/// in line. Fails when the phrase has no clue at that index, which is how
/// the host learns the round is exhausted.
pub async fn rotate_clue(
    state: &SharedState,
    room_id: Uuid,
    round_number: u32,
    clue_index: u32,
) -> Result<PhraseClueEntity, ServiceError> {
    let store = state.store();
    let room = store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;
    let pack = room
        .content_pack
        .as_ref()
        .ok_or_else(|| ServiceError::InvalidState("room has no content pack".into()))?;
    let phrase = pack
        .phrase(round_number)
        .ok_or_else(|| ServiceError::InvalidState("content pack has no phrases".into()))?;
    let clue_text = phrase
        .clues
        .get(clue_index as usize)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "no clue at index {clue_index}; the round is out of clues"
            ))
        })?
        .clone();

    let roster: Vec<Uuid> = store
        .list_players(room_id)
        .await?
        .into_iter()
        .filter(|player| !player.is_host)
        .map(|player| player.id)
        .collect();
    let recipient_player_id = if roster.is_empty() {
        None
    } else {
        Some(roster[clue_index as usize % roster.len()])
    };

    let clue = PhraseClueEntity {
        room_id,
        round_number,
        clue_index,
        recipient_player_id,
        clue_text,
        time_left: state.config().clue_rotation_secs(),
    };
    store.upsert_phrase_clue(clue.clone()).await?;
    Ok(clue)
}

/// The clue currently in play for a round (highest index written).
pub async fn current_clue(
    state: &SharedState,
    room_id: Uuid,
    round_number: u32,
) -> Result<Option<PhraseClueEntity>, ServiceError> {
    Ok(state
        .store()
        .latest_phrase_clue(room_id, round_number)
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

    async fn phrase_room(players: usize) -> (SharedState, Uuid, Vec<Uuid>) {
        let state = AppState::new(Arc::new(MemoryRoomStore::new()), AppConfig::default());
        let (room, _) = room_service::create_room(
            &state,
            CreateRoomRequest {
                username: "host".into(),
                topic: None,
                game_mode: Some(GameMode::SecretPhrase),
                team_size: None,
                target_score: None,
                code: None,
                content_pack: Some(content::default_pack()),
            },
        )
        .await
        .unwrap();
        let mut ids = Vec::new();
        for i in 0..players {
            let (_, player) = room_service::join_room(&state, &room.code, &format!("p{i}"))
                .await
                .unwrap();
            ids.push(player.id);
        }
        (state, room.id, ids)
    }

    #[tokio::test]
    async fn wrong_guesses_accumulate_and_matching_ignores_case() {
        let (state, room_id, players) = phrase_room(1).await;

        // Round 0's phrase is "PIZZA PARTY".
        let wrong = submit_guess(&state, room_id, players[0], 0, "taco night")
            .await
            .unwrap();
        assert!(!wrong.is_correct);
        let right = submit_guess(&state, room_id, players[0], 0, "  pizza party ")
            .await
            .unwrap();
        assert!(right.is_correct);

        let guesses = list_guesses(&state, room_id, 0).await.unwrap();
        assert_eq!(guesses.len(), 2);
    }

    #[tokio::test]
    async fn clues_rotate_through_the_roster() {
        let (state, room_id, players) = phrase_room(3).await;

        for clue_index in 0..5u32 {
            let clue = rotate_clue(&state, room_id, 0, clue_index).await.unwrap();
            assert_eq!(
                clue.recipient_player_id,
                Some(players[clue_index as usize % players.len()])
            );
        }

        let current = current_clue(&state, room_id, 0).await.unwrap().unwrap();
        assert_eq!(current.clue_index, 4);
    }

    #[tokio::test]
    async fn exhausted_clues_are_reported() {
        let (state, room_id, _) = phrase_room(2).await;

        // The default pack's phrases carry six clues each.
        let err = rotate_clue(&state, room_id, 0, 6).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
