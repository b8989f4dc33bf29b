use std::time::SystemTime;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use serde::Deserialize;

use crate::{
    dto::game::{
        AlignmentAnswerRequest, AlignmentAnswerResponse, ClueResponse, GameStateResponse,
        PhraseGuessRequest, PhraseGuessResponse, PulseResultsResponse, PulseSubmitRequest,
        QuizAnswerRequest, QuizAnswerResponse, RotateClueRequest, RoundOutcomeResponse,
        StartRoundRequest,
    },
    dto::room::RoomResponse,
    error::AppError,
    services::{alignment, game_service, phrase, pulse, quiz, room_service},
    state::SharedState,
};

/// Round selector used by the answer-listing endpoints.
#[derive(Debug, Deserialize)]
pub struct RoundQuery {
    /// Round to read.
    pub round_number: u32,
}

/// Routes handling game state, rounds and the three mini-games' answers.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/state", get(get_state))
        .route("/rooms/{code}/game/start", post(start_game))
        .route("/rooms/{code}/game/end", post(end_game))
        .route("/rooms/{code}/rounds/start", post(start_round))
        .route("/rooms/{code}/rounds/{round}/score", post(score_round))
        .route(
            "/rooms/{code}/quiz/answers",
            post(submit_quiz_answer).get(list_quiz_answers),
        )
        .route(
            "/rooms/{code}/phrase/guesses",
            post(submit_phrase_guess).get(list_phrase_guesses),
        )
        .route("/rooms/{code}/phrase/clues", post(rotate_clue))
        .route("/rooms/{code}/phrase/clue", get(current_clue))
        .route(
            "/rooms/{code}/alignment/answers",
            post(submit_alignment_answer).get(list_alignment_answers),
        )
        .route("/rooms/{code}/pulse/responses", post(submit_pulse_response))
        .route("/rooms/{code}/pulse/results", get(pulse_results))
}

/// The game-state singleton, with the countdown derived at response time.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/state",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Current game state", body = GameStateResponse),
        (status = 404, description = "The game has not started")
    )
)]
pub async fn get_state(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameStateResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let game_state = game_service::game_state(&state, room.id)
        .await?
        .ok_or_else(|| AppError::NotFound("the game has not started".into()))?;
    Ok(Json(GameStateResponse::from_entity(
        game_state,
        SystemTime::now(),
    )))
}

/// Initialize the game state and move the room to playing.
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/game/start",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Initialized game state", body = GameStateResponse)
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameStateResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let game_state = game_service::start_game(&state, room.id).await?;
    Ok(Json(GameStateResponse::from_entity(
        game_state,
        SystemTime::now(),
    )))
}

/// Mark the room and game state finished.
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/game/end",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "The finished room", body = RoomResponse)
    )
)]
pub async fn end_game(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    game_service::end_game(&state, room.id).await?;
    let room = room_service::refresh_room(&state, room.id).await?;
    Ok(Json(room.into()))
}

/// Open a round: snapshot its content and write the authoritative cutoff.
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/rounds/start",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    request_body = StartRoundRequest,
    responses(
        (status = 200, description = "The opened round's state", body = GameStateResponse)
    )
)]
pub async fn start_round(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<StartRoundRequest>,
) -> Result<Json<GameStateResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let game_state = game_service::start_round(&state, room.id, payload.round_number).await?;
    Ok(Json(GameStateResponse::from_entity(
        game_state,
        SystemTime::now(),
    )))
}

/// Score a closed round from the answer rows and run the win check.
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/rounds/{round}/score",
    tag = "game",
    params(
        ("code" = String, Path, description = "Room code"),
        ("round" = u32, Path, description = "Round number to score")
    ),
    responses(
        (status = 200, description = "Round outcome", body = RoundOutcomeResponse)
    )
)]
pub async fn score_round(
    State(state): State<SharedState>,
    Path((code, round)): Path<(String, u32)>,
) -> Result<Json<RoundOutcomeResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let outcome = game_service::score_round(&state, room.id, round).await?;
    Ok(Json(outcome))
}

/// Submit a trivia answer (one per player per round, upserted).
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/quiz/answers",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    request_body = QuizAnswerRequest,
    responses(
        (status = 200, description = "The stored answer", body = QuizAnswerResponse)
    )
)]
pub async fn submit_quiz_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<QuizAnswerRequest>,
) -> Result<Json<QuizAnswerResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let answer = quiz::submit_answer(
        &state,
        room.id,
        payload.player_id,
        payload.round_number,
        payload.selected_answer,
    )
    .await?;
    Ok(Json(answer.into()))
}

/// All trivia answers recorded for a round.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/quiz/answers",
    tag = "game",
    params(
        ("code" = String, Path, description = "Room code"),
        ("round_number" = u32, Query, description = "Round to list")
    ),
    responses(
        (status = 200, description = "Answers for the round", body = [QuizAnswerResponse])
    )
)]
pub async fn list_quiz_answers(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<RoundQuery>,
) -> Result<Json<Vec<QuizAnswerResponse>>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let answers = quiz::list_answers(&state, room.id, query.round_number).await?;
    Ok(Json(answers.into_iter().map(Into::into).collect()))
}

/// Submit a phrase guess (append-only; wrong guesses accumulate).
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/phrase/guesses",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    request_body = PhraseGuessRequest,
    responses(
        (status = 200, description = "The stored guess", body = PhraseGuessResponse)
    )
)]
pub async fn submit_phrase_guess(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<PhraseGuessRequest>>,
) -> Result<Json<PhraseGuessResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let guess = phrase::submit_guess(
        &state,
        room.id,
        payload.player_id,
        payload.round_number,
        &payload.guess,
    )
    .await?;
    Ok(Json(guess.into()))
}

/// All guesses recorded for a round, oldest first.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/phrase/guesses",
    tag = "game",
    params(
        ("code" = String, Path, description = "Room code"),
        ("round_number" = u32, Query, description = "Round to list")
    ),
    responses(
        (status = 200, description = "Guesses for the round", body = [PhraseGuessResponse])
    )
)]
pub async fn list_phrase_guesses(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<RoundQuery>,
) -> Result<Json<Vec<PhraseGuessResponse>>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let guesses = phrase::list_guesses(&state, room.id, query.round_number).await?;
    Ok(Json(guesses.into_iter().map(Into::into).collect()))
}

/// Advance the clue rotation (host-driven).
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/phrase/clues",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    request_body = RotateClueRequest,
    responses(
        (status = 200, description = "The revealed clue", body = ClueResponse),
        (status = 400, description = "The round is out of clues")
    )
)]
pub async fn rotate_clue(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<RotateClueRequest>,
) -> Result<Json<ClueResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let clue = phrase::rotate_clue(
        &state,
        room.id,
        payload.round_number,
        payload.clue_index,
    )
    .await?;
    Ok(Json(clue.into()))
}

/// The clue currently in play for a round.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/phrase/clue",
    tag = "game",
    params(
        ("code" = String, Path, description = "Room code"),
        ("round_number" = u32, Query, description = "Round being played")
    ),
    responses(
        (status = 200, description = "The live clue", body = ClueResponse),
        (status = 404, description = "No clue revealed yet")
    )
)]
pub async fn current_clue(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<RoundQuery>,
) -> Result<Json<ClueResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let clue = phrase::current_clue(&state, room.id, query.round_number)
        .await?
        .ok_or_else(|| AppError::NotFound("no clue revealed yet".into()))?;
    Ok(Json(clue.into()))
}

/// Submit an alignment vote (one per player per round, upserted).
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/alignment/answers",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    request_body = AlignmentAnswerRequest,
    responses(
        (status = 200, description = "The stored vote", body = AlignmentAnswerResponse)
    )
)]
pub async fn submit_alignment_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<AlignmentAnswerRequest>,
) -> Result<Json<AlignmentAnswerResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let answer = alignment::submit_answer(
        &state,
        room.id,
        payload.player_id,
        payload.round_number,
        payload.selected_answer,
    )
    .await?;
    Ok(Json(answer.into()))
}

/// All alignment votes recorded for a round.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/alignment/answers",
    tag = "game",
    params(
        ("code" = String, Path, description = "Room code"),
        ("round_number" = u32, Query, description = "Round to list")
    ),
    responses(
        (status = 200, description = "Votes for the round", body = [AlignmentAnswerResponse])
    )
)]
pub async fn list_alignment_answers(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<RoundQuery>,
) -> Result<Json<Vec<AlignmentAnswerResponse>>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let answers = alignment::list_answers(&state, room.id, query.round_number).await?;
    Ok(Json(answers.into_iter().map(Into::into).collect()))
}

/// Submit a warm-up vote (one per player per question, upserted).
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/pulse/responses",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    request_body = PulseSubmitRequest,
    responses(
        (status = 200, description = "Aggregated results so far", body = PulseResultsResponse)
    )
)]
pub async fn submit_pulse_response(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<PulseSubmitRequest>,
) -> Result<Json<PulseResultsResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    pulse::submit_response(
        &state,
        room.id,
        payload.player_id,
        payload.question_index,
        payload.answer_index,
    )
    .await?;
    let questions = pulse::results(&state, room.id).await?;
    Ok(Json(PulseResultsResponse {
        questions: questions.into_iter().map(Into::into).collect(),
    }))
}

/// Aggregated warm-up results for the whole room.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/pulse/results",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Per-question distributions", body = PulseResultsResponse)
    )
)]
pub async fn pulse_results(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<PulseResultsResponse>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let questions = pulse::results(&state, room.id).await?;
    Ok(Json(PulseResultsResponse {
        questions: questions.into_iter().map(Into::into).collect(),
    }))
}
