use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Icebreakr Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::update_status,
        crate::routes::rooms::update_config,
        crate::routes::rooms::list_players,
        crate::routes::rooms::heartbeat,
        crate::routes::rooms::client_config,
        crate::routes::teams::assign_teams,
        crate::routes::teams::list_teams,
        crate::routes::teams::rename_team,
        crate::routes::teams::suggest_name,
        crate::routes::teams::list_suggestions,
        crate::routes::game::get_state,
        crate::routes::game::start_game,
        crate::routes::game::end_game,
        crate::routes::game::start_round,
        crate::routes::game::score_round,
        crate::routes::game::submit_quiz_answer,
        crate::routes::game::list_quiz_answers,
        crate::routes::game::submit_phrase_guess,
        crate::routes::game::list_phrase_guesses,
        crate::routes::game::rotate_clue,
        crate::routes::game::current_clue,
        crate::routes::game::submit_alignment_answer,
        crate::routes::game::list_alignment_answers,
        crate::routes::game::submit_pulse_response,
        crate::routes::game::pulse_results,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::ClientConfigResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::JoinRoomResponse,
            crate::dto::room::RoomResponse,
            crate::dto::room::UpdateStatusRequest,
            crate::dto::room::UpdateConfigRequest,
            crate::dto::player::PlayerResponse,
            crate::dto::team::AssignTeamsRequest,
            crate::dto::team::RenameTeamRequest,
            crate::dto::team::SuggestNameRequest,
            crate::dto::team::TeamResponse,
            crate::dto::team::TeamWithRosterResponse,
            crate::dto::team::NameSuggestionResponse,
            crate::dto::game::StartRoundRequest,
            crate::dto::game::GameStateResponse,
            crate::dto::game::RoundOutcomeResponse,
            crate::dto::game::TeamRoundResult,
            crate::dto::game::QuizAnswerRequest,
            crate::dto::game::QuizAnswerResponse,
            crate::dto::game::PhraseGuessRequest,
            crate::dto::game::PhraseGuessResponse,
            crate::dto::game::RotateClueRequest,
            crate::dto::game::ClueResponse,
            crate::dto::game::AlignmentAnswerRequest,
            crate::dto::game::AlignmentAnswerResponse,
            crate::dto::game::PulseSubmitRequest,
            crate::dto::game::PulseResultsResponse,
            crate::dto::game::PulseQuestionResultDto,
            crate::dto::sse::ChangeNotification,
            crate::dao::models::RoomStatus,
            crate::dao::models::GameMode,
            crate::dao::models::GameStatus,
            crate::dao::models::PresenceStatus,
            crate::dao::room_store::StoreTable,
            crate::dao::room_store::ChangeOp,
            crate::content::ContentPack,
            crate::content::QuizQuestion,
            crate::content::SecretPhrase,
            crate::content::AlignmentPrompt,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room lifecycle and players"),
        (name = "teams", description = "Team allocation and naming"),
        (name = "game", description = "Game state, rounds and answers"),
        (name = "sse", description = "Per-room change-signal streams"),
    )
)]
pub struct ApiDoc;
