use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::team::{
        AssignTeamsRequest, NameSuggestionResponse, RenameTeamRequest, SuggestNameRequest,
        TeamResponse, TeamWithRosterResponse,
    },
    error::AppError,
    services::{room_service, team_service},
    state::SharedState,
};

/// Routes handling team allocation and naming.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/teams", get(list_teams))
        .route("/rooms/{code}/teams/assign", post(assign_teams))
        .route("/teams/{id}/name", put(rename_team))
        .route(
            "/teams/{id}/name-suggestions",
            post(suggest_name).get(list_suggestions),
        )
}

/// Run team allocation: full replace, round-robin assignment.
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/teams/assign",
    tag = "teams",
    params(("code" = String, Path, description = "Room code")),
    request_body = AssignTeamsRequest,
    responses(
        (status = 200, description = "The freshly created teams", body = [TeamResponse]),
        (status = 400, description = "No players to assign")
    )
)]
pub async fn assign_teams(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<AssignTeamsRequest>>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let teams = team_service::allocate_teams(&state, room.id, payload.team_size).await?;
    Ok(Json(teams.into_iter().map(Into::into).collect()))
}

/// Teams of the room with their rosters.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/teams",
    tag = "teams",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Teams in creation order", body = [TeamWithRosterResponse])
    )
)]
pub async fn list_teams(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<TeamWithRosterResponse>>, AppError> {
    let room = room_service::room_by_code(&state, &code).await?;
    let rosters = team_service::list_teams_with_rosters(&state, room.id).await?;
    Ok(Json(rosters.into_iter().map(Into::into).collect()))
}

/// Set a team's custom name.
#[utoipa::path(
    put,
    path = "/api/teams/{id}/name",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team id")),
    request_body = RenameTeamRequest,
    responses(
        (status = 200, description = "Renamed team", body = TeamResponse)
    )
)]
pub async fn rename_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<RenameTeamRequest>>,
) -> Result<Json<TeamResponse>, AppError> {
    let team = team_service::rename_team(&state, id, payload.custom_name).await?;
    Ok(Json(team.into()))
}

/// Record a player's name idea for the team.
#[utoipa::path(
    post,
    path = "/api/teams/{id}/name-suggestions",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team id")),
    request_body = SuggestNameRequest,
    responses(
        (status = 200, description = "All suggestions so far", body = [NameSuggestionResponse])
    )
)]
pub async fn suggest_name(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SuggestNameRequest>>,
) -> Result<Json<Vec<NameSuggestionResponse>>, AppError> {
    team_service::suggest_team_name(&state, id, payload.player_id, payload.suggested_name).await?;
    let suggestions = team_service::list_team_name_suggestions(&state, id).await?;
    Ok(Json(suggestions.into_iter().map(Into::into).collect()))
}

/// Suggestions recorded for the team, oldest first.
#[utoipa::path(
    get,
    path = "/api/teams/{id}/name-suggestions",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team id")),
    responses(
        (status = 200, description = "All suggestions so far", body = [NameSuggestionResponse])
    )
)]
pub async fn list_suggestions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<NameSuggestionResponse>>, AppError> {
    let suggestions = team_service::list_team_name_suggestions(&state, id).await?;
    Ok(Json(suggestions.into_iter().map(Into::into).collect()))
}
