use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{TeamEntity, TeamNameSuggestionEntity},
    dto::{format_system_time, player::PlayerResponse},
    sync::TeamRoster,
};

/// Payload for running team allocation.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct AssignTeamsRequest {
    /// Overrides the room's configured team size for this run.
    #[serde(default)]
    #[validate(range(min = 1, max = 12))]
    pub team_size: Option<u32>,
}

/// Payload for setting a team's custom name.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RenameTeamRequest {
    /// The player-chosen name.
    #[validate(length(min = 1, max = 32))]
    pub custom_name: String,
}

/// Payload for recording a player's team-name idea.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SuggestNameRequest {
    /// Suggesting player.
    pub player_id: Uuid,
    /// The proposed name.
    #[validate(length(min = 1, max = 32))]
    pub suggested_name: String,
}

/// Public projection of a team row.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamResponse {
    /// Stable identifier.
    pub id: Uuid,
    /// Deterministic "Team N" label.
    pub original_name: String,
    /// Player-chosen name, when set.
    pub custom_name: Option<String>,
    /// What players see: the custom name or the label.
    pub display_name: String,
    /// Palette entry.
    pub color: String,
    /// Cumulative score.
    pub score: i32,
}

impl From<TeamEntity> for TeamResponse {
    fn from(team: TeamEntity) -> Self {
        let display_name = team.display_name().to_string();
        Self {
            id: team.id,
            original_name: team.original_name,
            custom_name: team.custom_name,
            display_name,
            color: team.color,
            score: team.score,
        }
    }
}

/// A team with its current roster.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamWithRosterResponse {
    /// The team itself.
    #[serde(flatten)]
    pub team: TeamResponse,
    /// Players assigned to it, in join order.
    pub players: Vec<PlayerResponse>,
}

impl From<TeamRoster> for TeamWithRosterResponse {
    fn from(roster: TeamRoster) -> Self {
        Self {
            team: roster.team.into(),
            players: roster.players.into_iter().map(Into::into).collect(),
        }
    }
}

/// Public projection of a name suggestion.
#[derive(Debug, Serialize, ToSchema)]
pub struct NameSuggestionResponse {
    /// Team being named.
    pub team_id: Uuid,
    /// Suggesting player.
    pub player_id: Uuid,
    /// The proposed name.
    pub suggested_name: String,
    /// Submission time, RFC 3339.
    pub created_at: String,
}

impl From<TeamNameSuggestionEntity> for NameSuggestionResponse {
    fn from(suggestion: TeamNameSuggestionEntity) -> Self {
        Self {
            team_id: suggestion.team_id,
            player_id: suggestion.player_id,
            suggested_name: suggestion.suggested_name,
            created_at: format_system_time(suggestion.created_at),
        }
    }
}
