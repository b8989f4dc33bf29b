use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    content::ContentPack,
    dao::models::{GameMode, RoomEntity, RoomStatus},
    dao::room_store::RoomConfigPatch,
    dto::{format_system_time, player::PlayerResponse},
};

/// Payload for creating a room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Host's display name; defaults to "Host" when blank.
    #[validate(length(max = 24))]
    pub username: String,
    /// Free-text topic shown in the lobby.
    #[serde(default)]
    #[validate(length(max = 80))]
    pub topic: Option<String>,
    /// Mini-game to play; may also be chosen later via config update.
    #[serde(default)]
    pub game_mode: Option<GameMode>,
    /// Target players per team (defaults to 4).
    #[serde(default)]
    #[validate(range(min = 1, max = 12))]
    pub team_size: Option<u32>,
    /// Winning score threshold (defaults to 5).
    #[serde(default)]
    #[validate(range(min = 1, max = 50))]
    pub target_score: Option<i32>,
    /// Caller-generated room code; generated server-side when omitted.
    #[serde(default)]
    #[validate(length(equal = 6))]
    pub code: Option<String>,
    /// Content snapshot for the room; the built-in pack is used when absent.
    #[serde(default)]
    pub content_pack: Option<ContentPack>,
}

/// Payload for joining a room by code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Name to join (or reconnect) as.
    #[validate(length(min = 1, max = 24))]
    pub username: String,
}

/// Payload for a host-driven status transition.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// The status to move to. Legal transitions are the caller's
    /// responsibility; nothing is rejected server-side.
    pub status: RoomStatus,
}

/// Partial configuration update. Absent fields are untouched; a provided
/// content pack replaces the stored one wholesale.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateConfigRequest {
    /// New team-size target.
    #[serde(default)]
    #[validate(range(min = 1, max = 12))]
    pub team_size: Option<u32>,
    /// New winning threshold.
    #[serde(default)]
    #[validate(range(min = 1, max = 50))]
    pub target_score: Option<i32>,
    /// New mini-game selection.
    #[serde(default)]
    pub game_mode: Option<GameMode>,
    /// New topic text.
    #[serde(default)]
    #[validate(length(max = 80))]
    pub topic: Option<String>,
    /// Replacement content snapshot.
    #[serde(default)]
    pub content_pack: Option<ContentPack>,
}

impl From<UpdateConfigRequest> for RoomConfigPatch {
    fn from(request: UpdateConfigRequest) -> Self {
        Self {
            team_size: request.team_size,
            target_score: request.target_score,
            game_mode: request.game_mode,
            topic: request.topic,
            content_pack: request.content_pack,
        }
    }
}

/// Public projection of a room row.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomResponse {
    /// Stable identifier.
    pub id: Uuid,
    /// Shareable join code.
    pub code: String,
    /// The host player's id.
    pub host_id: Uuid,
    /// Current lifecycle status.
    pub status: RoomStatus,
    /// Selected mini-game.
    pub game_mode: Option<GameMode>,
    /// Topic text.
    pub topic: Option<String>,
    /// Content snapshot attached to the room.
    pub content_pack: Option<ContentPack>,
    /// Target players per team.
    pub team_size: u32,
    /// Winning score threshold.
    pub target_score: i32,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
    /// Last write, RFC 3339.
    pub updated_at: String,
}

impl From<RoomEntity> for RoomResponse {
    fn from(room: RoomEntity) -> Self {
        Self {
            id: room.id,
            code: room.code,
            host_id: room.host_id,
            status: room.status,
            game_mode: room.game_mode,
            topic: room.topic,
            content_pack: room.content_pack,
            team_size: room.team_size,
            target_score: room.target_score,
            created_at: format_system_time(room.created_at),
            updated_at: format_system_time(room.updated_at),
        }
    }
}

/// Response for a freshly created room.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRoomResponse {
    /// The new room.
    pub room: RoomResponse,
    /// The host's player row.
    pub host: PlayerResponse,
}

/// Response for a join (or reconnect).
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRoomResponse {
    /// The joined room.
    pub room: RoomResponse,
    /// The caller's player row, new or resumed.
    pub player: PlayerResponse,
}
