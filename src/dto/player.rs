use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, PresenceStatus},
    dto::format_system_time,
};

/// Public projection of a player row.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerResponse {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Display name, unique within the room.
    pub username: String,
    /// Whether this row is the room's host.
    pub is_host: bool,
    /// Team membership, when assigned.
    pub team_id: Option<Uuid>,
    /// Presence marker from the heartbeat.
    pub presence_status: PresenceStatus,
    /// Last heartbeat, RFC 3339.
    pub last_seen: String,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

impl From<PlayerEntity> for PlayerResponse {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            room_id: player.room_id,
            username: player.username,
            is_host: player.is_host,
            team_id: player.team_id,
            presence_status: player.presence_status,
            last_seen: format_system_time(player.last_seen),
            created_at: format_system_time(player.created_at),
        }
    }
}
