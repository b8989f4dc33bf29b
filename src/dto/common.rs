use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AppConfig;

/// The slice of server configuration clients need: timing constants and the
/// audio flag, served explicitly instead of living as frontend globals.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientConfigResponse {
    /// Whether clients should play sound effects.
    pub sound_enabled: bool,
    /// Seconds between presence heartbeats.
    pub heartbeat_interval_secs: u64,
    /// Countdown length of a trivia round.
    pub quiz_round_secs: u32,
    /// Countdown length of an alignment round.
    pub alignment_round_secs: u32,
    /// Seconds each phrase clue stays with its recipient.
    pub clue_rotation_secs: u32,
}

impl From<&AppConfig> for ClientConfigResponse {
    fn from(config: &AppConfig) -> Self {
        Self {
            sound_enabled: config.sound_enabled(),
            heartbeat_interval_secs: config.heartbeat_interval().as_secs(),
            quiz_round_secs: config.round_seconds(crate::dao::models::GameMode::PopQuiz),
            alignment_round_secs: config.round_seconds(crate::dao::models::GameMode::Alignment),
            clue_rotation_secs: config.clue_rotation_secs(),
        }
    }
}
