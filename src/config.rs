//! Application-level configuration loading.
//!
//! Everything clients used to pick up from ad hoc globals lives here
//! explicitly: the team color palette, the presence heartbeat interval, the
//! per-mode round countdowns, the clue rotation period, and the audio on/off
//! flag that the frontend reads instead of keeping its own module-scope
//! toggle.

use std::time::Duration;
use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::GameMode;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ICEBREAKR_BACK_CONFIG_PATH";

/// The fixed palette teams cycle through, repeated when a room has more than
/// four teams. Values are the class tokens the frontend renders directly.
const DEFAULT_TEAM_COLORS: [&str; 4] = [
    "bg-blue-500",
    "bg-green-500",
    "bg-orange-500",
    "bg-red-500",
];

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    team_colors: Vec<String>,
    heartbeat_interval: Duration,
    quiz_round_secs: u32,
    alignment_round_secs: u32,
    clue_rotation_secs: u32,
    sound_enabled: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Palette entry for the team created at `index`, cycling when the
    /// palette is shorter than the team count.
    pub fn team_color(&self, index: usize) -> &str {
        &self.team_colors[index % self.team_colors.len()]
    }

    /// How often connected clients refresh their presence row.
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Countdown length for one round of the given mode.
    pub fn round_seconds(&self, mode: GameMode) -> u32 {
        match mode {
            GameMode::PopQuiz => self.quiz_round_secs,
            GameMode::Alignment => self.alignment_round_secs,
            // Phrase rounds are bounded by clue rotation, not one countdown.
            GameMode::SecretPhrase => self.clue_rotation_secs,
        }
    }

    /// Seconds each clue stays with its recipient before rotating.
    pub fn clue_rotation_secs(&self) -> u32 {
        self.clue_rotation_secs
    }

    /// Whether clients should play sound effects.
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            team_colors: DEFAULT_TEAM_COLORS.iter().map(|c| c.to_string()).collect(),
            heartbeat_interval: Duration::from_secs(30),
            quiz_round_secs: 10,
            alignment_round_secs: 15,
            clue_rotation_secs: 8,
            sound_enabled: true,
        }
    }
}

/// JSON representation of the configuration file. Every field is optional;
/// absent fields keep their default.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    team_colors: Option<Vec<String>>,
    #[serde(default)]
    heartbeat_interval_secs: Option<u64>,
    #[serde(default)]
    quiz_round_secs: Option<u32>,
    #[serde(default)]
    alignment_round_secs: Option<u32>,
    #[serde(default)]
    clue_rotation_secs: Option<u32>,
    #[serde(default)]
    sound_enabled: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            team_colors: raw
                .team_colors
                .filter(|colors| !colors.is_empty())
                .unwrap_or(defaults.team_colors),
            heartbeat_interval: raw
                .heartbeat_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.heartbeat_interval),
            quiz_round_secs: raw.quiz_round_secs.unwrap_or(defaults.quiz_round_secs),
            alignment_round_secs: raw
                .alignment_round_secs
                .unwrap_or(defaults.alignment_round_secs),
            clue_rotation_secs: raw
                .clue_rotation_secs
                .unwrap_or(defaults.clue_rotation_secs),
            sound_enabled: raw.sound_enabled.unwrap_or(defaults.sound_enabled),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
