/// Opinion-alignment round engine.
pub mod alignment;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game-state lifecycle, round timing and win checks.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Clue-rotation phrase round engine.
pub mod phrase;
/// Player identity, rosters and presence.
pub mod player_service;
/// Group-pulse warm-up engine.
pub mod pulse;
/// Trivia rally round engine.
pub mod quiz;
/// Room lifecycle and configuration.
pub mod room_service;
/// Pure scoring rules shared by the round engines.
pub mod scoring;
/// Team allocation and naming.
pub mod team_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
