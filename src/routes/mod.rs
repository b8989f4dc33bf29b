use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod rooms;
pub mod sse;
pub mod teams;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = rooms::router()
        .merge(teams::router())
        .merge(game::router())
        .merge(sse::router());

    let docs_router = docs::router(state.clone());

    Router::new()
        .nest("/api", api_router)
        .merge(health::router())
        .merge(docs_router)
        .with_state(state)
}
