//! Shared application state handed to every route handler.

use std::sync::Arc;

use crate::{config::AppConfig, dao::room_store::RoomStore};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the persisted store handle and the immutable
/// runtime configuration. Everything else (room caches, sync bridges) is
/// owned by the connection or task that needs it and rebuilt from the store
/// at will.
pub struct AppState {
    store: Arc<dyn RoomStore>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn RoomStore>, config: AppConfig) -> SharedState {
        Arc::new(Self { store, config })
    }

    /// Handle to the persisted store.
    pub fn store(&self) -> Arc<dyn RoomStore> {
        self.store.clone()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
