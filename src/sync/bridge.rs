use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    dao::room_store::{ChangeEvent, RoomStore, StoreTable},
    error::ServiceError,
};

/// Signals buffered per table before a slow subscriber starts lagging. A
/// lagged subscriber only loses signals, never state: its next re-fetch
/// pulls the current snapshot regardless.
const TABLE_CHANNEL_CAPACITY: usize = 16;

/// One client's live connection to a room's change feed.
///
/// Connecting resolves the room code, subscribes to the store's per-room
/// feed and spawns a forwarder that fans each [`ChangeEvent`] out to the
/// channel of its table. Consumers register interest per table with
/// [`SyncBridge::on_change`] and re-fetch the full collection on every
/// signal; the bridge never hands them row data.
#[derive(Debug)]
pub struct SyncBridge {
    room_id: Uuid,
    channels: Arc<DashMap<StoreTable, broadcast::Sender<ChangeEvent>>>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl SyncBridge {
    /// Open the bridge for the room identified by `code`.
    ///
    /// Fails once at connect time when the room does not exist or the store
    /// is unreachable; there is no retry or backoff here. Callers that lose
    /// the bridge fall back to one-shot fetches.
    pub async fn connect(
        store: Arc<dyn RoomStore>,
        code: &str,
    ) -> Result<Self, ServiceError> {
        let room = store
            .find_room_by_code(code.to_string())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))?;

        let feed = store.subscribe_changes(room.id).await?;
        let channels: Arc<DashMap<StoreTable, broadcast::Sender<ChangeEvent>>> =
            Arc::new(DashMap::new());

        let forwarder = tokio::spawn(forward_events(feed, channels.clone()));

        Ok(Self {
            room_id: room.id,
            channels,
            forwarder: Mutex::new(Some(forwarder)),
        })
    }

    /// The room this bridge is attached to.
    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    /// Register interest in one table's changes.
    ///
    /// Each received event is a signal only: re-fetch the collection, do not
    /// try to patch a cache from it.
    pub fn on_change(&self, table: StoreTable) -> broadcast::Receiver<ChangeEvent> {
        self.channels
            .entry(table)
            .or_insert_with(|| broadcast::channel(TABLE_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Tear down the subscription and drop all registered channels.
    ///
    /// Idempotent and safe to call any number of times; subscribers see
    /// their receivers close.
    pub fn disconnect(&self) {
        if let Ok(mut guard) = self.forwarder.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
        self.channels.clear();
    }
}

impl Drop for SyncBridge {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Fan events from the store feed out to per-table channels. Tables nobody
/// has registered for are skipped entirely.
async fn forward_events(
    mut feed: broadcast::Receiver<ChangeEvent>,
    channels: Arc<DashMap<StoreTable, broadcast::Sender<ChangeEvent>>>,
) {
    loop {
        match feed.recv().await {
            Ok(event) => {
                if let Some(sender) = channels.get(&event.table) {
                    let _ = sender.send(event);
                }
            }
            Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(skipped)) => {
                // Skipped signals are harmless: the next one triggers a full
                // re-fetch of current state anyway.
                tracing::debug!(skipped, "change feed lagged; continuing");
                continue;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::room_store::memory::MemoryRoomStore;
    use crate::dao::room_store::{ChangeOp, NewPlayer, NewRoom};

    async fn seeded_store() -> (Arc<dyn RoomStore>, String) {
        let store = MemoryRoomStore::new();
        store
            .insert_room(NewRoom {
                code: "BRIDGE".into(),
                host_id: Uuid::new_v4(),
                game_mode: None,
                topic: None,
                content_pack: None,
                team_size: 4,
                target_score: 5,
            })
            .await
            .unwrap();
        (Arc::new(store), "BRIDGE".into())
    }

    #[tokio::test]
    async fn connect_fails_for_unknown_code() {
        let (store, _) = seeded_store().await;
        let err = SyncBridge::connect(store, "NOSUCH").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn signals_reach_table_subscribers() {
        let (store, code) = seeded_store().await;
        let bridge = SyncBridge::connect(store.clone(), &code).await.unwrap();
        let mut players = bridge.on_change(StoreTable::Players);

        store
            .insert_player(NewPlayer {
                id: Uuid::new_v4(),
                room_id: bridge.room_id(),
                username: "p1".into(),
                is_host: false,
            })
            .await
            .unwrap();

        let event = players.recv().await.unwrap();
        assert_eq!(event.table, StoreTable::Players);
        assert_eq!(event.op, ChangeOp::Insert);
    }

    #[tokio::test]
    async fn unregistered_tables_are_not_forwarded() {
        let (store, code) = seeded_store().await;
        let bridge = SyncBridge::connect(store.clone(), &code).await.unwrap();
        let mut rooms = bridge.on_change(StoreTable::Rooms);

        // A players write must not surface on the rooms channel.
        store
            .insert_player(NewPlayer {
                id: Uuid::new_v4(),
                room_id: bridge.room_id(),
                username: "p1".into(),
                is_host: false,
            })
            .await
            .unwrap();

        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(50), rooms.recv()).await;
        assert!(outcome.is_err(), "rooms channel should stay quiet");
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_closes_receivers() {
        let (store, code) = seeded_store().await;
        let bridge = SyncBridge::connect(store.clone(), &code).await.unwrap();
        let mut players = bridge.on_change(StoreTable::Players);

        bridge.disconnect();
        bridge.disconnect();

        let outcome = players.recv().await;
        assert!(matches!(outcome, Err(RecvError::Closed)));
    }
}
