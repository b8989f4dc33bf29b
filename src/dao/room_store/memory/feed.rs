use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dao::room_store::{ChangeEvent, ChangeOp, StoreTable};

/// Per-room broadcast channels carrying change signals.
///
/// A channel is created lazily on first subscribe; publishing to a room
/// nobody watches is a no-op. Delivery errors (all receivers gone) are
/// ignored, matching the fire-and-forget nature of the feed.
pub struct ChangeFeed {
    channels: DashMap<Uuid, broadcast::Sender<ChangeEvent>>,
    capacity: usize,
}

impl ChangeFeed {
    /// Build a feed whose per-room channels buffer `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Register a subscriber for one room's changes.
    pub fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<ChangeEvent> {
        self.channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish a signal for a committed mutation on `room_id`'s rows.
    pub fn publish(&self, room_id: Uuid, table: StoreTable, op: ChangeOp) {
        if let Some(sender) = self.channels.get(&room_id) {
            let _ = sender.send(ChangeEvent { table, op, room_id });
        }
    }
}
