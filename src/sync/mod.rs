//! The room synchronization core.
//!
//! Every connected client runs its own copy of this machinery; there is no
//! coordinating server process beyond the store itself. [`bridge::SyncBridge`]
//! turns the store's change feed into per-table signals, and
//! [`watcher::RoomWatcher`] applies the system-wide policy to them:
//! refetch-on-notify. A signal never carries a delta; the cache is thrown
//! away and rebuilt from a fresh snapshot, which is what makes concurrent
//! cross-client writes converge without any merge logic.

pub mod bridge;
pub mod watcher;

pub use bridge::SyncBridge;
pub use watcher::{RoomSnapshot, RoomWatcher, TeamRoster};
