//! In-process reference backend.
//!
//! Tables live in [`indexmap::IndexMap`]s guarded by a single async lock, so
//! insertion order (the roster order the registry promises) falls out of the
//! data structure. Every committed mutation publishes a signal on the owning
//! room's change feed. A networked backend would implement the same
//! [`super::RoomStore`] trait against the real schema.

mod feed;
mod store;

pub use store::MemoryRoomStore;
