/// Database model definitions.
pub mod models;
/// Store abstraction and the in-memory reference backend.
pub mod room_store;
/// Storage abstraction layer for database operations.
pub mod storage;
