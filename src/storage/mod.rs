//! Slot storage: a string key-value interface the record store and the
//! achievement ledger persist through.
//!
//! Both stores follow the same discipline: read the whole slot, mutate a
//! copy, write the whole slot back. Backends never surface read errors
//! (a missing or unreadable slot is `None`); write failures are reported
//! as [`WriteError`] so callers and tests can observe them, even though
//! the current callers treat them as non-fatal.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use thiserror::Error;

/// Slot holding the JSON array of study records, in append order.
pub const RECORDS_SLOT: &str = "studykit.records";
/// Slot holding the JSON object of badge-id -> unlock timestamp (ms).
pub const ACHIEVEMENTS_SLOT: &str = "studykit.achievements";

#[derive(Debug, Error)]
pub enum WriteError {
    /// The backend rejected the write (quota, I/O, read-only storage).
    #[error("storage backend rejected write: {0}")]
    Backend(String),
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A named slot of durable string storage.
pub trait SlotStorage: Send + Sync {
    /// Returns the slot's contents, or `None` if absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Replaces the slot's contents wholesale.
    fn set(&self, key: &str, value: &str) -> Result<(), WriteError>;

    /// Deletes the slot. A no-op when the slot does not exist.
    fn remove(&self, key: &str);
}
