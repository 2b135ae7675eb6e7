use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{SlotStorage, WriteError};

/// In-memory slot storage used by tests and the doc examples.
///
/// `set_read_only(true)` makes every subsequent write fail the way a
/// quota-exhausted backend would, so degrade paths can be exercised.
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
    read_only: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SlotStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock_slots().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WriteError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(WriteError::Backend("storage is read-only".into()));
        }
        self.lock_slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.lock_slots().remove(key);
    }
}
