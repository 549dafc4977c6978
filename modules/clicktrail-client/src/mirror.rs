use std::sync::{Mutex, MutexGuard, PoisonError};

/// The visible on-page log that successful dispatches are mirrored into.
pub trait LogMirror: Send + Sync {
    fn mirror(&self, entry: &str);
}

/// Keeps mirrored entries in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemoryMirror {
    entries: Mutex<Vec<String>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogMirror for MemoryMirror {
    fn mirror(&self, entry: &str) {
        self.lock().push(entry.to_string());
    }
}
