//! In-memory bookmark sink for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::StorageError;
use crate::models::VocabEntry;
use crate::traits::BookmarkSink;

/// In-memory bookmark sink.
///
/// Stores entries in a shared vector so tests can inspect what a session
/// saved without touching the file system.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookmarks {
    entries: Arc<Mutex<Vec<VocabEntry>>>,
    add_should_fail: Arc<Mutex<bool>>,
}

impl InMemoryBookmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure whether `add` should fail.
    pub fn set_add_should_fail(&self, should_fail: bool) {
        *self.add_should_fail.lock().unwrap() = should_fail;
    }

    /// Snapshot of the stored entries (for testing).
    pub fn get_entries(&self) -> Vec<VocabEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookmarkSink for InMemoryBookmarks {
    async fn add(&self, term: &str, explanation: &str) -> Result<VocabEntry, StorageError> {
        if *self.add_should_fail.lock().unwrap() {
            return Err(StorageError::io(
                "memory",
                std::io::Error::new(std::io::ErrorKind::Other, "Mock add failure"),
            ));
        }

        let entry = VocabEntry::new(term, explanation);
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn remove(&self, id: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }

    async fn record_review(&self, id: &str) -> Result<(), StorageError> {
        if let Some(entry) = self.entries.lock().unwrap().iter_mut().find(|e| e.id == id) {
            entry.record_review();
        }
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<VocabEntry>, StorageError> {
        Ok(self.get_entries())
    }
}
