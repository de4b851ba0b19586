//! File-based bookmark sink adapter.
//!
//! Entries live in a single pretty-printed JSON array, `vocabulary.json`,
//! inside the data directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::models::VocabEntry;
use crate::traits::BookmarkSink;

/// File name of the vocabulary store inside the data directory.
pub const VOCABULARY_FILE: &str = "vocabulary.json";

/// File-based bookmark sink.
///
/// Every mutation rewrites the whole file through a temporary sibling and a
/// rename, so a crash mid-write leaves the previous contents intact.
///
/// # Example
///
/// ```ignore
/// use glossa::adapters::JsonFileBookmarks;
/// use glossa::traits::BookmarkSink;
///
/// let sink = JsonFileBookmarks::in_dir("/home/me/.glossa");
/// let entry = sink.add("ownership", "Each value has a single owner").await?;
/// ```
#[derive(Debug)]
pub struct JsonFileBookmarks {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileBookmarks {
    /// Use an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Use `vocabulary.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(VOCABULARY_FILE))
    }

    /// Get the path to the vocabulary file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<VocabEntry>, StorageError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&raw).map_err(|e| StorageError::serialization(&self.path, e))
    }

    async fn store(&self, entries: &[VocabEntry]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::serialization(&self.path, e))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))
    }
}

#[async_trait]
impl BookmarkSink for JsonFileBookmarks {
    async fn add(&self, term: &str, explanation: &str) -> Result<VocabEntry, StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let entry = VocabEntry::new(term, explanation);
        entries.push(entry.clone());
        self.store(&entries).await?;
        tracing::debug!(id = %entry.id, term, "Saved vocabulary entry");
        Ok(entry)
    }

    async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(());
        }
        self.store(&entries).await
    }

    async fn record_review(&self, id: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.record_review(),
            None => return Ok(()),
        }
        self.store(&entries).await
    }

    async fn entries(&self) -> Result<Vec<VocabEntry>, StorageError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let sink = JsonFileBookmarks::in_dir(dir.path());
        assert!(sink.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let entry = JsonFileBookmarks::in_dir(dir.path())
            .add("iterator", "Produces a sequence of values")
            .await
            .unwrap();

        let reopened = JsonFileBookmarks::in_dir(dir.path());
        let entries = reopened.entries().await.unwrap();
        assert_eq!(entries, vec![entry]);
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let sink = JsonFileBookmarks::in_dir(dir.path());
        sink.add("macro", "Code that writes code").await.unwrap();

        assert!(dir.path().join(VOCABULARY_FILE).exists());
        assert!(!dir.path().join("vocabulary.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let sink = JsonFileBookmarks::in_dir(&nested);
        sink.add("crate", "A compilation unit").await.unwrap();
        assert!(nested.join(VOCABULARY_FILE).exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(VOCABULARY_FILE), "not json").unwrap();

        let sink = JsonFileBookmarks::in_dir(dir.path());
        let err = sink.entries().await.unwrap_err();
        assert_eq!(err.error_code(), "E_STORE_CORRUPT");
    }

    #[tokio::test]
    async fn test_remove_and_review() {
        let dir = TempDir::new().unwrap();
        let sink = JsonFileBookmarks::in_dir(dir.path());
        let keep = sink.add("enum", "A sum type").await.unwrap();
        let drop_me = sink.add("struct", "A product type").await.unwrap();

        sink.record_review(&keep.id).await.unwrap();
        sink.remove(&drop_me.id).await.unwrap();
        sink.remove("unknown").await.unwrap();

        let entries = sink.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, keep.id);
        assert_eq!(entries[0].review_count, 1);
    }
}
