//! Bookmark sink trait abstraction.
//!
//! The sink is the durable home of vocabulary entries. The chat engine only
//! proposes candidates; it never edits stored entries.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::VocabEntry;

/// Trait for vocabulary entry storage.
///
/// Append and remove only: an entry's term and explanation never change
/// after `add`, only its review counter does.
///
/// # Example
///
/// ```ignore
/// use glossa::traits::BookmarkSink;
///
/// async fn save_answer<S: BookmarkSink>(sink: &S, term: &str, answer: &str) {
///     let entry = sink.add(term, answer).await?;
///     println!("saved {}", entry.id);
/// }
/// ```
#[async_trait]
pub trait BookmarkSink: Send + Sync {
    /// Store a new entry, assigning its id and timestamp.
    async fn add(&self, term: &str, explanation: &str) -> Result<VocabEntry, StorageError>;

    /// Remove an entry. Unknown ids are a no-op.
    async fn remove(&self, id: &str) -> Result<(), StorageError>;

    /// Increment an entry's review counter. Unknown ids are a no-op.
    async fn record_review(&self, id: &str) -> Result<(), StorageError>;

    /// All entries, oldest first.
    async fn entries(&self) -> Result<Vec<VocabEntry>, StorageError>;
}
