use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved term explanation.
///
/// Owned by the bookmark sink. After creation only `review_count` changes;
/// everything else is fixed until the entry is removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VocabEntry {
    pub id: String,
    pub term: String,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub review_count: u32,
}

impl VocabEntry {
    /// Create a fresh entry with a new id and the current timestamp.
    pub fn new(term: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            term: term.into(),
            explanation: explanation.into(),
            created_at: Utc::now(),
            review_count: 0,
        }
    }

    pub(crate) fn record_review(&mut self) {
        self.review_count = self.review_count.saturating_add(1);
    }
}
