//! Progress sync capability
//!
//! Pushes and pulls reading progress for books hosted on a catalog
//! source. The batch variant defaults to a sequential loop, and the
//! completion/clear helpers are sugar over `sync_progress`, so a plugin
//! only has to implement the two primitive operations.

use crate::core::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reading progress for one book on a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Book id on the source
    pub book_id: String,

    /// Current page (0-based)
    pub page_index: usize,

    /// Fraction read, 0.0 to 1.0
    pub progress: f32,

    pub completed: bool,

    /// Last update, unix timestamp
    pub updated_at: i64,
}

impl ProgressRecord {
    pub fn new(book_id: impl Into<String>, page_index: usize, progress: f32) -> Self {
        Self {
            book_id: book_id.into(),
            page_index,
            progress: progress.clamp(0.0, 1.0),
            completed: progress >= 1.0,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Outcome of one sync attempt in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub book_id: String,
    pub success: bool,

    #[serde(default)]
    pub error: Option<String>,
}

/// Progress sync capability
#[async_trait]
pub trait ProgressSyncCapability: Send + Sync {
    /// Push one book's progress to the source
    async fn sync_progress(&self, server_url: &str, record: &ProgressRecord) -> Result<()>;

    /// Fetch one book's progress from the source
    async fn fetch_progress(&self, server_url: &str, book_id: &str)
        -> Result<Option<ProgressRecord>>;

    /// Push many records; default is a sequential fallback that keeps
    /// going after individual failures
    async fn sync_progress_batch(
        &self,
        server_url: &str,
        records: &[ProgressRecord],
    ) -> Result<Vec<SyncOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            match self.sync_progress(server_url, record).await {
                Ok(()) => outcomes.push(SyncOutcome {
                    book_id: record.book_id.clone(),
                    success: true,
                    error: None,
                }),
                Err(e) => outcomes.push(SyncOutcome {
                    book_id: record.book_id.clone(),
                    success: false,
                    error: Some(e.to_string()),
                }),
            }
        }
        Ok(outcomes)
    }

    /// Mark a book fully read
    async fn mark_as_complete(&self, server_url: &str, book_id: &str) -> Result<()> {
        let mut record = ProgressRecord::new(book_id, 0, 1.0);
        record.completed = true;
        self.sync_progress(server_url, &record).await
    }

    /// Reset a book's progress
    async fn clear_progress(&self, server_url: &str, book_id: &str) -> Result<()> {
        let record = ProgressRecord::new(book_id, 0, 0.0);
        self.sync_progress(server_url, &record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records every push; fails for book ids starting with "bad"
    struct RecordingSync {
        pushed: Mutex<HashMap<String, ProgressRecord>>,
    }

    impl RecordingSync {
        fn new() -> Self {
            Self {
                pushed: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl ProgressSyncCapability for RecordingSync {
        async fn sync_progress(&self, _server_url: &str, record: &ProgressRecord) -> Result<()> {
            if record.book_id.starts_with("bad") {
                return Err(crate::core::error::QuireError::Network("refused".into()));
            }
            self.pushed
                .lock()
                .unwrap()
                .insert(record.book_id.clone(), record.clone());
            Ok(())
        }

        async fn fetch_progress(
            &self,
            _server_url: &str,
            book_id: &str,
        ) -> Result<Option<ProgressRecord>> {
            Ok(self.pushed.lock().unwrap().get(book_id).cloned())
        }
    }

    #[tokio::test]
    async fn test_roundtrip() {
        let sync = RecordingSync::new();
        let record = ProgressRecord::new("book-1", 12, 0.5);
        sync.sync_progress("https://s", &record).await.unwrap();

        let fetched = sync.fetch_progress("https://s", "book-1").await.unwrap();
        assert_eq!(fetched, Some(record));
        assert_eq!(sync.fetch_progress("https://s", "absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_batch_default_continues_past_failures() {
        let sync = RecordingSync::new();
        let records = vec![
            ProgressRecord::new("book-1", 1, 0.1),
            ProgressRecord::new("bad-book", 2, 0.2),
            ProgressRecord::new("book-3", 3, 0.3),
        ];

        let outcomes = sync.sync_progress_batch("https://s", &records).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(outcomes[1].error.is_some());
        assert!(outcomes[2].success);
    }

    #[tokio::test]
    async fn test_complete_and_clear_are_sugar() {
        let sync = RecordingSync::new();
        sync.mark_as_complete("https://s", "book-1").await.unwrap();
        let fetched = sync
            .fetch_progress("https://s", "book-1")
            .await
            .unwrap()
            .unwrap();
        assert!(fetched.completed);
        assert_eq!(fetched.progress, 1.0);

        sync.clear_progress("https://s", "book-1").await.unwrap();
        let cleared = sync
            .fetch_progress("https://s", "book-1")
            .await
            .unwrap()
            .unwrap();
        assert!(!cleared.completed);
        assert_eq!(cleared.progress, 0.0);
    }

    #[test]
    fn test_progress_record_clamps() {
        assert_eq!(ProgressRecord::new("b", 0, 1.7).progress, 1.0);
        assert_eq!(ProgressRecord::new("b", 0, -0.5).progress, 0.0);
        assert!(ProgressRecord::new("b", 0, 1.0).completed);
        assert!(!ProgressRecord::new("b", 0, 0.99).completed);
    }
}
