// src/storage/history.rs

//! Bounded, most-recent-first operation history.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{HistoryEntry, HistorySnapshot};
use crate::storage::HistoryStorage;

/// Entries retained after every `record`.
pub const HISTORY_CAPACITY: usize = 20;

/// Serialized owner of the history sequence.
///
/// Prepend, truncate and persist happen under one lock, so concurrent
/// recordings can neither drop an entry below the cap nor grow the sequence
/// past it.
pub struct HistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
    storage: Arc<dyn HistoryStorage>,
}

impl HistoryStore {
    /// Create a store seeded with already-loaded entries.
    pub fn new(mut initial: Vec<HistoryEntry>, storage: Arc<dyn HistoryStorage>) -> Self {
        initial.truncate(HISTORY_CAPACITY);
        Self {
            entries: Mutex::new(initial),
            storage,
        }
    }

    /// Create a store from whatever the backend has persisted.
    pub async fn open(storage: Arc<dyn HistoryStorage>) -> Result<Self> {
        let initial = storage.load_history().await?;
        Ok(Self::new(initial, storage))
    }

    /// Prepend `entry`, keep the newest `HISTORY_CAPACITY`, persist.
    ///
    /// On a persistence error the entry stays in memory and the error is
    /// returned; the next successful `record` writes it out.
    pub async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(0, entry);
        entries.truncate(HISTORY_CAPACITY);
        self.storage.save_history(&entries).await
    }

    /// The newest `limit` entries.
    pub async fn list(&self, limit: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().await;
        entries.iter().take(limit).cloned().collect()
    }

    /// Full sequence for presentation collaborators.
    pub async fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            history: self.entries.lock().await.clone(),
        }
    }
}
