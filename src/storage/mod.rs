//! Storage abstractions for history persistence.
//!
//! History lives inside the host-owned configuration file:
//!
//! ```text
//! storage/
//! └── config.toml     # host settings + `[[history]]` (written back by the relay)
//! ```
//!
//! `HistoryStore` is the only writer; it serializes every update through one
//! lock and hands the trimmed sequence to a `HistoryStorage` backend.

pub mod history;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::HistoryEntry;

// Re-export for convenience
pub use history::{HISTORY_CAPACITY, HistoryStore};
pub use local::LocalStorage;

/// Trait for history persistence backends.
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// Load the persisted sequence, most recent first. Missing state is empty.
    async fn load_history(&self) -> Result<Vec<HistoryEntry>>;

    /// Replace the persisted sequence.
    async fn save_history(&self, history: &[HistoryEntry]) -> Result<()>;
}
