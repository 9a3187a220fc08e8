//! Local filesystem storage implementation.
//!
//! Writes the `history` array back into `config.toml` while leaving every
//! other key as the host wrote it.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── config.toml           # Relay configuration + history
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::HistoryEntry;
use crate::storage::HistoryStorage;

/// Configuration file key inside the storage root.
pub const CONFIG_KEY: &str = "config.toml";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Path of the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.path(CONFIG_KEY)
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read the configuration file as a generic TOML table.
    async fn read_document(&self) -> Result<toml::Table> {
        match self.read_bytes(CONFIG_KEY).await? {
            Some(bytes) => {
                let text = String::from_utf8(bytes).map_err(|e| {
                    AppError::config(format!("{CONFIG_KEY} is not valid UTF-8: {e}"))
                })?;
                Ok(text.parse::<toml::Table>()?)
            }
            None => Ok(toml::Table::new()),
        }
    }
}

#[async_trait]
impl HistoryStorage for LocalStorage {
    async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut document = self.read_document().await?;
        match document.remove("history") {
            Some(value) => Ok(value.try_into()?),
            None => {
                log::debug!("No history in {}", self.config_path().display());
                Ok(Vec::new())
            }
        }
    }

    async fn save_history(&self, history: &[HistoryEntry]) -> Result<()> {
        let mut document = self.read_document().await?;
        document.insert("history".to_string(), toml::Value::try_from(history)?);

        let text = toml::to_string_pretty(&document)?;
        self.write_bytes(CONFIG_KEY, text.as_bytes()).await?;
        log::debug!(
            "Persisted {} history entries to {}",
            history.len(),
            self.config_path().display()
        );
        Ok(())
    }
}
