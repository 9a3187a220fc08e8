//! Operation history records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of one pipeline run that reached a recording state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum EntryStatus {
    Success,
    SuccessNoMetadata,
    SuccessNotifyFailed,
    TransferFailed,
    Error(String),
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::SuccessNoMetadata => f.write_str("saved, no metadata"),
            Self::SuccessNotifyFailed => f.write_str("saved, notify failed"),
            Self::TransferFailed => f.write_str("transfer failed"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// One row of the operation log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,

    /// Link as it appeared in the message, before mirror rewriting
    pub original_url: String,

    pub sender: String,

    /// Resolved media title, when metadata was available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub status: EntryStatus,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        original_url: impl Into<String>,
        sender: impl Into<String>,
        title: Option<String>,
        status: EntryStatus,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            original_url: original_url.into(),
            sender: sender.into(),
            title,
            status,
        }
    }
}

/// Read-only view handed to presentation collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_json_shape() {
        let json = serde_json::to_value(EntryStatus::TransferFailed).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "transfer_failed" }));

        let json = serde_json::to_value(EntryStatus::Error("timeout".into())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "error", "message": "timeout" })
        );
    }

    #[test]
    fn test_entry_from_toml_without_title() {
        let entry: HistoryEntry = toml::from_str(
            r#"
            timestamp = "2026-01-02T03:04:05Z"
            original_url = "https://115cdn.com/s/abc"
            sender = "alice"
            status = { kind = "success_no_metadata" }
            "#,
        )
        .unwrap();

        assert_eq!(entry.title, None);
        assert_eq!(entry.status, EntryStatus::SuccessNoMetadata);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EntryStatus::Success.to_string(), "success");
        assert_eq!(
            EntryStatus::Error("bad base url".into()).to_string(),
            "error: bad base url"
        );
    }
}
