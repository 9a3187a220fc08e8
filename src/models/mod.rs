// src/models/mod.rs

//! Domain models for the relay.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

pub mod config;
mod history;
mod link;
mod media;

// Re-export all public types
pub use config::{
    Config, HttpConfig, LinkConfig, NotifyConfig, RelayConfig, TransferConfig, TransferMode,
};
pub use history::{EntryStatus, HistoryEntry, HistorySnapshot};
pub use link::ShareLink;
pub use media::{MediaInfo, TransferResult};
pub(crate) use media::id_field;

/// A chat message delivered by the host.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InboundMessage {
    #[serde(alias = "message", alias = "content", default)]
    pub text: String,

    #[serde(default = "unknown_sender")]
    pub sender: String,
}

fn unknown_sender() -> String {
    "unknown".to_string()
}
