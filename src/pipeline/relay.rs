// src/pipeline/relay.rs

//! Message pipeline: link → transfer → metadata → notification → history.
//!
//! `Relay::handle_message` is the single entry point for inbound chat
//! messages. It never fails; every terminal state is reported as an
//! `Outcome`, and the states that matter to users are recorded in history.

use std::any::Any;
use std::sync::Arc;

use tokio::task::JoinError;

use crate::error::{AppError, Result};
use crate::models::{
    Config, EntryStatus, HistoryEntry, HistorySnapshot, ShareLink, TransferMode, TransferResult,
};
use crate::services::{LinkExtractor, MetadataClient, Notifier, TransferBackend, backend_for};
use crate::storage::{HistoryStorage, HistoryStore};
use crate::utils::http::create_async_client;

/// Terminal state of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Relay switched off or missing required settings
    Disabled,
    /// Message carried no share link
    NoLinkFound,
    TransferFailed,
    /// Saved, but no media metadata could be resolved
    MetadataMissing,
    /// Saved and resolved, but the webhook did not accept the card
    NotifyFailed { title: String },
    Success { title: String },
    /// Unexpected fault inside the run
    Error(String),
}

impl Outcome {
    /// History status, or `None` for the silent outcomes.
    pub fn status(&self) -> Option<EntryStatus> {
        match self {
            Self::Disabled | Self::NoLinkFound => None,
            Self::TransferFailed => Some(EntryStatus::TransferFailed),
            Self::MetadataMissing => Some(EntryStatus::SuccessNoMetadata),
            Self::NotifyFailed { .. } => Some(EntryStatus::SuccessNotifyFailed),
            Self::Success { .. } => Some(EntryStatus::Success),
            Self::Error(message) => Some(EntryStatus::Error(message.clone())),
        }
    }

    /// Resolved media title, when the run got that far.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::NotifyFailed { title } | Self::Success { title } => Some(title),
            _ => None,
        }
    }

    /// Stable short name for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NoLinkFound => "no_link",
            Self::TransferFailed => "transfer_failed",
            Self::MetadataMissing => "metadata_missing",
            Self::NotifyFailed { .. } => "notify_failed",
            Self::Success { .. } => "success",
            Self::Error(_) => "error",
        }
    }
}

struct Inner {
    config: Config,
    extractor: LinkExtractor,
    transfer: Arc<dyn TransferBackend>,
    metadata: MetadataClient,
    notifier: Notifier,
    history: HistoryStore,
}

/// The relay. Cheap to clone; clones share history and HTTP connections.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<Inner>,
}

impl Relay {
    /// Build a relay with the backend selected by `transfer.mode`.
    ///
    /// History is seeded from `config.history`; from here on the relay owns
    /// it and persists through `storage`.
    pub fn new(config: Config, storage: Arc<dyn HistoryStorage>) -> Result<Self> {
        let client = create_async_client(&config.http)?;
        let backend = backend_for(&config, client.clone());
        Self::assemble(config, storage, backend, client)
    }

    /// Build a relay around an explicit transfer backend.
    pub fn with_backend(
        config: Config,
        storage: Arc<dyn HistoryStorage>,
        transfer: Arc<dyn TransferBackend>,
    ) -> Result<Self> {
        let client = create_async_client(&config.http)?;
        Self::assemble(config, storage, transfer, client)
    }

    fn assemble(
        mut config: Config,
        storage: Arc<dyn HistoryStorage>,
        transfer: Arc<dyn TransferBackend>,
        client: reqwest::Client,
    ) -> Result<Self> {
        let extractor = LinkExtractor::new(&config.link)?;
        let metadata =
            MetadataClient::new(client.clone(), &config.service_base_url, &config.api_key);
        let notifier = Notifier::new(client, &config.webhook_url, &config.notify);
        let history = HistoryStore::new(std::mem::take(&mut config.history), storage);

        log::debug!(
            "Relay ready (transfer backend: {}, base: {})",
            transfer.name(),
            config.service_base_url
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                extractor,
                transfer,
                metadata,
                notifier,
                history,
            }),
        })
    }

    /// Configuration the relay was built with (history excluded).
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Process one inbound chat message.
    ///
    /// Never returns an error and never panics: upstream failures and
    /// unexpected faults alike end in an `Outcome`, and every outcome other
    /// than `Disabled` / `NoLinkFound` is recorded in history.
    pub async fn handle_message(&self, text: &str, sender: &str) -> Outcome {
        let missing = self.inner.config.missing_settings();
        if !missing.is_empty() {
            log::debug!("Ignoring message, relay not ready (missing: {})", missing.join(", "));
            return Outcome::Disabled;
        }

        let Some(link) = self.inner.extractor.extract(text) else {
            return Outcome::NoLinkFound;
        };
        log::info!("Detected share link {} from {}", link.raw_text, sender);

        let outcome = self.run_isolated(link.clone(), sender.to_string()).await;

        if let Some(status) = outcome.status() {
            let entry = HistoryEntry::new(
                link.raw_text.as_str(),
                sender,
                outcome.title().map(str::to_string),
                status,
            );
            if let Err(e) = self.inner.history.record(entry).await {
                log::error!("Failed to persist history for {}: {}", link.raw_text, e);
            }
        }

        log::info!("Finished {} from {}: {}", link.raw_text, sender, outcome.label());
        outcome
    }

    /// Run the pipeline on its own task so a panic cannot escape.
    async fn run_isolated(&self, link: ShareLink, sender: String) -> Outcome {
        let relay = self.clone();
        let task = tokio::spawn(async move { relay.run(&link, &sender).await });

        match task.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                log::error!("Processing failed: {}", e);
                Outcome::Error(e.to_string())
            }
            Err(e) => {
                let message = join_error_message(e);
                log::error!("Processing aborted: {}", message);
                Outcome::Error(message)
            }
        }
    }

    /// Steps 3–6 of the state machine. Each call is attempted once.
    async fn run(&self, link: &ShareLink, sender: &str) -> Result<Outcome> {
        let transfer = self.inner.transfer.transfer(link).await?;
        if !transfer.success {
            return Ok(Outcome::TransferFailed);
        }

        let Some(info) = self.inner.metadata.lookup(&transfer).await? else {
            return Ok(Outcome::MetadataMissing);
        };
        let title = info.title_line();

        if self
            .inner
            .notifier
            .notify(&info, sender, &link.raw_text)
            .await?
        {
            Ok(Outcome::Success { title })
        } else {
            Ok(Outcome::NotifyFailed { title })
        }
    }

    /// Transfer a share link without metadata, notification or history.
    ///
    /// Only the settings the configured backend needs are required: the API
    /// key for the platform backend, the cookie for the direct one.
    pub async fn save_link(&self, text: &str) -> Result<TransferResult> {
        let direct_mode = self.inner.config.transfer.mode == TransferMode::Direct;
        let missing: Vec<_> = self
            .inner
            .config
            .missing_settings()
            .into_iter()
            .filter(|name| !matches!(*name, "enabled" | "webhook_url"))
            .filter(|name| !(direct_mode && *name == "api_key"))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::config(format!(
                "missing settings: {}",
                missing.join(", ")
            )));
        }

        let link = self
            .inner
            .extractor
            .extract(text)
            .ok_or_else(|| AppError::validation(format!("no share link in '{text}'")))?;
        self.inner.transfer.transfer(&link).await
    }

    /// Full history, most recent first.
    pub async fn get_history(&self) -> HistorySnapshot {
        self.inner.history.snapshot().await
    }

    /// The newest `limit` history entries.
    pub async fn list_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.inner.history.list(limit).await
    }
}

fn join_error_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload: Box<dyn Any + Send> = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic".to_string()
    }
}
