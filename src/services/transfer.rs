// src/services/transfer.rs

//! Transfer backends.
//!
//! Two external contracts can save a share:
//! - `PlatformTransfer`: the media platform's `/api/v1/transfer` endpoint
//!   (default)
//! - `DirectTransfer`: the storage web API (share snapshot, then file add)
//!
//! The backend is chosen by `transfer.mode`; one never falls back to the
//! other.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use serde_json::{Map, Value, json};

use crate::error::{AppError, Result};
use crate::models::{Config, ShareLink, TransferMode, TransferResult, id_field};
use crate::utils::endpoint;
use crate::utils::http::{read_data_object, read_json};

/// Transfer-kind tag sent to the platform endpoint.
const TRANSFER_KIND: &str = "115";

/// Saves a share link through an external service.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Attempt the transfer exactly once.
    ///
    /// Upstream failures (status, network, timeout, malformed body) come
    /// back as `Ok(TransferResult::failed())`. `Err` is reserved for faults
    /// on our side, such as an unusable base URL.
    async fn transfer(&self, link: &ShareLink) -> Result<TransferResult>;
}

/// Build the backend selected by the configuration.
pub fn backend_for(config: &Config, client: Client) -> Arc<dyn TransferBackend> {
    match config.transfer.mode {
        TransferMode::Platform => Arc::new(PlatformTransfer::new(
            client,
            &config.service_base_url,
            &config.api_key,
        )),
        TransferMode::Direct => Arc::new(DirectTransfer::new(
            client,
            &config.transfer.storage_api,
            &config.transfer.cookie,
            config.transfer.save_pid,
        )),
    }
}

/// Transfer through `POST {base}/api/v1/transfer` with bearer auth.
pub struct PlatformTransfer {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlatformTransfer {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn request(&self, url: url::Url, link: &ShareLink) -> Result<Map<String, Value>> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "url": link.canonical_url, "type": TRANSFER_KIND }))
            .send()
            .await?;
        read_data_object(response, "transfer").await
    }
}

#[async_trait]
impl TransferBackend for PlatformTransfer {
    fn name(&self) -> &'static str {
        "platform"
    }

    async fn transfer(&self, link: &ShareLink) -> Result<TransferResult> {
        let url = endpoint(&self.base_url, &["api", "v1", "transfer"])?;

        match self.request(url, link).await {
            Ok(data) => {
                let job = id_field(&data, &["job_id", "pickcode", "pick_code"]);
                log::info!(
                    "Transfer accepted for {} (job: {})",
                    link.canonical_url,
                    job.as_deref().unwrap_or("-")
                );
                Ok(TransferResult::succeeded(data, job))
            }
            Err(e) => {
                log::error!("Transfer failed for {}: {}", link.canonical_url, e);
                Ok(TransferResult::failed())
            }
        }
    }
}

/// Transfer straight into the storage account with its session cookie.
pub struct DirectTransfer {
    client: Client,
    storage_api: String,
    cookie: String,
    save_pid: u64,
}

impl DirectTransfer {
    pub fn new(
        client: Client,
        storage_api: impl Into<String>,
        cookie: impl Into<String>,
        save_pid: u64,
    ) -> Self {
        Self {
            client,
            storage_api: storage_api.into(),
            cookie: cookie.into(),
            save_pid,
        }
    }

    /// Resolve the share's first file to a pick-code.
    async fn resolve_pick_code(
        &self,
        url: url::Url,
        share_code: &str,
        password: &str,
    ) -> Result<(String, Map<String, Value>)> {
        let response = self
            .client
            .get(url)
            .query(&[("share_code", share_code), ("pwd", password)])
            .header(COOKIE, &self.cookie)
            .send()
            .await?;
        let body = read_json(response, "share/snap").await?;
        ensure_state(&body, "share/snap")?;

        let entry = body
            .pointer("/data/list/0")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| AppError::payload("share/snap", "share lists no files"))?;
        let pick_code = id_field(&entry, &["pc", "pick_code", "pickcode"])
            .ok_or_else(|| AppError::payload("share/snap", "file entry has no pick-code"))?;
        Ok((pick_code, entry))
    }

    async fn add_file(&self, url: url::Url, pick_code: &str) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .header(COOKIE, &self.cookie)
            .json(&json!({ "pid": self.save_pid, "pickcode": pick_code }))
            .send()
            .await?;
        let body = read_json(response, "files/add").await?;
        ensure_state(&body, "files/add")?;
        Ok(body)
    }

    async fn save(
        &self,
        snap_url: url::Url,
        add_url: url::Url,
        share_code: &str,
        password: &str,
    ) -> Result<TransferResult> {
        let (pick_code, mut payload) = self
            .resolve_pick_code(snap_url, share_code, password)
            .await?;
        let added = self.add_file(add_url, &pick_code).await?;
        if let Some(Value::Object(data)) = added.get("data") {
            payload.extend(data.clone());
        }
        Ok(TransferResult::succeeded(payload, Some(pick_code)))
    }
}

#[async_trait]
impl TransferBackend for DirectTransfer {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn transfer(&self, link: &ShareLink) -> Result<TransferResult> {
        let snap_url = endpoint(&self.storage_api, &["share", "snap"])?;
        let add_url = endpoint(&self.storage_api, &["files", "add"])?;

        let Some(share_code) = link.share_code() else {
            log::error!("No share code in {}", link.canonical_url);
            return Ok(TransferResult::failed());
        };
        let password = link.password().unwrap_or_default();

        match self.save(snap_url, add_url, share_code, &password).await {
            Ok(result) => {
                log::info!(
                    "Saved share {} into folder {} (pick-code: {})",
                    share_code,
                    self.save_pid,
                    result.job_or_pick_code.as_deref().unwrap_or("-")
                );
                Ok(result)
            }
            Err(e) => {
                log::error!("Direct transfer failed for {}: {}", link.canonical_url, e);
                Ok(TransferResult::failed())
            }
        }
    }
}

/// Storage API replies carry `state: true` on success.
fn ensure_state(body: &Value, endpoint: &str) -> Result<()> {
    if body.get("state").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    let reason = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("state is not true");
    Err(AppError::payload(endpoint, reason))
}
