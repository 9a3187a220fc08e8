//! Application configuration structures.
//!
//! The configuration file is owned by the host. The relay reads it once at
//! start-up and only ever writes back the `history` array (see
//! `storage::local`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::HistoryEntry;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Master switch for the relay
    #[serde(default)]
    pub enabled: bool,

    /// Bearer token for the transfer/media service
    #[serde(default)]
    pub api_key: String,

    /// WeCom group robot webhook
    #[serde(default)]
    pub webhook_url: String,

    /// Base URL of the transfer/media service
    #[serde(default = "defaults::service_base_url")]
    pub service_base_url: String,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Share link recognition
    #[serde(default)]
    pub link: LinkConfig,

    /// Transfer backend selection
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Notification rendering
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Message processing behavior
    #[serde(default)]
    pub relay: RelayConfig,

    /// Recent operations, most recent first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Names of the settings that keep the relay from running.
    ///
    /// Empty when the relay is enabled and fully configured.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.enabled {
            missing.push("enabled");
        }
        if self.api_key.trim().is_empty() {
            missing.push("api_key");
        }
        if self.webhook_url.trim().is_empty() {
            missing.push("webhook_url");
        }
        if self.transfer.mode == TransferMode::Direct && self.transfer.cookie.trim().is_empty() {
            missing.push("transfer.cookie");
        }
        missing
    }

    /// Whether messages should be processed at all.
    pub fn is_ready(&self) -> bool {
        self.missing_settings().is_empty()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        Url::parse(&self.service_base_url).map_err(|e| {
            AppError::validation(format!(
                "service_base_url '{}' is not a valid URL: {e}",
                self.service_base_url
            ))
        })?;
        if !self.webhook_url.trim().is_empty() {
            Url::parse(&self.webhook_url).map_err(|e| {
                AppError::validation(format!("webhook_url is not a valid URL: {e}"))
            })?;
        }
        if self.link.primary_domain.trim().is_empty() {
            return Err(AppError::validation("link.primary_domain is empty"));
        }
        if self
            .link
            .mirror_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&self.link.primary_domain))
        {
            return Err(AppError::validation(
                "link.mirror_domains must not contain the primary domain",
            ));
        }
        if self.transfer.mode == TransferMode::Direct {
            Url::parse(&self.transfer.storage_api).map_err(|e| {
                AppError::validation(format!("transfer.storage_api is not a valid URL: {e}"))
            })?;
        }
        if self.notify.template.trim().is_empty() {
            return Err(AppError::validation("notify.template is empty"));
        }
        if self.relay.max_concurrent == 0 {
            return Err(AppError::validation("relay.max_concurrent must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            webhook_url: String::new(),
            service_base_url: defaults::service_base_url(),
            http: HttpConfig::default(),
            link: LinkConfig::default(),
            transfer: TransferConfig::default(),
            notify: NotifyConfig::default(),
            relay: RelayConfig::default(),
            history: Vec::new(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for outbound requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds, applied to every outbound call
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Share link recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Canonical host every link is rewritten to
    #[serde(default = "defaults::primary_domain")]
    pub primary_domain: String,

    /// Alternate hosts serving the same shares
    #[serde(default = "defaults::mirror_domains")]
    pub mirror_domains: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            primary_domain: defaults::primary_domain(),
            mirror_domains: defaults::mirror_domains(),
        }
    }
}

/// Which external contract performs the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// `POST {service_base_url}/api/v1/transfer`
    #[default]
    Platform,
    /// Share snapshot + file add against the storage web API
    Direct,
}

/// Transfer backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default)]
    pub mode: TransferMode,

    /// Storage account cookie (direct mode only)
    #[serde(default)]
    pub cookie: String,

    /// Target folder id (direct mode only)
    #[serde(default)]
    pub save_pid: u64,

    /// Storage web API base (direct mode only)
    #[serde(default = "defaults::storage_api")]
    pub storage_api: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            mode: TransferMode::default(),
            cookie: String::new(),
            save_pid: 0,
            storage_api: defaults::storage_api(),
        }
    }
}

/// Notification rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Article description template.
    ///
    /// Placeholders: `{media_type}`, `{sender}`, `{url}`, `{overview}`
    #[serde(default = "defaults::template")]
    pub template: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            template: defaults::template(),
        }
    }
}

/// Message processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Messages processed at once by the stream front-end
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Default row count for history listings
    #[serde(default = "defaults::history_limit")]
    pub history_limit: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
            history_limit: defaults::history_limit(),
        }
    }
}

mod defaults {
    pub fn service_base_url() -> String {
        "http://localhost:3001".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; share-relay/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Link defaults
    pub fn primary_domain() -> String {
        "115.com".into()
    }
    pub fn mirror_domains() -> Vec<String> {
        vec!["115cdn.com".into()]
    }

    pub fn storage_api() -> String {
        "https://webapi.115.com".into()
    }

    pub fn template() -> String {
        "🎬 {media_type} saved\n👤 Submitted by: {sender}\n🔗 Original link: {url}\n\n{overview}"
            .into()
    }

    pub fn max_concurrent() -> usize {
        4
    }
    pub fn history_limit() -> usize {
        20
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_config() -> Config {
        Config {
            enabled: true,
            api_key: "key".to_string(),
            webhook_url: "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=x".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_config_is_not_ready() {
        let config = Config::default();
        assert!(!config.is_ready());
        assert_eq!(
            config.missing_settings(),
            vec!["enabled", "api_key", "webhook_url"]
        );
    }

    #[test]
    fn ready_when_enabled_with_key_and_webhook() {
        assert!(ready_config().is_ready());
    }

    #[test]
    fn direct_mode_requires_cookie() {
        let mut config = ready_config();
        config.transfer.mode = TransferMode::Direct;
        assert_eq!(config.missing_settings(), vec!["transfer.cookie"]);

        config.transfer.cookie = "UID=1; CID=2".to_string();
        assert!(config.is_ready());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_mirror_equal_to_primary() {
        let mut config = Config::default();
        config.link.mirror_domains.push("115.COM".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.service_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            enabled = true
            api_key = "abc"
            webhook_url = "https://example.com/hook"

            [transfer]
            mode = "direct"
            cookie = "UID=1"
            save_pid = 42
            "#,
        )
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.service_base_url, "http://localhost:3001");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.link.mirror_domains, vec!["115cdn.com"]);
        assert_eq!(config.transfer.mode, TransferMode::Direct);
        assert_eq!(config.transfer.save_pid, 42);
        assert!(config.history.is_empty());
    }
}
