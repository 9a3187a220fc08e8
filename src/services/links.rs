// src/services/links.rs

//! Share link detection.
//!
//! Finds the first `http(s)://{primary|mirror}/<path>` link in a message and
//! rewrites mirror hosts to the primary domain.

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{LinkConfig, ShareLink};

/// Extracts share links from raw message text.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    pattern: Regex,
    primary_domain: String,
}

impl LinkExtractor {
    /// Build an extractor for the configured domains.
    pub fn new(config: &LinkConfig) -> Result<Self> {
        let mut hosts: Vec<&str> = std::iter::once(config.primary_domain.as_str())
            .chain(config.mirror_domains.iter().map(String::as_str))
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .collect();
        if hosts.is_empty() {
            return Err(AppError::config("no share link domains configured"));
        }
        // Longest first so a host never shadows a longer one sharing its prefix.
        hosts.sort_by_key(|host| std::cmp::Reverse(host.len()));

        let alternation = hosts
            .iter()
            .map(|host| regex::escape(host))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i:https?)://((?i:{alternation}))/\S+"))
            .map_err(|e| AppError::config(format!("invalid share link pattern: {e}")))?;

        Ok(Self {
            pattern,
            primary_domain: config.primary_domain.trim().to_string(),
        })
    }

    /// Find the first share link in `text`.
    ///
    /// `None` is the normal outcome for ordinary chatter.
    pub fn extract(&self, text: &str) -> Option<ShareLink> {
        let caps = self.pattern.captures(text)?;
        let whole = caps.get(0)?;
        let host = caps.get(1)?;
        let raw_text = whole.as_str();

        let is_mirror = !host.as_str().eq_ignore_ascii_case(&self.primary_domain);
        let canonical_url = if is_mirror {
            let start = host.start() - whole.start();
            let end = host.end() - whole.start();
            format!(
                "{}{}{}",
                &raw_text[..start],
                self.primary_domain,
                &raw_text[end..]
            )
        } else {
            raw_text.to_string()
        };

        if is_mirror {
            log::info!("Rewrote mirror link {} -> {}", raw_text, canonical_url);
        }

        Some(ShareLink {
            raw_text: raw_text.to_string(),
            canonical_url,
            is_mirror,
        })
    }
}
