// src/services/notify.rs

//! WeCom news-card notifications.
//!
//! Builds a single-article news card from resolved media and posts it to the
//! group robot webhook.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{MediaInfo, NotifyConfig};
use crate::utils::http::excerpt;

/// Overview characters kept in a notification.
pub const OVERVIEW_LIMIT: usize = 120;

/// Appended to an overview cut at `OVERVIEW_LIMIT`.
pub const ELLIPSIS: &str = "...";

/// Webhook body: `{"msgtype": "news", "news": {"articles": [...]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsMessage {
    pub msgtype: &'static str,
    pub news: News,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct News {
    pub articles: Vec<Article>,
}

/// One rich article entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    pub picurl: String,
}

/// Cut `overview` to `OVERVIEW_LIMIT` characters plus `ELLIPSIS`.
///
/// Counts Unicode scalar values, so multi-byte text is never split inside a
/// character. Short overviews pass through unchanged.
pub fn truncate_overview(overview: &str) -> String {
    match overview.char_indices().nth(OVERVIEW_LIMIT) {
        Some((cut, _)) => format!("{}{}", &overview[..cut], ELLIPSIS),
        None => overview.to_string(),
    }
}

/// Substitute `{name}` placeholders in one pass.
///
/// Values are never re-scanned, so a sender named `{overview}` stays
/// literal. Unknown placeholders are kept as written.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let replaced = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Formats and dispatches notifications.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    webhook_url: String,
    template: String,
}

impl Notifier {
    pub fn new(client: Client, webhook_url: impl Into<String>, config: &NotifyConfig) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            template: config.template.clone(),
        }
    }

    /// Build the news card for a saved share.
    pub fn format(&self, info: &MediaInfo, sender: &str, original_url: &str) -> NewsMessage {
        let overview = truncate_overview(&info.overview);
        let description = render(
            &self.template,
            &[
                ("media_type", info.media_type.as_str()),
                ("sender", sender),
                ("url", original_url),
                ("overview", overview.as_str()),
            ],
        );
        let poster = info.poster.clone().unwrap_or_default();

        NewsMessage {
            msgtype: "news",
            news: News {
                articles: vec![Article {
                    title: info.title_line(),
                    description,
                    url: poster.clone(),
                    picurl: poster,
                }],
            },
        }
    }

    /// Format and post in one step.
    pub async fn notify(&self, info: &MediaInfo, sender: &str, original_url: &str) -> Result<bool> {
        let message = self.format(info, sender, original_url);
        self.dispatch(&message).await
    }

    /// Post a message to the webhook exactly once.
    ///
    /// Returns `Ok(false)` for any delivery failure (logged). `Err` only if
    /// the configured webhook is not a URL at all.
    pub async fn dispatch(&self, message: &NewsMessage) -> Result<bool> {
        let url = Url::parse(&self.webhook_url)?;

        match self.post(url, message).await {
            Ok(()) => {
                log::info!("Notification sent: {}", message_title(message));
                Ok(true)
            }
            Err(e) => {
                log::error!(
                    "Notification failed for {}: {}",
                    message_title(message),
                    e
                );
                Ok(false)
            }
        }
    }

    async fn post(&self, url: Url, message: &NewsMessage) -> Result<()> {
        let response = self.client.post(url).json(message).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(AppError::upstream("webhook", status.as_u16(), excerpt(&body)));
        }

        // The robot API answers 200 with a non-zero errcode on rejection.
        if let Ok(reply) = serde_json::from_str::<Value>(&body) {
            let errcode = reply.get("errcode").and_then(Value::as_i64).unwrap_or(0);
            if errcode != 0 {
                let errmsg = reply
                    .get("errmsg")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                return Err(AppError::payload(
                    "webhook",
                    format!("errcode {errcode}: {errmsg}"),
                ));
            }
        }
        Ok(())
    }
}

fn message_title(message: &NewsMessage) -> &str {
    message
        .news
        .articles
        .first()
        .map(|a| a.title.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::HttpConfig;
    use crate::utils::http::create_async_client;

    fn notifier(webhook: &str) -> Notifier {
        Notifier::new(
            create_async_client(&HttpConfig::default()).unwrap(),
            webhook,
            &NotifyConfig::default(),
        )
    }

    fn media(overview: &str, year: Option<i32>) -> MediaInfo {
        MediaInfo {
            title: "Movie X".to_string(),
            overview: overview.to_string(),
            poster: Some("https://img.example.com/x.jpg".to_string()),
            year,
            media_type: "Movie".to_string(),
        }
    }

    #[test]
    fn test_truncate_long_overview() {
        let overview = "a".repeat(130);
        let cut = truncate_overview(&overview);
        assert_eq!(cut, format!("{}...", "a".repeat(120)));
    }

    #[test]
    fn test_truncate_boundary() {
        let exact = "b".repeat(120);
        assert_eq!(truncate_overview(&exact), exact);

        let over = "b".repeat(121);
        assert_eq!(truncate_overview(&over).chars().count(), 123);
    }

    #[test]
    fn test_truncate_counts_characters() {
        let overview = "剧".repeat(121);
        let cut = truncate_overview(&overview);
        assert_eq!(cut, format!("{}...", "剧".repeat(120)));
    }

    #[test]
    fn test_render_single_pass() {
        let out = render(
            "{sender} said {overview} {missing} {",
            &[("sender", "{overview}"), ("overview", "hi")],
        );
        assert_eq!(out, "{overview} said hi {missing} {");
    }

    #[test]
    fn test_format_news_card() {
        let overview = "x".repeat(130);
        let message = notifier("https://example.com/hook").format(
            &media(&overview, Some(2020)),
            "alice",
            "https://115cdn.com/s/abc123#pwd",
        );

        let article = &message.news.articles[0];
        assert_eq!(message.msgtype, "news");
        assert_eq!(article.title, "Movie X (2020)");
        assert_eq!(article.url, "https://img.example.com/x.jpg");
        assert_eq!(article.picurl, article.url);
        assert_eq!(
            article.description,
            format!(
                "🎬 Movie saved\n👤 Submitted by: alice\n🔗 Original link: https://115cdn.com/s/abc123#pwd\n\n{}...",
                "x".repeat(120)
            )
        );
    }

    #[test]
    fn test_format_without_year_or_poster() {
        let mut info = media("short", None);
        info.poster = None;
        let message = notifier("https://example.com/hook").format(&info, "bob", "u");
        let article = &message.news.articles[0];
        assert_eq!(article.title, "Movie X");
        assert_eq!(article.picurl, "");
        assert!(article.description.ends_with("\n\nshort"));
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "msgtype": "news",
                "news": { "articles": [ { "title": "Movie X (2020)" } ] }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "errcode": 0, "errmsg": "ok" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sent = notifier(&format!("{}/hook", server.uri()))
            .notify(&media("plot", Some(2020)), "alice", "https://115.com/s/a")
            .await
            .unwrap();
        assert!(sent);
    }

    #[tokio::test]
    async fn test_dispatch_http_error_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let sent = notifier(&format!("{}/hook", server.uri()))
            .notify(&media("plot", None), "alice", "https://115.com/s/a")
            .await
            .unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_dispatch_errcode_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "errcode": 93000, "errmsg": "invalid webhook url" }),
            ))
            .mount(&server)
            .await;

        let sent = notifier(&format!("{}/hook", server.uri()))
            .notify(&media("plot", None), "alice", "https://115.com/s/a")
            .await
            .unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_dispatch_bad_webhook_is_error() {
        let result = notifier("not a url")
            .notify(&media("plot", None), "alice", "https://115.com/s/a")
            .await;
        assert!(matches!(result, Err(AppError::Url(_))));
    }
}
