// src/services/metadata.rs

//! Media metadata lookup.

use reqwest::Client;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{MediaInfo, TransferResult};
use crate::utils::endpoint;
use crate::utils::http::read_data_object;

/// Resolves transfer results into media metadata via
/// `GET {base}/api/v1/media/{id}`.
#[derive(Clone)]
pub struct MetadataClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MetadataClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Look up the media behind a successful transfer.
    ///
    /// Details embedded in the transfer payload (`movie_info`) win and need no
    /// request. Otherwise `media_id` is fetched. `Ok(None)` covers a payload
    /// with neither (no request is made) and any upstream failure, which is
    /// logged.
    pub async fn lookup(&self, transfer: &TransferResult) -> Result<Option<MediaInfo>> {
        if let Some(info) = transfer.embedded_media() {
            log::debug!("Using media details from transfer payload: {}", info.title_line());
            return Ok(Some(info));
        }
        match transfer.media_id() {
            Some(id) => self.fetch(&id).await,
            None => {
                log::warn!("Transfer payload carries no media_id; skipping metadata lookup");
                Ok(None)
            }
        }
    }

    /// Fetch metadata for one media identifier.
    pub async fn fetch(&self, media_id: &str) -> Result<Option<MediaInfo>> {
        let url = endpoint(&self.base_url, &["api", "v1", "media", media_id])?;

        match self.request(url).await {
            Ok(data) => {
                let info = MediaInfo::from_payload(&data);
                log::debug!("Resolved media {} -> {}", media_id, info.title_line());
                Ok(Some(info))
            }
            Err(e) => {
                log::error!("Metadata lookup failed for {}: {}", media_id, e);
                Ok(None)
            }
        }
    }

    async fn request(&self, url: url::Url) -> Result<Map<String, Value>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        read_data_object(response, "media").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::HttpConfig;
    use crate::utils::http::create_async_client;

    fn metadata_client(base: &str) -> MetadataClient {
        MetadataClient::new(
            create_async_client(&HttpConfig::default()).unwrap(),
            base,
            "secret",
        )
    }

    fn transfer_with(payload: Value) -> TransferResult {
        match payload {
            Value::Object(map) => TransferResult::succeeded(map, None),
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/media/603"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "title": "The Matrix",
                    "overview": "A hacker learns the truth.",
                    "poster": "https://img.example.com/matrix.jpg",
                    "year": 1999,
                    "type": "Movie"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info = metadata_client(&server.uri())
            .lookup(&transfer_with(json!({ "media_id": 603 })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.title_line(), "The Matrix (1999)");
        assert_eq!(info.media_type, "Movie");
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .expect(1)
            .mount(&server)
            .await;

        let info = metadata_client(&server.uri())
            .fetch("missing")
            .await
            .unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_lookup_without_media_id_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let info = metadata_client(&server.uri())
            .lookup(&transfer_with(json!({ "job_id": "j-1" })))
            .await
            .unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_lookup_prefers_embedded_movie_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let info = metadata_client(&server.uri())
            .lookup(&transfer_with(json!({
                "media_id": 603,
                "movie_info": { "title": "Movie X", "summary": "s" }
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.title, "Movie X");
        assert_eq!(info.overview, "s");
    }

    #[tokio::test]
    async fn test_media_id_is_path_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/media/tmdb:603"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "title": "X" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let info = metadata_client(&server.uri())
            .fetch("tmdb:603")
            .await
            .unwrap();
        assert_eq!(info.map(|i| i.title), Some("X".to_string()));
    }
}
