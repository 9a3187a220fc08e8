// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Longest upstream body excerpt kept in error messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// Create a configured asynchronous HTTP client.
///
/// The timeout bounds every request made through the client; an expired
/// timeout surfaces as an ordinary `reqwest::Error`.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Require HTTP 200 and parse the body as JSON.
pub async fn read_json(response: Response, endpoint: &str) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;
    if status != StatusCode::OK {
        return Err(AppError::upstream(endpoint, status.as_u16(), excerpt(&body)));
    }
    serde_json::from_str(&body).map_err(|e| AppError::payload(endpoint, e))
}

/// Require HTTP 200 and return the `data` object of a `{ "data": {...} }` body.
pub async fn read_data_object(response: Response, endpoint: &str) -> Result<Map<String, Value>> {
    match read_json(response, endpoint).await? {
        Value::Object(mut body) => match body.remove("data") {
            Some(Value::Object(data)) => Ok(data),
            _ => Err(AppError::payload(endpoint, "missing `data` object")),
        },
        _ => Err(AppError::payload(endpoint, "body is not a JSON object")),
    }
}

/// First characters of an upstream body, for logs.
pub fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
