//! Transfer results and resolved media metadata.

use serde_json::{Map, Value};

/// Outcome of a transfer call.
///
/// Upstream failures are folded into `success == false`; the cause is only
/// logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferResult {
    pub success: bool,

    /// Job id (platform backend) or pick-code (direct backend)
    pub job_or_pick_code: Option<String>,

    /// Upstream `data` object, untouched
    pub raw_payload: Map<String, Value>,
}

impl TransferResult {
    /// Successful transfer carrying the upstream payload.
    pub fn succeeded(raw_payload: Map<String, Value>, job_or_pick_code: Option<String>) -> Self {
        Self {
            success: true,
            job_or_pick_code,
            raw_payload,
        }
    }

    /// Failed transfer.
    pub fn failed() -> Self {
        Self::default()
    }

    /// Media identifier used for the metadata lookup.
    pub fn media_id(&self) -> Option<String> {
        id_field(&self.raw_payload, &["media_id"])
    }

    /// Media details the transfer service already attached (`movie_info`).
    pub fn embedded_media(&self) -> Option<MediaInfo> {
        match self.raw_payload.get("movie_info")? {
            Value::Object(data) => Some(MediaInfo::from_payload(data)),
            _ => None,
        }
    }
}

/// Read the first present key as an identifier (string or number).
pub(crate) fn id_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Media metadata resolved for a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub title: String,
    pub overview: String,
    pub poster: Option<String>,
    pub year: Option<i32>,
    pub media_type: String,
}

impl MediaInfo {
    pub const DEFAULT_TITLE: &'static str = "Unknown title";
    pub const DEFAULT_OVERVIEW: &'static str = "No overview available";
    pub const DEFAULT_MEDIA_TYPE: &'static str = "Movie";

    /// Build from a metadata `data` object, filling gaps with defaults.
    ///
    /// `year` may arrive as a number or a numeric string; `summary` stands in
    /// for a missing `overview`.
    pub fn from_payload(data: &Map<String, Value>) -> Self {
        Self {
            title: text_field(data, "title").unwrap_or_else(|| Self::DEFAULT_TITLE.to_string()),
            overview: text_field(data, "overview")
                .or_else(|| text_field(data, "summary"))
                .unwrap_or_else(|| Self::DEFAULT_OVERVIEW.to_string()),
            poster: text_field(data, "poster"),
            year: year_field(data),
            media_type: text_field(data, "type")
                .unwrap_or_else(|| Self::DEFAULT_MEDIA_TYPE.to_string()),
        }
    }

    /// `"{title} ({year})"` when the year is known, else the bare title.
    pub fn title_line(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

fn text_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn year_field(data: &Map<String, Value>) -> Option<i32> {
    match data.get("year")? {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|year| *year > 0)
}
