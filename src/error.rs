// src/error.rs
//! Error taxonomy.
//!
//! `FetchError` and `ExtractionFailed` are recovered per source by placeholder
//! substitution and never reach the refresh caller. `InvalidRequest` is the
//! only error a `/recommend` client ever sees. `ConfigError` is startup-only.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use thiserror::Error;

use crate::ingest::types::SourceId;

/// Retrieving a listing page failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out after {timeout_ms}ms fetching {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },
}

/// No element matched any selector strategy of a source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no program entries matched any selector for {source_id}")]
pub struct ExtractionFailed {
    pub source_id: SourceId,
}

/// Why a source fell back to its placeholder.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarvestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionFailed),
}

/// Rejected `/recommend` request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("태그가 전송되지 않았습니다.")]
    MissingTags,

    #[error("잘못된 요청 본문입니다: {reason}")]
    MalformedBody { reason: String },
}

impl From<JsonRejection> for InvalidRequest {
    fn from(rejection: JsonRejection) -> Self {
        InvalidRequest::MalformedBody {
            reason: rejection.body_text(),
        }
    }
}

impl IntoResponse for InvalidRequest {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown source \"{0}\"")]
pub struct UnknownSource(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("{env} points to non-existent path {path}")]
    MissingPath { env: &'static str, path: PathBuf },

    #[error("{path}: {source}")]
    UnknownSource {
        path: PathBuf,
        #[source]
        source: UnknownSource,
    },

    #[error("{path}: source {key} overrides selectors with an empty list")]
    EmptySelectors { path: PathBuf, key: String },

    #[error("tag rule \"{rule}\" has no triggers")]
    EmptyTriggers { rule: String },

    #[error("tag rule \"{rule}\" emits tag \"{tag}\" without a leading '#'")]
    UnmarkedTag { rule: String, tag: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harvest_error_is_transparent() {
        let e: HarvestError = FetchError::Status {
            status: 503,
            url: "https://example.test/".into(),
        }
        .into();
        assert_eq!(
            e.to_string(),
            "unexpected HTTP status 503 from https://example.test/"
        );

        let e: HarvestError = ExtractionFailed {
            source_id: SourceId::Cts,
        }
        .into();
        assert_eq!(
            e.to_string(),
            "no program entries matched any selector for CTS"
        );
    }

    #[test]
    fn invalid_request_maps_to_400() {
        let resp = InvalidRequest::MissingTags.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = InvalidRequest::MalformedBody {
            reason: "expected a sequence".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
