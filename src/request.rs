//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) target: String,
    pub(crate) headers: http::HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        parts: http::request::Parts,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        let target = parts.uri.path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());
        Self { method: parts.method, target, headers: parts.headers, body, params }
    }

    pub fn method(&self) -> &http::Method { &self.method }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The request target as sent: path plus query, e.g. `/?page=2`.
    pub fn target(&self) -> &str { &self.target }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/files/{id}`, `req.param("id")` on `/files/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Deserialises the body as JSON.
    ///
    /// The `content-type` must be `application/json` (parameters such as
    /// `charset` are allowed) or `application/*+json`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, JsonRejection> {
        let content_type = self.header("content-type").ok_or(JsonRejection::MissingContentType)?;
        if !is_json(content_type) {
            return Err(JsonRejection::UnsupportedContentType(content_type.to_owned()));
        }
        serde_json::from_slice(&self.body).map_err(JsonRejection::Body)
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };
    kind.eq_ignore_ascii_case("application")
        && (subtype.eq_ignore_ascii_case("json")
            || subtype.to_ascii_lowercase().ends_with("+json"))
}

// ── JsonRejection ─────────────────────────────────────────────────────────────

/// Why a JSON body was refused before reaching the handler's logic.
#[derive(Debug, Error)]
pub enum JsonRejection {
    #[error("missing content-type, expected application/json")]
    MissingContentType,

    #[error("unsupported content-type `{0}`, expected application/json")]
    UnsupportedContentType(String),

    #[error("malformed JSON body: {0}")]
    Body(#[source] serde_json::Error),
}

impl IntoResponse for JsonRejection {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "rejecting request body");
        let status = match self {
            Self::MissingContentType | Self::UnsupportedContentType(_) => Status::UnsupportedMediaType,
            Self::Body(_) => Status::BadRequest,
        };
        Response::builder().status(status).text(format!("{self}\n"))
    }
}
