//! # Remote Responses
//!
//! The shapes a remote client hands back to a driver: an HTTP-style
//! [`ApiResponse`], the decoded value (when the call succeeded), or a
//! [`TransportError`] when no response was received at all.

use serde::Serialize;
use std::collections::BTreeMap;

/// Errors raised when a call could not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("request timed out")]
    Timeout,
    #[error("could not encode request or decode response: {0}")]
    Codec(String),
}

/// Status, headers and raw body of a remote response.
///
/// Header names are stored lowercased, so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the JSON body.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, TransportError> {
        let body = serde_json::to_vec(value).map_err(|e| TransportError::Codec(e.to_string()))?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A completed remote call. `value` is `None` whenever the status was not a
/// success or the operation has no payload.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    pub value: Option<T>,
    pub response: ApiResponse,
}

impl<T> Reply<T> {
    pub fn ok(value: T, response: ApiResponse) -> Self {
        Self {
            value: Some(value),
            response,
        }
    }

    pub fn empty(response: ApiResponse) -> Self {
        Self {
            value: None,
            response,
        }
    }
}

/// Result of a remote call that returns a value.
pub type CallResult<T> = Result<Reply<T>, TransportError>;

/// Result of a remote call that only returns a response descriptor.
pub type StatusResult = Result<ApiResponse, TransportError>;
