//! # Reconciliation Errors
//!
//! This module defines the error types shared by every resource driver.
//! Remote failures are first reduced to a [`NormalizedError`] by the
//! [`normalize`](crate::normalize) module; drivers then either absorb them as a
//! state transition or wrap them in a [`ReconcileError`] that names the
//! resource kind and the operation that failed.

use crate::identity::IdentityDecodeError;
use crate::record::FieldError;
use std::fmt;

/// The lifecycle operation a driver was performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        };
        f.write_str(name)
    }
}

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The call never produced a response (connectivity, serialization).
    TransportFailure,
    /// The remote answered 404.
    NotFound,
    /// Any other status outside `[200, 300)`.
    RemoteRejected,
}

/// A remote failure reduced to the fields operators need to diagnose it.
///
/// `remote_code` and `remote_message` are only populated when the response
/// carried a well-formed `{status, code, message}` error body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.render())]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub status_code: Option<u16>,
    pub remote_code: Option<String>,
    pub remote_message: Option<String>,
    /// Transport error text when `kind` is `TransportFailure`.
    pub detail: Option<String>,
}

impl NormalizedError {
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    fn render(&self) -> String {
        let mut out = match self.kind {
            ErrorKind::TransportFailure => format!(
                "transport failure: {}",
                self.detail.as_deref().unwrap_or("unknown")
            ),
            ErrorKind::NotFound => "not found".to_string(),
            ErrorKind::RemoteRejected => "rejected by remote".to_string(),
        };
        if let Some(status) = self.status_code {
            out.push_str(&format!(" (status {status})"));
        }
        match (&self.remote_code, &self.remote_message) {
            (Some(code), Some(message)) => out.push_str(&format!(": {code}: {message}")),
            (Some(code), None) => out.push_str(&format!(": {code}")),
            (None, Some(message)) => out.push_str(&format!(": {message}")),
            (None, None) => {}
        }
        out
    }
}

/// Mapper failures, before the driver attaches kind and operation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MapError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("remote object has subtype {found}, expected {expected}")]
    Subtype {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors surfaced by resource drivers to the declarative engine.
///
/// Every variant carries the resource kind so a failure can be diagnosed from
/// the message alone.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("{kind} {operation} failed: {source}")]
    Remote {
        kind: &'static str,
        operation: Operation,
        #[source]
        source: NormalizedError,
    },
    #[error("{kind} create succeeded but its identifier could not be decoded: {source}")]
    IdentityDecode {
        kind: &'static str,
        #[source]
        source: IdentityDecodeError,
    },
    #[error("{kind} {operation}: {source}")]
    Mapping {
        kind: &'static str,
        operation: Operation,
        #[source]
        source: MapError,
    },
    #[error("{kind} {operation} requires an external identifier")]
    MissingIdentifier {
        kind: &'static str,
        operation: Operation,
    },
    #[error("{kind} {operation} is not valid: resource already has identifier {id}")]
    AlreadyPresent {
        kind: &'static str,
        operation: Operation,
        id: String,
    },
    #[error("{kind} {operation}: remote answered success without a body")]
    EmptyResponse {
        kind: &'static str,
        operation: Operation,
    },
    #[error("{kind} update cannot change {field} in place; the resource must be replaced")]
    RequiresReplacement { kind: &'static str, field: String },
    #[error("{kind} {operation}: could not serialize collection: {source}")]
    Serialization {
        kind: &'static str,
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl ReconcileError {
    /// The normalized remote failure behind this error, if any.
    pub fn remote(&self) -> Option<&NormalizedError> {
        match self {
            ReconcileError::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_remote_code_and_message() {
        let err = ReconcileError::Remote {
            kind: "pureport_network",
            operation: Operation::Update,
            source: NormalizedError {
                kind: ErrorKind::RemoteRejected,
                status_code: Some(409),
                remote_code: Some("DUPLICATE".into()),
                remote_message: Some("exists".into()),
                detail: None,
            },
        };
        assert_eq!(
            err.to_string(),
            "pureport_network update failed: rejected by remote (status 409): DUPLICATE: exists"
        );
    }

    #[test]
    fn transport_display_uses_detail() {
        let err = NormalizedError {
            kind: ErrorKind::TransportFailure,
            status_code: None,
            remote_code: None,
            remote_message: None,
            detail: Some("connection refused".into()),
        };
        assert_eq!(err.to_string(), "transport failure: connection refused");
    }

    #[test]
    fn not_found_is_a_source_less_std_error() {
        let err = NormalizedError {
            kind: ErrorKind::NotFound,
            status_code: Some(404),
            remote_code: Some("RESOURCE_NOT_FOUND".into()),
            remote_message: None,
            detail: None,
        };
        let as_std: &dyn std::error::Error = &err;
        assert!(as_std.source().is_none());
        assert_eq!(as_std.to_string(), "not found (status 404): RESOURCE_NOT_FOUND");
    }
}
