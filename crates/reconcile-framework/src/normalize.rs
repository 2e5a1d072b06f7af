//! # Error Normalizer
//!
//! Reduces every way a remote call can fail to a [`NormalizedError`]:
//!
//! | Signal                          | Kind               |
//! |---------------------------------|--------------------|
//! | no response ([`TransportError`])| `TransportFailure` |
//! | status 404                      | `NotFound`         |
//! | other status outside 2xx        | `RemoteRejected`   |
//!
//! Non-success responses are probed for a structured `{status, code, message}`
//! body. A body that is missing, not JSON, or lacks any of the three fields
//! degrades to an error that carries only the HTTP status.

use crate::error::{ErrorKind, NormalizedError};
use crate::response::{ApiResponse, CallResult, StatusResult, TransportError};
use serde::{Deserialize, Serialize};

/// Structured error body returned by the provisioning API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub code: String,
    pub message: String,
}

/// Parses a structured error body, returning `None` if any field is absent.
pub fn parse_error_body(body: &[u8]) -> Option<ApiErrorBody> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

/// Classifies the outcome of a remote call. `Ok(())` means the status was in
/// `[200, 300)`.
pub fn normalize(outcome: Result<&ApiResponse, &TransportError>) -> Result<(), NormalizedError> {
    let response = outcome.map_err(transport_failure)?;

    if response.is_success() {
        return Ok(());
    }

    let kind = if response.status == 404 {
        ErrorKind::NotFound
    } else {
        ErrorKind::RemoteRejected
    };
    let (remote_code, remote_message) = match parse_error_body(&response.body) {
        Some(body) => (Some(body.code), Some(body.message)),
        None => (None, None),
    };

    Err(NormalizedError {
        kind,
        status_code: Some(response.status),
        remote_code,
        remote_message,
        detail: None,
    })
}

pub fn transport_failure(error: &TransportError) -> NormalizedError {
    NormalizedError {
        kind: ErrorKind::TransportFailure,
        status_code: None,
        remote_code: None,
        remote_message: None,
        detail: Some(error.to_string()),
    }
}

/// Normalizes a call that returns a value, yielding the value on success.
pub fn check<T>(outcome: CallResult<T>) -> Result<Option<T>, NormalizedError> {
    let reply = outcome.map_err(|e| transport_failure(&e))?;
    normalize(Ok(&reply.response))?;
    Ok(reply.value)
}

/// Normalizes a call that only returns a response descriptor.
pub fn check_status(outcome: StatusResult) -> Result<ApiResponse, NormalizedError> {
    let response = outcome.map_err(|e| transport_failure(&e))?;
    normalize(Ok(&response))?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_normalize_to_ok() {
        for status in [200, 201, 202, 204] {
            assert!(normalize(Ok(&ApiResponse::new(status))).is_ok());
        }
    }

    #[test]
    fn structured_body_populates_code_and_message() {
        let response = ApiResponse::new(409)
            .with_body(r#"{"status":409,"code":"DUPLICATE","message":"exists"}"#);
        let err = normalize(Ok(&response)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RemoteRejected);
        assert_eq!(err.status_code, Some(409));
        assert_eq!(err.remote_code.as_deref(), Some("DUPLICATE"));
        assert_eq!(err.remote_message.as_deref(), Some("exists"));
    }

    #[test]
    fn unparseable_body_keeps_only_the_status() {
        let response = ApiResponse::new(502).with_body("<html>bad gateway</html>");
        let err = normalize(Ok(&response)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RemoteRejected);
        assert_eq!(err.status_code, Some(502));
        assert_eq!(err.remote_code, None);
        assert_eq!(err.remote_message, None);
    }

    #[test]
    fn partial_body_degrades_to_status_only() {
        let response = ApiResponse::new(400).with_body(r#"{"status":400,"code":"BAD"}"#);
        let err = normalize(Ok(&response)).unwrap_err();
        assert_eq!(err.remote_code, None);
        assert_eq!(err.status_code, Some(400));
    }

    #[test]
    fn not_found_is_its_own_kind() {
        let err = normalize(Ok(&ApiResponse::new(404))).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn redirects_are_rejections() {
        let err = normalize(Ok(&ApiResponse::new(302))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RemoteRejected);
    }

    #[test]
    fn check_drops_the_value_of_a_failed_call() {
        use crate::response::Reply;
        let outcome: CallResult<u32> = Ok(Reply::ok(7, ApiResponse::new(500)));
        assert_eq!(check(outcome).unwrap_err().status_code, Some(500));

        let outcome: CallResult<u32> = Ok(Reply::ok(7, ApiResponse::new(200)));
        assert_eq!(check(outcome).unwrap(), Some(7));
    }

    #[test]
    fn transport_errors_carry_their_message() {
        let err = normalize(Err(&TransportError::Timeout)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TransportFailure);
        assert_eq!(err.status_code, None);
        assert_eq!(err.detail.as_deref(), Some("request timed out"));
    }
}
