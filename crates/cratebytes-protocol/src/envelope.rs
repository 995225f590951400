//! The uniform response envelope and its decoder.
//!
//! Every CrateBytes endpoint answers with the same outer shape:
//!
//! ```text
//! { "statusCode": 200, "data": { ... } }                 // success
//! { "statusCode": 401, "error": { "message": "..." } }   // failure
//! ```
//!
//! [`decode_response`] turns whatever the transport produced (a response
//! with any status, or a transport error) into a [`ResponseEnvelope`].
//! Callers get exactly one failure path: `success == false` plus a
//! populated [`ApiError`], no matter whether the network, the server, or
//! the JSON was at fault.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cratebytes_transport::{HttpResponse, TransportError};

/// Message used whenever a "successful" response carries no usable payload.
pub const INVALID_RESPONSE: &str = "Failed to get a valid response from the API";

/// Where a failure came from.
///
/// Every kind surfaces through the same [`ApiError`] shape; the kind
/// only helps callers that want to react differently (e.g., retry a
/// transport failure but re-authenticate on a protocol 401).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    /// No response was obtained at all.
    Transport,
    /// The server answered with a non-success status.
    Protocol,
    /// The body was malformed or did not match the expected shape.
    Decode,
    /// The server reported a structured error alongside a success status.
    #[default]
    Application,
    /// The request was never sent: a local precondition failed (no token,
    /// a body that would not encode).
    Local,
}

/// A normalized failure.
///
/// Only `message` exists on the wire (`{"message": "..."}`); `kind` is
/// filled in locally by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    #[serde(skip)]
    pub kind: ErrorKind,
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The error used for "success but no payload".
    pub fn invalid_response() -> Self {
        Self::new(ErrorKind::Decode, INVALID_RESPONSE)
    }

    fn parse_failure(cause: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::Decode,
            format!("Failed to parse response: {cause}"),
        )
    }
}

/// The decoded result of one API call.
///
/// Invariant: `success` is `true` iff the status was 200 or 204 AND the
/// payload decoded. When `success` is `false`, `error` is always `Some`.
/// `data` can be `None` on success only for 204 responses or payload types
/// that accept `null`; use [`into_result`](Self::into_result) when a
/// payload is required.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    /// The server-reported status; 0 when no response was obtained.
    pub status_code: u16,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> ResponseEnvelope<T> {
    /// A successful envelope.
    pub fn success(status_code: u16, data: Option<T>) -> Self {
        Self {
            success: true,
            status_code,
            data,
            error: None,
        }
    }

    /// A failed envelope.
    pub fn failure(status_code: u16, error: ApiError) -> Self {
        Self {
            success: false,
            status_code,
            data: None,
            error: Some(error),
        }
    }

    /// The error message, if this envelope failed.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Converts into a `Result`, treating "success without data" as an
    /// error so callers never see a hollow success.
    pub fn into_result(self) -> Result<T, ApiError> {
        if self.success {
            self.data.ok_or_else(ApiError::invalid_response)
        } else {
            Err(self.error.unwrap_or_else(ApiError::invalid_response))
        }
    }

    /// Downgrades a success that carries no payload into a failure.
    pub fn require_data(self) -> Self {
        if self.success && self.data.is_none() {
            Self::failure(self.status_code, ApiError::invalid_response())
        } else {
            self
        }
    }

    /// Transforms the payload, keeping status and error untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            success: self.success,
            status_code: self.status_code,
            data: self.data.map(f),
            error: self.error,
        }
    }

    /// Transforms the payload with a fallible function; a failure turns
    /// the whole envelope into a failed one.
    pub fn try_map<U>(
        self,
        f: impl FnOnce(T) -> Result<U, ApiError>,
    ) -> ResponseEnvelope<U> {
        let status_code = self.status_code;
        if !self.success {
            return ResponseEnvelope {
                success: false,
                status_code,
                data: None,
                error: self.error,
            };
        }
        match self.data.map(f).transpose() {
            Ok(data) => ResponseEnvelope::success(status_code, data),
            Err(error) => ResponseEnvelope::failure(status_code, error),
        }
    }
}

/// Status codes the API uses for success.
pub fn is_success_status(status: u16) -> bool {
    status == 200 || status == 204
}

/// The outer shape of every response body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    data: Option<Value>,
}

fn status_line(response: &HttpResponse, status: u16) -> String {
    if status == response.status {
        response.status_line()
    } else {
        format!("HTTP {status}")
    }
}

/// Normalizes a transport result into a [`ResponseEnvelope`].
///
/// Never panics. The decision table:
///
/// | Input | Result |
/// |---|---|
/// | transport error | failure, status 0, [`ErrorKind::Transport`] |
/// | unparseable body, 2xx | failure, [`ErrorKind::Decode`] |
/// | unparseable body, non-2xx | failure, status line, [`ErrorKind::Protocol`] |
/// | `error` field, 200/204 | failure, [`ErrorKind::Application`] |
/// | status not 200/204 | failure, server error or status line, [`ErrorKind::Protocol`] |
/// | 200/204 with `data` | success if `data` decodes into `T` |
/// | 204 without `data` | success, `data = None` |
/// | 200 without `data` | success only if `T` accepts `null` |
pub fn decode_response<T: DeserializeOwned>(
    result: Result<HttpResponse, TransportError>,
) -> ResponseEnvelope<T> {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(error = %err, "request failed before a response");
            return ResponseEnvelope::failure(
                0,
                ApiError::new(ErrorKind::Transport, err.to_string()),
            );
        }
    };

    let http_ok = response.is_success();

    let wire = if response.body.trim().is_empty() {
        if !http_ok {
            return ResponseEnvelope::failure(
                response.status,
                ApiError::new(ErrorKind::Protocol, response.status_line()),
            );
        }
        WireEnvelope::default()
    } else {
        match serde_json::from_str::<WireEnvelope>(&response.body) {
            Ok(wire) => wire,
            Err(err) if http_ok => {
                tracing::debug!(error = %err, status = response.status, "unparseable response body");
                return ResponseEnvelope::failure(
                    response.status,
                    ApiError::parse_failure(err),
                );
            }
            Err(_) => {
                return ResponseEnvelope::failure(
                    response.status,
                    ApiError::new(ErrorKind::Protocol, response.status_line()),
                );
            }
        }
    };

    let status = wire.status_code.unwrap_or(response.status);
    let succeeded = http_ok && is_success_status(status);

    if let Some(mut error) = wire.error {
        error.kind = if succeeded {
            ErrorKind::Application
        } else {
            ErrorKind::Protocol
        };
        if error.message.is_empty() {
            error.message = status_line(&response, status);
        }
        tracing::debug!(status, error = %error.message, "server reported an error");
        return ResponseEnvelope::failure(status, error);
    }

    if !succeeded {
        return ResponseEnvelope::failure(
            status,
            ApiError::new(ErrorKind::Protocol, status_line(&response, status)),
        );
    }

    match wire.data {
        Some(value) => match serde_json::from_value::<T>(value) {
            Ok(data) => ResponseEnvelope::success(status, Some(data)),
            Err(err) => {
                ResponseEnvelope::failure(status, ApiError::parse_failure(err))
            }
        },
        None if status == 204 => ResponseEnvelope::success(status, None),
        // A 200 without data is only acceptable for payload types that
        // can be built from `null` (unit, `Option`).
        None => match serde_json::from_value::<T>(Value::Null) {
            Ok(data) => ResponseEnvelope::success(status, Some(data)),
            Err(_) => {
                ResponseEnvelope::failure(status, ApiError::invalid_response())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionData;

    fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(status, body))
    }

    const SESSION: &str = r#"{"id":"s1","playerId":"p1","startTime":"2024-05-01T10:00:00Z","lastHeartbeat":"2024-05-01T10:00:00Z"}"#;

    #[test]
    fn test_success_with_payload() {
        let body = format!(r#"{{"statusCode":200,"data":{SESSION}}}"#);
        let env: ResponseEnvelope<SessionData> = decode_response(ok(200, &body));

        assert!(env.success);
        assert_eq!(env.status_code, 200);
        assert_eq!(env.error, None);
        assert_eq!(env.data.unwrap().id.as_str(), "s1");
    }

    #[test]
    fn test_success_payload_equals_input_for_plain_values() {
        for value in ["0", "42", "\"text\"", "[1,2,3]", "{\"a\":{\"b\":null}}"] {
            let body = format!(r#"{{"statusCode":200,"data":{value}}}"#);
            let env: ResponseEnvelope<Value> = decode_response(ok(200, &body));
            let expected: Value = serde_json::from_str(value).unwrap();
            assert!(env.success, "payload {value} should succeed");
            assert_eq!(env.data, Some(expected));
        }
    }

    #[test]
    fn test_204_with_payload_is_success() {
        let env: ResponseEnvelope<String> =
            decode_response(ok(200, r#"{"statusCode":204,"data":"x"}"#));
        assert!(env.success);
        assert_eq!(env.status_code, 204);
        assert_eq!(env.data.as_deref(), Some("x"));
    }

    #[test]
    fn test_non_success_status_fails_even_with_payload() {
        for status in [201u16, 301, 400, 401, 404, 500, 503] {
            let body = format!(r#"{{"statusCode":{status},"data":"x"}}"#);
            let env: ResponseEnvelope<String> =
                decode_response(ok(status, &body));
            assert!(!env.success, "status {status} must not succeed");
            assert!(env.error.is_some());
            assert_eq!(env.data, None);
        }
    }

    #[test]
    fn test_server_status_overrides_http_status() {
        // HTTP said 200 but the envelope says 403.
        let env: ResponseEnvelope<String> =
            decode_response(ok(200, r#"{"statusCode":403,"data":"x"}"#));
        assert!(!env.success);
        assert_eq!(env.status_code, 403);
        assert_eq!(env.error.unwrap().kind, ErrorKind::Protocol);
    }

    #[test]
    fn test_server_error_message_surfaces() {
        let env: ResponseEnvelope<SessionData> = decode_response(ok(
            401,
            r#"{"statusCode":401,"error":{"message":"expired"}}"#,
        ));
        assert!(!env.success);
        assert_eq!(env.status_code, 401);
        assert_eq!(env.error_message(), Some("expired"));
        assert_eq!(env.error.unwrap().kind, ErrorKind::Protocol);
    }

    #[test]
    fn test_error_field_on_success_status_is_application_error() {
        let env: ResponseEnvelope<String> = decode_response(ok(
            200,
            r#"{"statusCode":200,"error":{"message":"leaderboard locked"}}"#,
        ));
        assert!(!env.success);
        let err = env.error.unwrap();
        assert_eq!(err.kind, ErrorKind::Application);
        assert_eq!(err.message, "leaderboard locked");
    }

    #[test]
    fn test_empty_error_message_falls_back_to_status_line() {
        let env: ResponseEnvelope<String> = decode_response(Ok(
            HttpResponse::new(500, r#"{"statusCode":500,"error":{}}"#)
                .with_reason("Internal Server Error"),
        ));
        assert_eq!(env.error_message(), Some("HTTP 500 Internal Server Error"));
    }

    #[test]
    fn test_transport_failures_never_succeed() {
        let errors = [
            TransportError::Connection("refused".into()),
            TransportError::Connection("timed out".into()),
            TransportError::Protocol("bad chunk".into()),
        ];
        for err in errors {
            let env: ResponseEnvelope<SessionData> = decode_response(Err(err));
            assert!(!env.success);
            assert_eq!(env.status_code, 0);
            let error = env.error.unwrap();
            assert_eq!(error.kind, ErrorKind::Transport);
            assert!(!error.message.is_empty());
        }
    }

    #[test]
    fn test_malformed_body_on_2xx_is_parse_failure() {
        let env: ResponseEnvelope<SessionData> =
            decode_response(ok(200, "<html>oops</html>"));
        assert!(!env.success);
        let err = env.error.unwrap();
        assert_eq!(err.kind, ErrorKind::Decode);
        assert!(err.message.starts_with("Failed to parse response: "));
    }

    #[test]
    fn test_malformed_body_on_error_status_uses_status_line() {
        let env: ResponseEnvelope<SessionData> = decode_response(Ok(
            HttpResponse::new(502, "<html>bad gateway</html>")
                .with_reason("Bad Gateway"),
        ));
        assert_eq!(env.status_code, 502);
        assert_eq!(env.error_message(), Some("HTTP 502 Bad Gateway"));
    }

    #[test]
    fn test_payload_of_wrong_shape_is_parse_failure() {
        let env: ResponseEnvelope<SessionData> =
            decode_response(ok(200, r#"{"statusCode":200,"data":{"id":5}}"#));
        assert!(!env.success);
        assert!(
            env.error_message()
                .unwrap()
                .starts_with("Failed to parse response: ")
        );
    }

    #[test]
    fn test_200_without_data_for_required_payload_fails() {
        let env: ResponseEnvelope<SessionData> =
            decode_response(ok(200, r#"{"statusCode":200}"#));
        assert!(!env.success);
        assert_eq!(env.error_message(), Some(INVALID_RESPONSE));

        let null_data: ResponseEnvelope<SessionData> =
            decode_response(ok(200, r#"{"statusCode":200,"data":null}"#));
        assert!(!null_data.success);
    }

    #[test]
    fn test_200_without_data_for_unit_payload_succeeds() {
        let env: ResponseEnvelope<()> =
            decode_response(ok(200, r#"{"statusCode":200}"#));
        assert!(env.success);
        assert_eq!(env.data, Some(()));
    }

    #[test]
    fn test_204_with_empty_body_succeeds_without_data() {
        let env: ResponseEnvelope<SessionData> = decode_response(ok(204, ""));
        assert!(env.success);
        assert_eq!(env.status_code, 204);
        assert_eq!(env.data, None);
    }

    #[test]
    fn test_into_result_rejects_hollow_success() {
        let env: ResponseEnvelope<SessionData> = ResponseEnvelope::success(204, None);
        let err = env.into_result().unwrap_err();
        assert_eq!(err.message, INVALID_RESPONSE);
    }

    #[test]
    fn test_require_data_downgrades_hollow_success() {
        let env: ResponseEnvelope<String> =
            ResponseEnvelope::success(200, None).require_data();
        assert!(!env.success);
        assert_eq!(env.error_message(), Some(INVALID_RESPONSE));

        let full = ResponseEnvelope::success(200, Some("x".to_string())).require_data();
        assert!(full.success);
    }

    #[test]
    fn test_try_map_failure_becomes_failed_envelope() {
        let env = ResponseEnvelope::success(200, Some("not a number".to_string()));
        let mapped: ResponseEnvelope<u32> = env.try_map(|s| {
            s.parse::<u32>()
                .map_err(|e| ApiError::new(ErrorKind::Decode, e.to_string()))
        });
        assert!(!mapped.success);
        assert_eq!(mapped.status_code, 200);
        assert_eq!(mapped.error.unwrap().kind, ErrorKind::Decode);
    }

    #[test]
    fn test_try_map_keeps_failures() {
        let env: ResponseEnvelope<String> = ResponseEnvelope::failure(
            401,
            ApiError::new(ErrorKind::Protocol, "expired"),
        );
        let mapped: ResponseEnvelope<u32> = env.try_map(|_| Ok(1));
        assert!(!mapped.success);
        assert_eq!(mapped.error_message(), Some("expired"));
    }
}
