//! Transport abstraction layer for the CrateBytes SDK.
//!
//! Provides the [`Transport`] trait that abstracts over how one HTTP
//! request is issued. The SDK never talks to the network directly; it
//! builds an [`HttpRequest`], hands it to a transport, and gets back an
//! [`HttpResponse`] or a [`TransportError`].
//!
//! # Feature Flags
//!
//! - `reqwest` (default): [`ReqwestTransport`] over `reqwest` + rustls
//! - `test-util`: [`MockTransport`], a scripted in-memory transport

#[cfg(feature = "reqwest")]
mod client;
mod error;
#[cfg(any(test, feature = "test-util"))]
mod mock;

#[cfg(feature = "reqwest")]
pub use client::{DEFAULT_REQUEST_TIMEOUT, ReqwestTransport};
pub use error::TransportError;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockTransport;

use std::fmt;
use std::future::Future;

/// Header carrying the bearer token on authenticated requests.
pub const AUTHORIZATION: &str = "Authorization";

/// Header announcing a JSON request body.
pub const CONTENT_TYPE: &str = "Content-Type";

/// The HTTP methods the CrateBytes API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// One outgoing HTTP request.
///
/// Headers are kept as an ordered list of pairs rather than a map: the
/// SDK sets at most two of them, and tests want to assert on exactly
/// what was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON text. `None` for bodiless requests (GET, DELETE).
    pub body: Option<String>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Attaches a JSON body and the matching content type.
    pub fn with_json_body(mut self, body: impl Into<String>) -> Self {
        self.headers
            .push((CONTENT_TYPE.to_string(), "application/json".to_string()));
        self.body = Some(body.into());
        self
    }

    /// Attaches an `Authorization: Bearer <token>` header.
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.headers
            .push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        self
    }

    /// Returns the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the bearer token attached to this request, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.header(AUTHORIZATION)
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// A settled HTTP exchange: any status code, including 4xx/5xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase for `status`, when known.
    pub reason: Option<String>,
    pub body: String,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: None,
            body: body.into(),
        }
    }

    /// Sets the reason phrase.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The status line as a human-readable string, e.g. `HTTP 404 Not Found`.
    pub fn status_line(&self) -> String {
        match &self.reason {
            Some(reason) => format!("HTTP {} {}", self.status, reason),
            None => format!("HTTP {}", self.status),
        }
    }
}

/// Issues one HTTP request and returns the settled result.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → a transport is shared by every service
///   of an SDK instance and by the spawned heartbeat task.
/// - The returned future is `Send` so callers can drive it from
///   `tokio::spawn`.
///
/// Implementations must not retry and must report a timeout as
/// [`TransportError::Connection`].
pub trait Transport: Send + Sync + 'static {
    /// Sends `request` and waits for the response.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
