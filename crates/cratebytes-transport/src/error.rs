/// Errors that can occur in the transport layer.
///
/// Only two kinds exist because callers only ever need to tell "we never
/// got a response" apart from "we got bytes back that were not valid HTTP".
/// Non-2xx status codes are NOT transport errors; they come back as a
/// normal [`HttpResponse`](crate::HttpResponse).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response was obtained: DNS failure, refused or reset
    /// connection, TLS failure, or the request timed out.
    #[error("connection error: {0}")]
    Connection(String),

    /// A response arrived but could not be read as HTTP (malformed
    /// headers, truncated or non-UTF-8 body, redirect loop).
    #[error("protocol error: {0}")]
    Protocol(String),
}
