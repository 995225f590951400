//! Error types for the protocol layer.
//!
//! These are codec-level failures: turning a Rust value into JSON text or
//! back. Failures reported BY the server are not errors at this level;
//! they travel inside a [`ResponseEnvelope`](crate::ResponseEnvelope) as
//! an [`ApiError`](crate::ApiError).

/// Errors that can occur while encoding or decoding wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning JSON into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// wrong data types, or truncated bodies.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
