//! Codec trait and the JSON implementation.
//!
//! A "codec" converts between Rust types and the text that travels in
//! request and response bodies. The CrateBytes API only speaks JSON, but
//! keeping the conversion behind a trait means request dispatch never
//! calls `serde_json` directly, and tests can swap in a codec that fails
//! on purpose.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to body text and decode it back.
///
/// ## Trait bounds
///
/// - `Send + Sync + 'static` → the codec is stored in the shared API
///   client and used from the heartbeat task.
/// - `decode<T: DeserializeOwned>` → the result owns its data, so the
///   response body can be dropped right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into body text.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails
    /// (e.g., a map with non-string keys).
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes body text back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed,
    /// incomplete, or doesn't match the expected type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use cratebytes_protocol::{Codec, JsonCodec, ScoreSubmitRequest};
///
/// let codec = JsonCodec;
/// let text = codec.encode(&ScoreSubmitRequest { score: "1200".into() }).unwrap();
/// assert_eq!(text, r#"{"score":"1200"}"#);
///
/// let back: ScoreSubmitRequest = codec.decode(&text).unwrap();
/// assert_eq!(back.score, "1200");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_encode_empty_object() {
        let body = serde_json::json!({});
        assert_eq!(JsonCodec.encode(&body).unwrap(), "{}");
    }

    #[test]
    fn test_decode_malformed_is_decode_error() {
        let err = JsonCodec.decode::<BTreeMap<String, u32>>("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(err.to_string().starts_with("decode failed"));
    }

    #[test]
    fn test_encode_non_string_keys_is_encode_error() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1u8);
        let err = JsonCodec.encode(&map).unwrap_err();
        assert!(matches!(err, ProtocolError::Encode(_)));
    }
}
