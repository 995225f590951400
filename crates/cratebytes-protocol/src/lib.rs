//! Wire protocol for the CrateBytes API.
//!
//! This crate defines the "language" the SDK and the CrateBytes backend
//! speak:
//!
//! - **Types** ([`SessionData`], [`AuthData`], [`LeaderboardPage`], ...):
//!   request bodies and response payloads.
//! - **Envelope** ([`ResponseEnvelope`], [`decode_response`]): the uniform
//!   `{statusCode, error?, data?}` wrapper and its normalization into one
//!   success/failure result.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how bodies are converted
//!   to and from text.
//! - **Endpoints** ([`endpoints`]): the path table.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw HTTP) and the session
//! layer (tokens and session state). It knows nothing about who is logged
//! in; it only knows how bodies are shaped.
//!
//! ```text
//! Transport (HttpResponse) → Protocol (ResponseEnvelope<T>) → Session / services
//! ```

mod codec;
pub mod endpoints;
mod envelope;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use envelope::{
    ApiError, ErrorKind, INVALID_RESPONSE, ResponseEnvelope, decode_response,
    is_success_status,
};
pub use error::ProtocolError;
pub use types::{
    AuthData, EmptyBody, GuestLoginRequest, LeaderboardEntry, LeaderboardInfo,
    LeaderboardPage, LeaderboardPlayer, MetadataPayload, PlayerDataRequest,
    PlayerId, ScoreSubmission, ScoreSubmitRequest, SessionData, SessionId,
    SteamLoginRequest,
};
