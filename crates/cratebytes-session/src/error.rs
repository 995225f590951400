//! Error types for the session layer.

use cratebytes_protocol::{ProtocolError, SessionId};

use crate::StoreError;

/// Errors raised by token handling and session supervision.
///
/// These are *precondition* failures: the call could not be attempted.
/// Anything that went wrong on the wire comes back inside a failed
/// [`ResponseEnvelope`](cratebytes_protocol::ResponseEnvelope) instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The call requires a bearer token and none is held.
    #[error("not authenticated: log in before calling this endpoint")]
    NotAuthenticated,

    /// `start` was called while a session is already running.
    /// Stop it first; the server would otherwise see two overlapping
    /// sessions for one player.
    #[error("session {0} is already active")]
    AlreadyActive(SessionId),

    /// The operation needs an active session and there is none.
    #[error("no active session")]
    NotActive,

    /// A token was rejected before being stored (empty token or no
    /// player id attached).
    #[error("invalid auth token: {0}")]
    InvalidToken(&'static str),

    /// The persistent key-value store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A request body could not be serialized.
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}
