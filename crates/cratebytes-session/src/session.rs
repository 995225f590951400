//! Session types: the client-side view of one gameplay session.

use std::time::Duration;

use cratebytes_protocol::SessionData;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timing for session supervision.
///
/// The server ends a session that hasn't sent a heartbeat within
/// `session_timeout`, so the heartbeat interval must stay well inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between heartbeats once armed. Zero disables the heartbeat.
    pub heartbeat_interval: Duration,

    /// The server-side inactivity timeout. Only used to bound
    /// `heartbeat_interval`.
    pub session_timeout: Duration,

    /// Upper bound of the random delay added to the first heartbeat.
    pub heartbeat_jitter: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(60),
            session_timeout: Duration::from_secs(300),
            heartbeat_jitter: Duration::from_secs(2),
        }
    }
}

impl SessionConfig {
    /// Clamps the heartbeat interval to half the session timeout, so one
    /// lost heartbeat never ends the session.
    pub fn validated(mut self) -> Self {
        let ceiling = self.session_timeout / 2;
        if !ceiling.is_zero() && self.heartbeat_interval > ceiling {
            tracing::warn!(
                interval_secs = self.heartbeat_interval.as_secs_f64(),
                timeout_secs = self.session_timeout.as_secs_f64(),
                "heartbeat interval exceeds half the session timeout; clamping"
            );
            self.heartbeat_interval = ceiling;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Whether a gameplay session is running.
///
/// ```text
///   Inactive ──(start ok)──→ Active ──(stop / heartbeat failure)──→ Inactive
///                              │ ↑
///                              └─┘ (heartbeat ok: data refreshed)
/// ```
///
/// The data lives inside the `Active` variant, so "active without data"
/// can't be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Inactive,
    Active(SessionData),
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }

    /// The current session's data, if active.
    pub fn session(&self) -> Option<&SessionData> {
        match self {
            SessionState::Active(data) => Some(data),
            SessionState::Inactive => None,
        }
    }
}
