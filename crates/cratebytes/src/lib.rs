//! # CrateBytes
//!
//! Client SDK for the CrateBytes game backend: player login, gameplay
//! sessions with a heartbeat, leaderboards, and per-player metadata.
//!
//! Build one [`CrateBytes`] context, log in, start a session, arm the
//! heartbeat. Every call returns a [`ResponseEnvelope`]: network and
//! server failures are failed envelopes, never panics or `Err`s. `Err`
//! is reserved for misuse such as calling a game endpoint before logging
//! in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cratebytes::prelude::*;
//!
//! # async fn run() -> Result<(), CrateBytesError> {
//! let sdk = CrateBytes::builder().public_key("pk_live_123").build()?;
//!
//! let login = sdk.auth().guest_login(None).await?;
//! if !login.success {
//!     eprintln!("login failed: {:?}", login.error_message());
//!     return Ok(());
//! }
//!
//! if sdk.start_session().await?.success {
//!     sdk.start_heartbeat();
//! }
//!
//! let page = sdk.leaderboard().get_leaderboard("weekly", 1).await?;
//! for entry in page.data.map(|p| p.entries).unwrap_or_default() {
//!     println!("{} {}", entry.player.player_id, entry.score);
//! }
//!
//! sdk.stop_session().await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod config;
mod error;
mod leaderboard;
mod logging;
mod metadata;
mod sdk;

pub use auth::AuthService;
pub use config::{ConfigError, DEFAULT_BASE_URL, SdkConfig};
pub use error::CrateBytesError;
pub use leaderboard::LeaderboardService;
pub use logging::{DEFAULT_LOG_FILTER, init_logging};
pub use metadata::MetadataService;
pub use sdk::{CrateBytes, CrateBytesBuilder};

pub use cratebytes_protocol::{
    ApiError, AuthData, ErrorKind, LeaderboardEntry, LeaderboardPage, PlayerId,
    ResponseEnvelope, ScoreSubmission, SessionData, SessionId,
};
pub use cratebytes_session::{
    FileStore, HeartbeatExit, HeartbeatHandle, KeyValueStore, MemoryStore,
    SessionError, SessionState, StoreError,
};
pub use cratebytes_transport::{ReqwestTransport, Transport, TransportError};
#[cfg(feature = "test-util")]
pub use cratebytes_transport::MockTransport;

/// Everything a game typically needs, in one import.
pub mod prelude {
    pub use crate::{
        ApiError, CrateBytes, CrateBytesBuilder, CrateBytesError, ErrorKind,
        FileStore, HeartbeatExit, KeyValueStore, MemoryStore, PlayerId,
        ResponseEnvelope, SdkConfig, SessionError, SessionState,
    };
}
