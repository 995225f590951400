//! Auth tokens and gameplay sessions for the CrateBytes SDK.
//!
//! This crate holds the client-side state that outlives a single request:
//!
//! 1. **Credentials**: the bearer token ([`TokenHolder`]) and its
//!    persisted copy ([`KeyValueStore`], [`FileStore`], [`MemoryStore`])
//! 2. **Dispatch**: [`ApiClient`], which attaches the token to every call
//! 3. **Sessions**: [`SessionSupervisor`], the start/heartbeat/stop
//!    lifecycle and the armable repeating heartbeat ([`HeartbeatHandle`])
//!
//! # How it fits in the stack
//!
//! ```text
//! SDK facade (above)  ← login, leaderboards, metadata built on ApiClient
//!     ↕
//! Session layer (this crate)  ← token, session state, heartbeat task
//!     ↕
//! Protocol layer (below)  ← wire types, envelope decoding
//! ```

mod auth;
mod client;
mod error;
mod session;
mod store;
mod supervisor;

pub use auth::{AuthToken, TokenHolder, keys};
pub use client::{Access, ApiClient};
pub use error::SessionError;
pub use session::{SessionConfig, SessionState};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use supervisor::{HeartbeatExit, HeartbeatHandle, SessionSupervisor};
