//! Wire types for the CrateBytes API.
//!
//! Every request body and every `data` payload the SDK exchanges with the
//! server is defined here. Field names are camelCase on the wire
//! (`#[serde(rename_all = "camelCase")]`) and snake_case in Rust.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The server-assigned identifier of a player.
///
/// A newtype over `String` so a player id can't be passed where a session
/// id or a leaderboard id is expected. `#[serde(transparent)]` keeps the
/// wire form a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Wraps a raw player id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty id the server never issues.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The server-assigned identifier of a gameplay session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Body of `POST /auth/guest`.
///
/// `player_id` is omitted entirely when absent; the server then creates a
/// fresh guest player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestLoginRequest {
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
}

/// Body of `POST /auth/steam`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamLoginRequest {
    pub public_key: String,
    pub steam_auth_ticket: String,
}

/// Payload returned by both login endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub token: String,
    pub player_id: PlayerId,
    #[serde(default)]
    pub sequential_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steam_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// The body of the three session calls: an empty JSON object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmptyBody {}

/// The server's record of a gameplay session.
///
/// Returned by `/session/start`, `/session/heartbeat`, and `/session/stop`.
/// `end_time` is only set on the response to a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub id: SessionId,
    pub player_id: PlayerId,
    pub start_time: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Leaderboards
// ---------------------------------------------------------------------------

/// Body of `POST /leaderboard/{id}`.
///
/// Scores travel as strings; the server parses them according to the
/// leaderboard's configured type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmitRequest {
    pub score: String,
}

/// Payload returned by a score submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    #[serde(default)]
    pub message: String,
}

/// Descriptive fields of a leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The player half of a leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPlayer {
    pub player_id: PlayerId,
    #[serde(default)]
    pub guest: bool,
    /// Player metadata attached to the entry, if the leaderboard exposes it.
    #[serde(default)]
    pub entry_data: Option<MetadataPayload>,
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: LeaderboardPlayer,
    #[serde(deserialize_with = "score_from_string_or_number")]
    pub score: String,
}

/// One page of `GET /leaderboard/{id}?page={n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    #[serde(default)]
    pub leaderboard: LeaderboardInfo,
    #[serde(default)]
    pub entries: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub total_entries: u64,
    #[serde(default)]
    pub pages: u32,
}

/// Older deployments send numeric scores; normalize them to the string form.
fn score_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawScore::deserialize(deserializer)? {
        RawScore::Text(s) => s,
        RawScore::Int(i) => i.to_string(),
        RawScore::Float(f) => f.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Body of `POST /metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDataRequest {
    pub data: String,
}

/// The `data` payload of the metadata endpoints.
///
/// The server is inconsistent about nesting: reads return the stored
/// string directly, writes wrap it as `{"data": "..."}`. Both shapes decode
/// here and [`into_string`](Self::into_string) flattens them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataPayload {
    Raw(String),
    Wrapped { data: String },
}

impl MetadataPayload {
    /// The stored metadata string, whichever shape it arrived in.
    pub fn into_string(self) -> String {
        match self {
            MetadataPayload::Raw(s) | MetadataPayload::Wrapped { data: s } => s,
        }
    }

    /// Borrowing form of [`into_string`](Self::into_string).
    pub fn as_str(&self) -> &str {
        match self {
            MetadataPayload::Raw(s) | MetadataPayload::Wrapped { data: s } => s,
        }
    }
}
