//! SDK configuration.

use std::path::Path;
use std::time::Duration;

use cratebytes_session::SessionConfig;
use serde::Deserialize;

/// The public CrateBytes backend.
pub const DEFAULT_BASE_URL: &str = "https://api.cratebytes.com/api/game";

/// Errors loading or validating an [`SdkConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required field is empty.
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Everything the SDK needs to talk to one CrateBytes project.
///
/// Read-only once the SDK is built.
///
/// ```rust
/// use std::time::Duration;
/// use cratebytes::SdkConfig;
///
/// let config = SdkConfig::new("pk_live_123")
///     .with_heartbeat_interval(Duration::from_secs(30))
///     .with_logging(true);
/// assert!(config.is_configured());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkConfig {
    /// API root; endpoint paths are appended verbatim.
    pub base_url: String,
    /// The project's public key, sent with every login.
    pub public_key: String,
    /// Time between heartbeats. Clamped to half of `session_timeout`.
    pub heartbeat_interval: Duration,
    /// Server-side session inactivity timeout.
    pub session_timeout: Duration,
    /// Per-request timeout for the default transport.
    pub request_timeout: Duration,
    /// Whether [`init_logging`](crate::init_logging) installs a subscriber.
    pub enable_logging: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            public_key: String::new(),
            heartbeat_interval: Duration::from_secs(60),
            session_timeout: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            enable_logging: false,
        }
    }
}

impl SdkConfig {
    /// Default settings for the given project key.
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// `true` iff both the base URL and the public key are set.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.public_key.trim().is_empty()
    }

    /// Like [`is_configured`](Self::is_configured), naming the first
    /// missing field.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("base_url"));
        }
        if self.public_key.trim().is_empty() {
            return Err(ConfigError::Missing("public_key"));
        }
        Ok(())
    }

    /// Loads settings from a JSON file.
    ///
    /// Every field is optional and falls back to the default. Durations
    /// are whole seconds. The key names of the Unity settings asset
    /// (`domainURL`, `projectKey`) are accepted as aliases.
    ///
    /// ```json
    /// {
    ///   "baseUrl": "https://api.cratebytes.com/api/game",
    ///   "publicKey": "pk_live_123",
    ///   "heartbeatIntervalSecs": 60,
    ///   "sessionTimeoutSecs": 300,
    ///   "requestTimeoutSecs": 30,
    ///   "enableLogging": true
    /// }
    /// ```
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file can't be read, [`ConfigError::Parse`]
    /// if it isn't a JSON object of the shape above.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), configured = config.is_configured(), "loaded sdk settings");
        Ok(config)
    }

    /// Parses settings from JSON text. See
    /// [`from_json_file`](Self::from_json_file) for the format.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let file: SettingsFile = serde_json::from_str(text)?;
        let defaults = Self::default();
        Ok(Self {
            base_url: file.base_url.unwrap_or(defaults.base_url),
            public_key: file.public_key.unwrap_or(defaults.public_key),
            heartbeat_interval: file
                .heartbeat_interval_secs
                .map_or(defaults.heartbeat_interval, Duration::from_secs),
            session_timeout: file
                .session_timeout_secs
                .map_or(defaults.session_timeout, Duration::from_secs),
            request_timeout: file
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            enable_logging: file.enable_logging.unwrap_or(defaults.enable_logging),
        })
    }

    /// The session timing derived from this config.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            heartbeat_interval: self.heartbeat_interval,
            session_timeout: self.session_timeout,
            ..SessionConfig::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SettingsFile {
    #[serde(default, alias = "domainURL")]
    base_url: Option<String>,
    #[serde(default, alias = "projectKey")]
    public_key: Option<String>,
    #[serde(default)]
    heartbeat_interval_secs: Option<u64>,
    #[serde(default)]
    session_timeout_secs: Option<u64>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    enable_logging: Option<bool>,
}
