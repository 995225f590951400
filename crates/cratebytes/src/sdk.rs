//! `CrateBytes` context object and its builder.
//!
//! This is the entry point of the SDK. It ties the layers together:
//! transport → protocol → session → services.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cratebytes_protocol::{ResponseEnvelope, SessionData};
use cratebytes_session::{
    ApiClient, HeartbeatHandle, KeyValueStore, MemoryStore, SessionError,
    SessionSupervisor, StoreError, TokenHolder,
};
use cratebytes_transport::{ReqwestTransport, Transport};

use crate::{
    AuthService, CrateBytesError, LeaderboardService, MetadataService, SdkConfig,
    init_logging,
};

/// Builder for a [`CrateBytes`] context.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use cratebytes::prelude::*;
///
/// # fn main() -> Result<(), CrateBytesError> {
/// let sdk = CrateBytes::builder()
///     .public_key("pk_live_123")
///     .store(Arc::new(FileStore::open("cratebytes-auth.json")?))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct CrateBytesBuilder {
    config: SdkConfig,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl CrateBytesBuilder {
    /// Creates a builder with default settings and no public key.
    pub fn new() -> Self {
        Self {
            config: SdkConfig::default(),
            store: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: SdkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn public_key(mut self, public_key: impl Into<String>) -> Self {
        self.config.public_key = public_key.into();
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Where saved credentials live. Defaults to a [`MemoryStore`], which
    /// forgets them when the process exits.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the SDK over the default `reqwest` transport.
    ///
    /// # Errors
    /// - [`CrateBytesError::Config`] if the base URL or public key is
    ///   missing.
    /// - [`CrateBytesError::Transport`] if the HTTP client can't be built.
    pub fn build(self) -> Result<CrateBytes<ReqwestTransport>, CrateBytesError> {
        self.config.validate()?;
        let transport = ReqwestTransport::new(self.config.request_timeout)?;
        self.build_with(transport)
    }

    /// Builds the SDK over a caller-supplied transport.
    ///
    /// Saved credentials are loaded from the store here, without
    /// contacting the server.
    ///
    /// # Errors
    /// [`CrateBytesError::Config`] if the base URL or public key is
    /// missing.
    pub fn build_with<T: Transport>(
        self,
        transport: T,
    ) -> Result<CrateBytes<T>, CrateBytesError> {
        let config = self.config;
        config.validate()?;
        init_logging(&config);

        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let tokens = Arc::new(TokenHolder::new(store));
        let restored = tokens.load_persisted();

        let client = Arc::new(ApiClient::new(
            transport,
            config.base_url.clone(),
            Arc::clone(&tokens),
        ));
        let session = Arc::new(SessionSupervisor::new(
            Arc::clone(&client),
            config.session_config(),
        ));

        tracing::info!(
            base_url = client.base_url(),
            restored_login = restored,
            "CrateBytes SDK initialized"
        );

        Ok(CrateBytes {
            auth: AuthService::new(Arc::clone(&client), config.public_key.clone()),
            leaderboard: LeaderboardService::new(Arc::clone(&client)),
            metadata: MetadataService::new(Arc::clone(&client)),
            heartbeat: Mutex::new(None),
            config,
            client,
            session,
        })
    }
}

impl Default for CrateBytesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One configured CrateBytes SDK instance.
///
/// Owns the token, the session, and the heartbeat. There's no global
/// instance: build one and share it by reference. Dropping it disarms a
/// running heartbeat.
pub struct CrateBytes<T = ReqwestTransport> {
    config: SdkConfig,
    client: Arc<ApiClient<T>>,
    session: Arc<SessionSupervisor<T>>,
    auth: AuthService<T>,
    leaderboard: LeaderboardService<T>,
    metadata: MetadataService<T>,
    heartbeat: Mutex<Option<HeartbeatHandle>>,
}

impl CrateBytes<ReqwestTransport> {
    /// Creates a new builder.
    pub fn builder() -> CrateBytesBuilder {
        CrateBytesBuilder::new()
    }
}

impl<T: Transport> CrateBytes<T> {
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthService<T> {
        &self.auth
    }

    pub fn leaderboard(&self) -> &LeaderboardService<T> {
        &self.leaderboard
    }

    pub fn metadata(&self) -> &MetadataService<T> {
        &self.metadata
    }

    /// The session supervisor, for direct control (e.g. arming a
    /// heartbeat whose exit you want to await).
    pub fn session(&self) -> &Arc<SessionSupervisor<T>> {
        &self.session
    }

    /// The shared request dispatcher.
    pub fn client(&self) -> &Arc<ApiClient<T>> {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.tokens().is_authenticated()
    }

    /// Starts a gameplay session. The heartbeat is not armed; call
    /// [`start_heartbeat`](Self::start_heartbeat) once this succeeds.
    ///
    /// # Errors
    /// See [`SessionSupervisor::start`].
    pub async fn start_session(
        &self,
    ) -> Result<ResponseEnvelope<SessionData>, SessionError> {
        self.session.start().await
    }

    /// Disarms the heartbeat and stops the session.
    ///
    /// # Errors
    /// See [`SessionSupervisor::stop`].
    pub async fn stop_session(
        &self,
    ) -> Result<ResponseEnvelope<SessionData>, SessionError> {
        self.stop_heartbeat();
        self.session.stop().await
    }

    /// Arms the repeating heartbeat, replacing (and disarming) any
    /// previous one.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn start_heartbeat(&self) {
        let handle = self.session.arm_heartbeat();
        if self.heartbeat_slot().replace(handle).is_some() {
            tracing::debug!("replaced running heartbeat");
        }
    }

    /// Disarms the heartbeat, if one is armed.
    pub fn stop_heartbeat(&self) {
        if let Some(handle) = self.heartbeat_slot().take() {
            handle.disarm();
        }
    }

    /// Whether an armed heartbeat is still running.
    pub fn is_heartbeat_running(&self) -> bool {
        self.heartbeat_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Logs out: disarms the heartbeat, ends the session locally, and
    /// forgets the saved credentials.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the store could not be flushed.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.stop_heartbeat();
        self.session.force_stop();
        self.auth.logout()
    }

    fn heartbeat_slot(&self) -> MutexGuard<'_, Option<HeartbeatHandle>> {
        self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> std::fmt::Debug for CrateBytes<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrateBytes")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.client.tokens().is_authenticated())
            .finish_non_exhaustive()
    }
}
