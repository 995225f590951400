//! Player login and saved credentials.

use std::sync::Arc;

use cratebytes_protocol::{
    ApiError, AuthData, ErrorKind, GuestLoginRequest, PlayerId, ResponseEnvelope,
    SteamLoginRequest, endpoints,
};
use cratebytes_session::{ApiClient, SessionError, StoreError, TokenHolder};
use cratebytes_transport::Transport;

/// Guest and Steam login, logout, and the saved-credential queries.
///
/// A successful login installs the returned token in the SDK's
/// [`TokenHolder`] and persists it; every later call is authenticated
/// with it.
pub struct AuthService<T> {
    client: Arc<ApiClient<T>>,
    public_key: String,
}

impl<T: Transport> AuthService<T> {
    pub(crate) fn new(client: Arc<ApiClient<T>>, public_key: String) -> Self {
        Self { client, public_key }
    }

    fn tokens(&self) -> &TokenHolder {
        self.client.tokens()
    }

    /// Logs in as a guest (`POST /auth/guest`).
    ///
    /// With `player_id` of `None` (or empty) the saved player id is
    /// reused, so a returning player keeps their identity; with no saved
    /// id either, the server creates a new guest.
    ///
    /// # Errors
    /// Only [`SessionError::Encode`]; login failures are failed envelopes.
    pub async fn guest_login(
        &self,
        player_id: Option<&str>,
    ) -> Result<ResponseEnvelope<AuthData>, SessionError> {
        let player_id = player_id
            .filter(|id| !id.is_empty())
            .map(PlayerId::new)
            .or_else(|| self.tokens().saved_player_id());
        tracing::debug!(returning = player_id.is_some(), "guest login");

        let body = GuestLoginRequest {
            public_key: self.public_key.clone(),
            player_id,
        };
        let envelope = self
            .client
            .post_public(endpoints::GUEST_LOGIN, &body)
            .await?
            .require_data();
        Ok(self.adopt(envelope))
    }

    /// Logs in with a Steam session ticket (`POST /auth/steam`).
    ///
    /// # Errors
    /// Only [`SessionError::Encode`].
    pub async fn steam_login(
        &self,
        steam_auth_ticket: &str,
    ) -> Result<ResponseEnvelope<AuthData>, SessionError> {
        let body = SteamLoginRequest {
            public_key: self.public_key.clone(),
            steam_auth_ticket: steam_auth_ticket.to_owned(),
        };
        let envelope = self
            .client
            .post_public(endpoints::STEAM_LOGIN, &body)
            .await?
            .require_data();
        Ok(self.adopt(envelope))
    }

    /// Installs the token from a successful login. A "successful" login
    /// carrying an unusable token is turned into a failure.
    fn adopt(&self, envelope: ResponseEnvelope<AuthData>) -> ResponseEnvelope<AuthData> {
        let Some(auth) = envelope.data.as_ref().filter(|_| envelope.success) else {
            tracing::warn!(
                status = envelope.status_code,
                error = envelope.error_message().unwrap_or_default(),
                "login failed"
            );
            return envelope;
        };

        match self.tokens().set_token(
            auth.token.clone(),
            auth.player_id.clone(),
            auth.sequential_id,
        ) {
            Ok(()) => envelope,
            Err(SessionError::Store(err)) => {
                // Logged in for this run; the next launch just won't
                // find the saved token.
                tracing::warn!(%err, "logged in but could not save credentials");
                envelope
            }
            Err(err) => ResponseEnvelope::failure(
                envelope.status_code,
                ApiError::new(ErrorKind::Decode, err.to_string()),
            ),
        }
    }

    /// Forgets the token in memory and on disk.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the store could not be flushed; the
    /// in-memory token is cleared regardless.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.tokens().clear_token();
        let result = self.tokens().clear_persisted();
        tracing::info!("logged out");
        result
    }

    /// Re-installs saved credentials, if any. Returns whether the SDK is
    /// now authenticated. No network call is made.
    pub fn try_auto_login(&self) -> bool {
        self.tokens().has_saved_auth() && self.tokens().load_persisted()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().is_authenticated()
    }

    /// The current bearer token.
    pub fn auth_token(&self) -> Option<String> {
        self.tokens().token()
    }

    /// The logged-in player's id.
    pub fn player_id(&self) -> Option<PlayerId> {
        self.tokens().player_id()
    }

    pub fn has_saved_auth(&self) -> bool {
        self.tokens().has_saved_auth()
    }

    pub fn saved_player_id(&self) -> Option<PlayerId> {
        self.tokens().saved_player_id()
    }

    pub fn saved_sequential_id(&self) -> i64 {
        self.tokens().saved_sequential_id()
    }
}
