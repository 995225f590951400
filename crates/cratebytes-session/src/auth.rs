//! Bearer token holding and persistence.
//!
//! The SDK authenticates every game call with a bearer token obtained
//! from a login. [`TokenHolder`] is the single place that token lives:
//! the API client reads it fresh for each request, the auth service
//! writes it after a login, and the persistent store keeps a copy so the
//! next launch can skip the login round-trip.

use std::sync::Arc;

use cratebytes_protocol::PlayerId;
use tokio::sync::watch;

use crate::{KeyValueStore, SessionError, StoreError};

/// Store keys used for saved credentials.
///
/// The names match what existing CrateBytes game clients write, so a
/// store shared with them keeps working.
pub mod keys {
    pub const PLAYER_ID: &str = "CrateBytes_PlayerId";
    pub const AUTH_TOKEN: &str = "CrateBytes_AuthToken";
    pub const SEQUENTIAL_ID: &str = "CrateBytes_SequentialId";
}

/// A bearer token together with the identity it was issued for.
///
/// Can only be built through [`AuthToken::new`], which enforces that a
/// token never exists without its player id.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    token: String,
    player_id: PlayerId,
    sequential_id: i64,
}

impl AuthToken {
    /// # Errors
    /// Returns [`SessionError::InvalidToken`] if `token` or `player_id`
    /// is empty.
    pub fn new(
        token: impl Into<String>,
        player_id: PlayerId,
        sequential_id: i64,
    ) -> Result<Self, SessionError> {
        let token = token.into();
        if token.is_empty() {
            return Err(SessionError::InvalidToken("empty token"));
        }
        if player_id.is_empty() {
            return Err(SessionError::InvalidToken("token has no player id"));
        }
        Ok(Self {
            token,
            player_id,
            sequential_id,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn sequential_id(&self) -> i64 {
        self.sequential_id
    }
}

// Never print the secret.
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"<redacted>")
            .field("player_id", &self.player_id)
            .field("sequential_id", &self.sequential_id)
            .finish()
    }
}

/// Holds the current [`AuthToken`] and mirrors it into a [`KeyValueStore`].
///
/// The current value sits in a `watch` channel: reads are synchronous
/// and lock-free from the caller's point of view, and other tasks can
/// [`subscribe`](Self::subscribe) to log-in/log-out transitions.
pub struct TokenHolder {
    current: watch::Sender<Option<AuthToken>>,
    store: Arc<dyn KeyValueStore>,
}

impl TokenHolder {
    /// Creates an unauthenticated holder backed by `store`. Nothing is
    /// read from the store until [`load_persisted`](Self::load_persisted).
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            current: watch::Sender::new(None),
            store,
        }
    }

    /// Validates and installs a token, then persists it.
    ///
    /// The in-memory token is replaced even if persisting fails; the
    /// error only reports that the next launch won't see it.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`] if the token is empty or has no
    ///   player id. The held token is left untouched.
    /// - [`SessionError::Store`] if the store could not be flushed.
    pub fn set_token(
        &self,
        token: impl Into<String>,
        player_id: PlayerId,
        sequential_id: i64,
    ) -> Result<(), SessionError> {
        let token = AuthToken::new(token, player_id, sequential_id)?;
        tracing::info!(player_id = %token.player_id, sequential_id, "auth token set");
        self.current.send_replace(Some(token));
        self.persist()?;
        Ok(())
    }

    /// Forgets the in-memory token. The persisted copy is kept; see
    /// [`clear_persisted`](Self::clear_persisted).
    pub fn clear_token(&self) {
        if self.current.send_replace(None).is_some() {
            tracing::info!("auth token cleared");
        }
    }

    /// The raw bearer string, if authenticated.
    pub fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|t| t.token.clone())
    }

    pub fn current(&self) -> Option<AuthToken> {
        self.current.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// The player id of the held token.
    pub fn player_id(&self) -> Option<PlayerId> {
        self.current.borrow().as_ref().map(|t| t.player_id.clone())
    }

    /// Watches log-in/log-out transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthToken>> {
        self.current.subscribe()
    }

    /// Installs the persisted token, if the store holds a complete one.
    ///
    /// Returns `true` when a token was loaded. The token is trusted
    /// as-is; an expired one surfaces as a 401 on the first call.
    pub fn load_persisted(&self) -> bool {
        let Some(token) = self.store.get_string(keys::AUTH_TOKEN) else {
            return false;
        };
        let Some(player_id) = self.saved_player_id() else {
            return false;
        };
        match AuthToken::new(token, player_id, self.saved_sequential_id()) {
            Ok(token) => {
                tracing::info!(player_id = %token.player_id, "loaded saved auth token");
                self.current.send_replace(Some(token));
                true
            }
            Err(err) => {
                tracing::debug!(%err, "ignoring incomplete saved auth");
                false
            }
        }
    }

    /// Writes the held token to the store and flushes it. Does nothing
    /// when unauthenticated.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the flush fails.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(token) = self.current() else {
            return Ok(());
        };
        self.store.set_string(keys::PLAYER_ID, token.player_id.as_str());
        self.store.set_string(keys::AUTH_TOKEN, &token.token);
        self.store.set_int(keys::SEQUENTIAL_ID, token.sequential_id);
        self.store.flush()
    }

    /// Deletes all saved credentials.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the flush fails.
    pub fn clear_persisted(&self) -> Result<(), StoreError> {
        self.store.delete(keys::PLAYER_ID);
        self.store.delete(keys::AUTH_TOKEN);
        self.store.delete(keys::SEQUENTIAL_ID);
        self.store.flush()
    }

    pub fn saved_player_id(&self) -> Option<PlayerId> {
        self.store
            .get_string(keys::PLAYER_ID)
            .filter(|id| !id.is_empty())
            .map(PlayerId)
    }

    /// The saved sequential id, or 0 when none is saved.
    pub fn saved_sequential_id(&self) -> i64 {
        self.store.get_int(keys::SEQUENTIAL_ID).unwrap_or(0)
    }

    /// Whether the store holds both a player id and a token.
    pub fn has_saved_auth(&self) -> bool {
        self.saved_player_id().is_some()
            && self
                .store
                .get_string(keys::AUTH_TOKEN)
                .is_some_and(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn holder() -> (TokenHolder, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (TokenHolder::new(store.clone()), store)
    }

    #[test]
    fn test_auth_token_requires_player_id() {
        let err = AuthToken::new("tok", PlayerId::default(), 0).unwrap_err();
        assert!(matches!(err, SessionError::InvalidToken(_)));
    }

    #[test]
    fn test_auth_token_debug_redacts_secret() {
        let token = AuthToken::new("s3cret", PlayerId::new("p1"), 1).unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("p1"));
    }

    #[test]
    fn test_set_token_authenticates_and_persists() {
        let (holder, store) = holder();
        assert!(!holder.is_authenticated());

        holder.set_token("tok", PlayerId::new("p1"), 9).unwrap();

        assert!(holder.is_authenticated());
        assert_eq!(holder.token().as_deref(), Some("tok"));
        assert_eq!(store.get_string(keys::PLAYER_ID).as_deref(), Some("p1"));
        assert_eq!(store.get_string(keys::AUTH_TOKEN).as_deref(), Some("tok"));
        assert_eq!(store.get_int(keys::SEQUENTIAL_ID), Some(9));
    }

    #[test]
    fn test_set_token_rejects_empty_and_keeps_previous() {
        let (holder, _store) = holder();
        holder.set_token("first", PlayerId::new("p1"), 0).unwrap();

        let err = holder.set_token("", PlayerId::new("p2"), 0).unwrap_err();
        assert!(matches!(err, SessionError::InvalidToken(_)));
        assert_eq!(holder.token().as_deref(), Some("first"));
    }

    #[test]
    fn test_clear_token_keeps_persisted_copy() {
        let (holder, _store) = holder();
        holder.set_token("tok", PlayerId::new("p1"), 0).unwrap();

        holder.clear_token();

        assert!(!holder.is_authenticated());
        assert!(holder.has_saved_auth());
    }

    #[test]
    fn test_clear_persisted_removes_every_key() {
        let (holder, store) = holder();
        holder.set_token("tok", PlayerId::new("p1"), 3).unwrap();

        holder.clear_persisted().unwrap();

        assert!(!holder.has_saved_auth());
        assert!(store.is_empty());
        assert_eq!(holder.saved_sequential_id(), 0);
    }

    #[test]
    fn test_load_persisted_restores_token() {
        let store = Arc::new(MemoryStore::new());
        store.set_string(keys::PLAYER_ID, "p1");
        store.set_string(keys::AUTH_TOKEN, "tok");
        store.set_int(keys::SEQUENTIAL_ID, 5);
        let holder = TokenHolder::new(store);

        assert!(holder.load_persisted());

        let token = holder.current().unwrap();
        assert_eq!(token.token(), "tok");
        assert_eq!(token.player_id(), &PlayerId::new("p1"));
        assert_eq!(token.sequential_id(), 5);
    }

    #[test]
    fn test_load_persisted_ignores_token_without_player() {
        let store = Arc::new(MemoryStore::new());
        store.set_string(keys::AUTH_TOKEN, "tok");
        let holder = TokenHolder::new(store);

        assert!(!holder.load_persisted());
        assert!(!holder.is_authenticated());
        assert!(!holder.has_saved_auth());
    }

    #[test]
    fn test_subscribe_sees_login_and_logout() {
        let (holder, _store) = holder();
        let mut rx = holder.subscribe();

        holder.set_token("tok", PlayerId::new("p1"), 0).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_some());

        holder.clear_token();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }
}
