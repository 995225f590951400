//! Session lifecycle and the repeating heartbeat.
//!
//! [`SessionSupervisor`] owns the one [`SessionState`] of an SDK instance
//! and is the only thing that changes it. The heartbeat is a spawned task
//! that the caller arms explicitly and controls through a
//! [`HeartbeatHandle`].
//!
//! # Stale results
//!
//! A heartbeat that is in flight while the session is stopped and a new
//! one started must not touch the new session. Every transition bumps an
//! epoch counter; a heartbeat remembers the epoch it was sent in and its
//! result is discarded if the epoch has moved on.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cratebytes_protocol::{
    ApiError, EmptyBody, ErrorKind, ResponseEnvelope, SessionData, endpoints,
};
use cratebytes_tick::{TickConfig, TickPolicy, TickScheduler};
use cratebytes_transport::Transport;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::{ApiClient, SessionConfig, SessionError, SessionState};

/// Drives one player's gameplay session against the server.
pub struct SessionSupervisor<T> {
    client: Arc<ApiClient<T>>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    epoch: AtomicU64,
}

/// What a heartbeat result did to the local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Refreshed,
    Ended,
    Stale,
}

impl<T: Transport> SessionSupervisor<T> {
    /// Creates an inactive supervisor. `config` is
    /// [`validated`](SessionConfig::validated) here.
    pub fn new(client: Arc<ApiClient<T>>, config: SessionConfig) -> Self {
        Self {
            client,
            config: config.validated(),
            state: watch::Sender::new(SessionState::Inactive),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<ApiClient<T>> {
        &self.client
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().is_active()
    }

    pub fn current_session(&self) -> Option<SessionData> {
        self.state.borrow().session().cloned()
    }

    /// Watches state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Starts a session (`POST /session/start`).
    ///
    /// On success the state becomes `Active` before this returns. A
    /// success without session data is reported as a failure and leaves
    /// the state `Inactive`.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyActive`] if a session is running; no
    ///   request is sent.
    /// - [`SessionError::NotAuthenticated`] if no token is held.
    pub async fn start(&self) -> Result<ResponseEnvelope<SessionData>, SessionError> {
        if let Some(active) = self.current_session() {
            return Err(SessionError::AlreadyActive(active.id));
        }

        let envelope: ResponseEnvelope<SessionData> = self
            .client
            .post(endpoints::SESSION_START, &EmptyBody {})
            .await?
            .require_data();

        match envelope.data.as_ref() {
            Some(data) if envelope.success => {
                self.state.send_modify(|state| {
                    self.epoch.fetch_add(1, Ordering::SeqCst);
                    *state = SessionState::Active(data.clone());
                });
                tracing::info!(session_id = %data.id, player_id = %data.player_id, "session started");
            }
            _ => tracing::warn!(
                status = envelope.status_code,
                error = envelope.error_message().unwrap_or_default(),
                "session start failed"
            ),
        }
        Ok(envelope)
    }

    /// Sends one heartbeat (`POST /session/heartbeat`).
    ///
    /// Success refreshes the session data; failure ends the session
    /// locally. Either effect is skipped when the result belongs to a
    /// session that has since been replaced.
    ///
    /// # Errors
    /// - [`SessionError::NotActive`] if there is no session; no request
    ///   is sent.
    /// - [`SessionError::NotAuthenticated`] if no token is held.
    pub async fn heartbeat(&self) -> Result<ResponseEnvelope<SessionData>, SessionError> {
        self.heartbeat_applied().await.map(|(envelope, _)| envelope)
    }

    async fn heartbeat_applied(
        &self,
    ) -> Result<(ResponseEnvelope<SessionData>, Applied), SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }
        let epoch = self.epoch.load(Ordering::SeqCst);

        let envelope: ResponseEnvelope<SessionData> = self
            .client
            .post(endpoints::SESSION_HEARTBEAT, &EmptyBody {})
            .await?
            .require_data();

        let applied = self.apply_heartbeat(epoch, &envelope);
        match applied {
            Applied::Refreshed => tracing::debug!("heartbeat ok"),
            Applied::Ended => tracing::warn!(
                status = envelope.status_code,
                error = envelope.error_message().unwrap_or_default(),
                "heartbeat failed; session ended"
            ),
            Applied::Stale => {
                tracing::debug!("discarding heartbeat result from a replaced session")
            }
        }
        Ok((envelope, applied))
    }

    fn apply_heartbeat(
        &self,
        epoch: u64,
        envelope: &ResponseEnvelope<SessionData>,
    ) -> Applied {
        let mut applied = Applied::Stale;
        // The epoch check runs under the state lock, so it can't race a
        // concurrent start or stop.
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch || !state.is_active() {
                return false;
            }
            match envelope.data.as_ref() {
                Some(data) if envelope.success => {
                    *state = SessionState::Active(data.clone());
                    applied = Applied::Refreshed;
                }
                _ => {
                    self.epoch.fetch_add(1, Ordering::SeqCst);
                    *state = SessionState::Inactive;
                    applied = Applied::Ended;
                }
            }
            true
        });
        applied
    }

    /// Stops the session (`POST /session/stop`).
    ///
    /// The local state becomes `Inactive` before the request is sent and
    /// stays that way whatever the server answers.
    ///
    /// # Errors
    /// - [`SessionError::NotActive`] if there is no session; no request
    ///   is sent.
    /// - [`SessionError::NotAuthenticated`] if no token is held (the
    ///   session is still ended locally).
    pub async fn stop(&self) -> Result<ResponseEnvelope<SessionData>, SessionError> {
        if !self.end_locally("stopped") {
            return Err(SessionError::NotActive);
        }
        let envelope: ResponseEnvelope<SessionData> = self
            .client
            .post(endpoints::SESSION_STOP, &EmptyBody {})
            .await?
            .require_data();
        if !envelope.success {
            tracing::warn!(
                status = envelope.status_code,
                error = envelope.error_message().unwrap_or_default(),
                "session stop was not acknowledged"
            );
        }
        Ok(envelope)
    }

    /// Ends the session locally without telling the server. Idempotent.
    pub fn force_stop(&self) {
        self.end_locally("force stopped");
    }

    /// Returns `true` if a session was active.
    fn end_locally(&self, reason: &'static str) -> bool {
        let mut ended = None;
        self.state.send_if_modified(|state| {
            let SessionState::Active(data) = state else {
                return false;
            };
            ended = Some(data.id.clone());
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::Inactive;
            true
        });
        match ended {
            Some(session_id) => {
                tracing::info!(%session_id, reason, "session ended");
                true
            }
            None => false,
        }
    }

    /// Spawns the repeating heartbeat for the current session.
    ///
    /// The first heartbeat fires one interval (plus jitter) from now. The
    /// task exits on its own when the session ends or a heartbeat fails,
    /// and is disarmed when the returned handle is dropped.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn arm_heartbeat(self: &Arc<Self>) -> HeartbeatHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        tracing::debug!(
            interval_secs = self.config.heartbeat_interval.as_secs_f64(),
            "heartbeat armed"
        );
        let task = tokio::spawn(run_heartbeat(Arc::clone(self), cancel_rx));
        HeartbeatHandle {
            cancel: Some(cancel_tx),
            task: Some(task),
        }
    }
}

// ---------------------------------------------------------------------------
// Heartbeat task
// ---------------------------------------------------------------------------

/// Why a heartbeat task exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatExit {
    /// The handle was disarmed or dropped.
    Disarmed,
    /// A tick found no active session.
    SessionEnded,
    /// A heartbeat failed; the session has been ended locally.
    Failed(ApiError),
}

async fn run_heartbeat<T: Transport>(
    supervisor: Arc<SessionSupervisor<T>>,
    mut cancel: oneshot::Receiver<()>,
) -> HeartbeatExit {
    let config = supervisor.config();
    let mut ticker = TickScheduler::new(TickConfig {
        interval: config.heartbeat_interval,
        policy: TickPolicy::Skip,
        initial_jitter: config.heartbeat_jitter,
    });

    loop {
        // Both selects are biased so a disarm always wins a tie.
        tokio::select! {
            biased;
            _ = &mut cancel => return HeartbeatExit::Disarmed,
            _ = ticker.wait_for_tick() => {}
        }

        if !supervisor.is_active() {
            tracing::debug!("heartbeat stopping: session no longer active");
            return HeartbeatExit::SessionEnded;
        }

        let result = tokio::select! {
            biased;
            _ = &mut cancel => return HeartbeatExit::Disarmed,
            result = supervisor.heartbeat_applied() => result,
        };

        match result {
            Ok((_, Applied::Refreshed)) => {}
            Ok((_, Applied::Stale)) => {
                if !supervisor.is_active() {
                    return HeartbeatExit::SessionEnded;
                }
            }
            Ok((envelope, Applied::Ended)) => {
                let error = envelope.error.unwrap_or_else(ApiError::invalid_response);
                return HeartbeatExit::Failed(error);
            }
            Err(SessionError::NotActive) => return HeartbeatExit::SessionEnded,
            Err(err) => {
                tracing::warn!(%err, "heartbeat could not be sent; ending session");
                supervisor.force_stop();
                return HeartbeatExit::Failed(ApiError::new(
                    ErrorKind::Local,
                    err.to_string(),
                ));
            }
        }
    }
}

/// Controls an armed heartbeat. Dropping it disarms the heartbeat.
#[must_use = "dropping the handle disarms the heartbeat"]
pub struct HeartbeatHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<HeartbeatExit>>,
}

impl HeartbeatHandle {
    /// Stops the heartbeat. An in-flight heartbeat request is abandoned
    /// and its result never applied.
    pub fn disarm(self) {
        tracing::debug!("heartbeat disarmed");
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the task to exit on its own and reports why.
    pub async fn finished(mut self) -> HeartbeatExit {
        let Some(task) = self.task.take() else {
            return HeartbeatExit::Disarmed;
        };
        match task.await {
            Ok(exit) => exit,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => HeartbeatExit::Disarmed,
        }
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
