//! Single-flight recovery from authorization failures.
//!
//! The first request to fail with an expired credential becomes the leader
//! and performs one session lookup. Requests failing while that lookup runs
//! queue behind it as [`PendingWaiter`]s and are released with its outcome.
//! A recovered session means every queued request is replayed once; a
//! missing session means all of them are rejected and the user is signed
//! out exactly once.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use findmypix_core::{Error, Result, SessionSource, SignOutSink};

use crate::request::OutboundRequest;

/// Result of a recovery attempt, broadcast to every queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A session still exists; replay with a fresh credential.
    Recovered,
    /// No session could be recovered; reject as unauthorized.
    Failed,
}

/// Deferred completion for a request queued behind a running recovery.
#[derive(Debug)]
pub struct PendingWaiter {
    sender: oneshot::Sender<RefreshOutcome>,
}

impl PendingWaiter {
    fn new() -> (Self, oneshot::Receiver<RefreshOutcome>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Consumes the waiter. A dropped receiver makes this a no-op.
    fn release(self, outcome: RefreshOutcome) {
        let _ = self.sender.send(outcome);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Refreshing,
}

/// Refresh phase plus the requests waiting on it.
///
/// `waiters` is only non-empty while the phase is `Refreshing`.
#[derive(Debug)]
pub struct RefreshState {
    phase: Phase,
    waiters: Vec<PendingWaiter>,
}

impl RefreshState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            waiters: Vec::new(),
        }
    }

    /// Return to idle, handing back every queued waiter.
    fn drain(&mut self) -> Vec<PendingWaiter> {
        self.phase = Phase::Idle;
        std::mem::take(&mut self.waiters)
    }
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
}

/// Coordinates recovery for all requests issued through one client.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    sessions: Arc<dyn SessionSource>,
    sign_out: Arc<dyn SignOutSink>,
    sign_out_on_failed_replay: bool,
}

impl RefreshCoordinator {
    pub fn new(sessions: Arc<dyn SessionSource>, sign_out: Arc<dyn SignOutSink>) -> Self {
        Self {
            state: Mutex::new(RefreshState::new()),
            sessions,
            sign_out,
            sign_out_on_failed_replay: false,
        }
    }

    /// Also sign out when a replayed request is rejected again.
    pub fn with_sign_out_on_failed_replay(mut self, enabled: bool) -> Self {
        self.sign_out_on_failed_replay = enabled;
        self
    }

    /// Returns true while a recovery attempt is running.
    pub fn is_refreshing(&self) -> bool {
        self.lock().phase == Phase::Refreshing
    }

    /// Number of requests queued behind the running recovery.
    pub fn pending_waiters(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Handle a failed request.
    ///
    /// Errors other than an expired authorization are returned unchanged. An
    /// expired authorization on a request that was already replayed is
    /// terminal. Otherwise the request joins (or leads) a recovery and, if the
    /// session survives, `replay` is called once with the request marked as
    /// retried.
    #[instrument(skip_all, fields(method = %request.method(), path = request.path()))]
    pub async fn recover<T, F, Fut>(
        &self,
        request: OutboundRequest,
        error: Error,
        replay: F,
    ) -> Result<T>
    where
        F: FnOnce(OutboundRequest) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !error.is_authorization_expired() {
            return Err(error);
        }
        if request.is_retried() {
            return Err(self.reject_replay(error).await);
        }

        let outcome = loop {
            match self.enter() {
                Role::Leader => break self.lead().await,
                Role::Follower(receiver) => {
                    debug!("Recovery in progress, waiting");
                    match receiver.await {
                        Ok(outcome) => break outcome,
                        // Leader was dropped before finishing.
                        Err(_) => {
                            warn!("Recovery abandoned, retrying election");
                            continue;
                        }
                    }
                }
            }
        };

        match outcome {
            RefreshOutcome::Recovered => {
                debug!("Replaying request");
                match replay(request.into_retried()).await {
                    Err(e) if e.is_authorization_expired() => Err(self.reject_replay(e).await),
                    other => other,
                }
            }
            RefreshOutcome::Failed => Err(error.into_unauthorized()),
        }
    }

    fn enter(&self) -> Role {
        let mut state = self.lock();
        match state.phase {
            Phase::Idle => {
                state.phase = Phase::Refreshing;
                Role::Leader
            }
            Phase::Refreshing => {
                let (waiter, receiver) = PendingWaiter::new();
                state.waiters.push(waiter);
                Role::Follower(receiver)
            }
        }
    }

    async fn lead(&self) -> RefreshOutcome {
        let leadership = Leadership::new(self);
        info!("Authorization expired, checking session");

        let outcome = match self.sessions.current_session().await {
            Ok(Some(_)) => RefreshOutcome::Recovered,
            Ok(None) => RefreshOutcome::Failed,
            Err(e) => {
                warn!(error = %e, "Session lookup failed during recovery");
                RefreshOutcome::Failed
            }
        };

        let waiters = leadership.finish();
        debug!(waiters = waiters.len(), ?outcome, "Releasing queued requests");
        for waiter in waiters {
            waiter.release(outcome);
        }

        if outcome == RefreshOutcome::Failed {
            info!("Session is gone, signing out");
            self.terminate().await;
        }
        outcome
    }

    async fn reject_replay(&self, error: Error) -> Error {
        warn!("Replayed request was rejected again");
        if self.sign_out_on_failed_replay {
            self.terminate().await;
        }
        error.into_unauthorized()
    }

    async fn terminate(&self) {
        if let Err(e) = self.sign_out.terminate().await {
            warn!(error = %e, "Sign-out failed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &*self.lock())
            .field("sign_out_on_failed_replay", &self.sign_out_on_failed_replay)
            .finish_non_exhaustive()
    }
}

/// Held by the leader for the duration of the session lookup.
///
/// Dropping it unfinished resets the state and drops every waiter's sender,
/// which wakes the waiters so one of them takes over.
struct Leadership<'a> {
    coordinator: &'a RefreshCoordinator,
    finished: bool,
}

impl<'a> Leadership<'a> {
    fn new(coordinator: &'a RefreshCoordinator) -> Self {
        Self {
            coordinator,
            finished: false,
        }
    }

    fn finish(mut self) -> Vec<PendingWaiter> {
        self.finished = true;
        self.coordinator.lock().drain()
    }
}

impl Drop for Leadership<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let abandoned = self.coordinator.lock().drain();
            warn!(waiters = abandoned.len(), "Recovery leader dropped");
        }
    }
}
