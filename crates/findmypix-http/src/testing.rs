//! In-memory collaborators for exercising the request pipeline.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::watch;

use findmypix_core::error::AuthError;
use findmypix_core::{Credential, Error, Result, Session, SessionSource, SessionUser, SignOutSink};

/// A scriptable [`SessionSource`] that counts its calls.
#[derive(Debug)]
pub struct FakeSessions {
    signed_in: AtomicBool,
    token: Mutex<String>,
    rotation: Mutex<Option<(usize, String)>>,
    sign_out_after: Mutex<Option<usize>>,
    fail_credentials: AtomicBool,
    fail_lookups: AtomicBool,
    session_calls: AtomicUsize,
    credential_calls: AtomicUsize,
    lookup_gate: watch::Sender<bool>,
}

impl FakeSessions {
    pub fn signed_in(token: &str) -> Self {
        Self::build(true, token)
    }

    pub fn signed_out() -> Self {
        Self::build(false, "")
    }

    fn build(signed_in: bool, token: &str) -> Self {
        let (lookup_gate, _) = watch::channel(true);
        Self {
            signed_in: AtomicBool::new(signed_in),
            token: Mutex::new(token.to_string()),
            rotation: Mutex::new(None),
            sign_out_after: Mutex::new(None),
            fail_credentials: AtomicBool::new(false),
            fail_lookups: AtomicBool::new(false),
            session_calls: AtomicUsize::new(0),
            credential_calls: AtomicUsize::new(0),
            lookup_gate,
        }
    }

    /// Switch to `token` once more than `lookups` session lookups happened.
    pub fn rotate_token_after(&self, lookups: usize, token: &str) {
        *lock(&self.rotation) = Some((lookups, token.to_string()));
    }

    /// End the session once more than `lookups` session lookups happened.
    pub fn sign_out_after(&self, lookups: usize) {
        *lock(&self.sign_out_after) = Some(lookups);
    }

    pub fn set_signed_in(&self, signed_in: bool) {
        self.signed_in.store(signed_in, Ordering::SeqCst);
    }

    pub fn fail_credentials(&self, fail: bool) {
        self.fail_credentials.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Suspend every session lookup until [`open_lookups`](Self::open_lookups).
    pub fn hold_lookups(&self) {
        self.lookup_gate.send_replace(false);
    }

    pub fn open_lookups(&self) {
        self.lookup_gate.send_replace(true);
    }

    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    pub fn credential_calls(&self) -> usize {
        self.credential_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionSource for FakeSessions {
    async fn current_session(&self) -> Result<Option<Session>> {
        let lookups = self.session_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let mut gate = self.lookup_gate.subscribe();
        // The sender lives in self, so the channel cannot close here.
        let _ = gate.wait_for(|open| *open).await;

        if let Some((after, token)) = lock(&self.rotation).as_ref() {
            if lookups > *after {
                *lock(&self.token) = token.clone();
            }
        }
        if let Some(after) = *lock(&self.sign_out_after) {
            if lookups > after {
                self.signed_in.store(false, Ordering::SeqCst);
            }
        }

        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::session("identity provider unreachable"));
        }
        if !self.signed_in.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(Session::new(SessionUser {
            id: Some("user-1".to_string()),
            name: Some("Test User".to_string()),
            email: None,
        })))
    }

    async fn bearer_credential(&self) -> Result<Credential> {
        self.credential_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_credentials.load(Ordering::SeqCst) {
            return Err(AuthError::CredentialUnavailable {
                reason: "token endpoint returned 401".to_string(),
            }
            .into());
        }
        Ok(Credential::new(lock(&self.token).clone()))
    }
}

/// A [`SignOutSink`] that counts terminations.
#[derive(Debug, Default)]
pub struct FakeSignOut {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeSignOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignOutSink for FakeSignOut {
    async fn terminate(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::session("sign-out failed"));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
