//! Session source trait.

use async_trait::async_trait;

use crate::{Credential, Result, Session};

/// Supplies the current authenticated session and mints bearer credentials.
///
/// Both operations may perform network or cookie I/O. Implementations own
/// credential freshness; callers never cache a [`Credential`] beyond a single
/// request.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Returns the current session, or `None` when the user is signed out.
    ///
    /// Calling this may refresh the underlying session state.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Mints a bearer credential for the current session.
    async fn bearer_credential(&self) -> Result<Credential>;
}
