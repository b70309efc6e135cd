//! Sign-out handling for the CLI.

use async_trait::async_trait;

use findmypix_core::error::AuthError;
use findmypix_core::{Credential, Error, Result, Session, SessionSource, SignOutSink};

use super::storage;
use crate::output;

/// Removes the stored session when the backend no longer accepts it.
#[derive(Debug, Default)]
pub struct ExpireStoredSession;

#[async_trait]
impl SignOutSink for ExpireStoredSession {
    async fn terminate(&self) -> Result<()> {
        storage::clear_session().map_err(|e| Error::session(format!("{:#}", e)))?;
        output::error("Session expired. Run 'findmypix login' to sign in again.");
        Ok(())
    }
}

/// Session source and sink for commands run without a stored session.
#[derive(Debug, Default)]
pub struct SignedOut;

#[async_trait]
impl SessionSource for SignedOut {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(None)
    }

    async fn bearer_credential(&self) -> Result<Credential> {
        Err(AuthError::CredentialUnavailable {
            reason: "not signed in".to_string(),
        }
        .into())
    }
}

#[async_trait]
impl SignOutSink for SignedOut {
    async fn terminate(&self) -> Result<()> {
        Ok(())
    }
}
