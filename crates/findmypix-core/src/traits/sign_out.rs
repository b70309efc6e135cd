//! Sign-out sink trait.

use async_trait::async_trait;

use crate::Result;

/// Terminates the local session and sends the user to a sign-in surface.
#[async_trait]
pub trait SignOutSink: Send + Sync {
    /// Clear local session state and redirect to sign-in.
    async fn terminate(&self) -> Result<()>;
}
