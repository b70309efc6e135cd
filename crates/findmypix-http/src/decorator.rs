//! Per-request credential stamping.

use std::sync::Arc;

use tracing::{debug, warn};

use findmypix_core::SessionSource;

use crate::request::OutboundRequest;

/// Attaches a bearer credential to outbound requests when a session exists.
///
/// Decoration never fails: if the session or credential cannot be obtained
/// the request goes out as-is and the backend's 401 is handled by the
/// [`RefreshCoordinator`](crate::RefreshCoordinator).
#[derive(Clone)]
pub struct RequestDecorator {
    sessions: Arc<dyn SessionSource>,
}

impl RequestDecorator {
    pub fn new(sessions: Arc<dyn SessionSource>) -> Self {
        Self { sessions }
    }

    /// Returns a decorated copy of `request`. The original is left untouched
    /// so it can be replayed with a fresh credential.
    pub async fn decorate(&self, request: &OutboundRequest) -> OutboundRequest {
        let mut decorated = request.clone();

        match self.sessions.current_session().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(path = request.path(), "No session, sending unauthenticated");
                return decorated;
            }
            Err(e) => {
                warn!(error = %e, "Session lookup failed, sending unauthenticated");
                return decorated;
            }
        }

        match self.sessions.bearer_credential().await {
            Ok(credential) if credential.is_empty() => {
                warn!("Session returned an empty credential, sending without one");
            }
            Ok(credential) => {
                if let Err(e) = decorated.set_bearer(&credential) {
                    warn!(error = %e, "Credential not usable as a header, sending without one");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to obtain credential, sending without one");
            }
        }

        decorated
    }
}

impl std::fmt::Debug for RequestDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDecorator").finish_non_exhaustive()
    }
}
