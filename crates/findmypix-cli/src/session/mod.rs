//! Stored session and client construction.

mod sign_out;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};

use findmypix_core::ApiUrl;
use findmypix_http::{BackendClient, ClientConfig, IdentityConfig, IdentityProvider};

pub use sign_out::{ExpireStoredSession, SignedOut};
pub use storage::StoredSession;

pub const NO_SESSION: &str = "No active session. Run 'findmypix login' first.";

const USER_AGENT: &str = concat!("findmypix-cli/", env!("FINDMYPIX_VERSION"));

impl StoredSession {
    pub fn api_url(&self) -> Result<ApiUrl> {
        ApiUrl::new(&self.api_url).context("Invalid API URL in session")
    }

    pub fn identity_config(&self) -> Result<IdentityConfig> {
        let url = ApiUrl::new(&self.identity_url).context("Invalid identity URL in session")?;
        let mut config = IdentityConfig::new(url, self.cookie_value.clone())
            .with_cookie_name(self.cookie_name.clone());
        config.user_agent = USER_AGENT.to_string();
        Ok(config)
    }
}

/// Build an authenticated client from the stored session.
pub fn connect() -> Result<BackendClient> {
    let stored = storage::load_session()
        .context("Failed to load session")?
        .context(NO_SESSION)?;
    client_for(&stored)
}

/// Build a client for `stored`; a 401 that cannot be recovered removes it.
pub fn client_for(stored: &StoredSession) -> Result<BackendClient> {
    let sessions = IdentityProvider::new(&stored.identity_config()?)
        .context("Failed to configure identity provider")?;
    let config = ClientConfig::new(stored.api_url()?).with_user_agent(USER_AGENT);

    BackendClient::new(config, Arc::new(sessions), Arc::new(ExpireStoredSession))
        .context("Failed to create backend client")
}

/// Use the stored session if there is one, otherwise talk to `api` anonymously.
pub fn connect_or_anonymous(api: &str) -> Result<BackendClient> {
    if let Some(stored) = storage::load_session().context("Failed to load session")? {
        return client_for(&stored);
    }

    let api = ApiUrl::new(api).context("Invalid API URL")?;
    let config = ClientConfig::new(api).with_user_agent(USER_AGENT);
    BackendClient::new(config, Arc::new(SignedOut), Arc::new(SignedOut))
        .context("Failed to create backend client")
}
