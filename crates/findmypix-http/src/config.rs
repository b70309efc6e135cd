//! Client configuration.

use std::time::Duration;

use findmypix_core::ApiUrl;

/// Default request timeout. Uploads and face matching run model inference
/// on the backend, so this is generous.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default session cookie set by the identity provider.
pub const DEFAULT_SESSION_COOKIE: &str = "next-auth.session-token";

/// Configuration for [`BackendClient`](crate::BackendClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend service.
    pub api_url: ApiUrl,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Also sign out when a replayed request is rejected again.
    ///
    /// Off by default: a failed replay is terminal for that request only, and
    /// global sign-out follows only a failed refresh.
    pub sign_out_on_failed_replay: bool,
}

impl ClientConfig {
    pub fn new(api_url: ApiUrl) -> Self {
        Self {
            api_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: default_user_agent(),
            sign_out_on_failed_replay: false,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_sign_out_on_failed_replay(mut self, enabled: bool) -> Self {
        self.sign_out_on_failed_replay = enabled;
        self
    }
}

/// Configuration for [`IdentityProvider`](crate::IdentityProvider).
#[derive(Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity provider.
    pub url: ApiUrl,
    pub cookie_name: String,
    pub cookie_value: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl IdentityConfig {
    pub fn new(url: ApiUrl, cookie_value: impl Into<String>) -> Self {
        Self {
            url,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            cookie_value: cookie_value.into(),
            request_timeout: Duration::from_secs(30),
            user_agent: default_user_agent(),
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }
}

// Custom Debug impl that hides the session cookie
impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_value", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn default_user_agent() -> String {
    concat!("findmypix/", env!("CARGO_PKG_VERSION")).to_string()
}
