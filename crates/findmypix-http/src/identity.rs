//! Session source backed by the identity provider's HTTP endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument};

use findmypix_core::error::{AuthError, InvalidInputError, ServerError};
use findmypix_core::{ApiUrl, Credential, Error, Result, Session, SessionSource};

use crate::config::IdentityConfig;
use crate::transport::{read_error_detail, transport_error};

pub(crate) const SESSION_ENDPOINT: &str = "/api/auth/session";
pub(crate) const TOKEN_ENDPOINT: &str = "/api/auth/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Resolves sessions and bearer credentials using a stored session cookie.
///
/// The identity provider owns the session; this type never caches it, so
/// every lookup reflects the provider's current view.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    client: reqwest::Client,
    url: ApiUrl,
}

impl IdentityProvider {
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let cookie = format!("{}={}", config.cookie_name, config.cookie_value);
        let mut cookie = HeaderValue::from_str(&cookie).map_err(|e| InvalidInputError::Header {
            name: COOKIE.to_string(),
            reason: e.to_string(),
        })?;
        cookie.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Returns the identity provider URL.
    pub fn url(&self) -> &ApiUrl {
        &self.url
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.client
            .get(self.url.endpoint(path))
            .send()
            .await
            .map_err(transport_error)
    }
}

#[async_trait]
impl SessionSource for IdentityProvider {
    #[instrument(skip(self), fields(provider = %self.url))]
    async fn current_session(&self) -> Result<Option<Session>> {
        let response = self.get(SESSION_ENDPOINT).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            debug!("Identity provider rejected the session cookie");
            return Ok(None);
        }
        if !status.is_success() {
            let detail = read_error_detail(response).await;
            return Err(Error::session(ServerError::new(status.as_u16(), detail).to_string()));
        }

        let body = response.text().await.map_err(transport_error)?;
        parse_session(&body)
    }

    #[instrument(skip(self), fields(provider = %self.url))]
    async fn bearer_credential(&self) -> Result<Credential> {
        let response = self.get(TOKEN_ENDPOINT).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::CredentialUnavailable {
                reason: "identity provider returned 401".to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let detail = read_error_detail(response).await;
            return Err(Error::session(ServerError::new(status.as_u16(), detail).to_string()));
        }

        let body: TokenResponse = response.json().await.map_err(|e| Error::InvalidResponse {
            message: e.to_string(),
        })?;

        match body.token {
            Some(token) if !token.is_empty() => Ok(Credential::new(token)),
            _ => Err(AuthError::CredentialUnavailable {
                reason: "identity provider returned no token".to_string(),
            }
            .into()),
        }
    }
}

/// An absent session is served as `null` or `{}`.
fn parse_session(body: &str) -> Result<Option<Session>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| Error::InvalidResponse {
            message: e.to_string(),
        })?;

    let empty = match &value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty() || map.get("user").is_none_or(|u| u.is_null()),
        _ => false,
    };
    if empty {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| Error::InvalidResponse {
            message: e.to_string(),
        })
}
