//! HTTP transport for the backend.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, trace};

use findmypix_core::error::{AuthError, ServerError, TransportError};
use findmypix_core::{ApiUrl, Error, Result};

use crate::config::ClientConfig;
use crate::request::OutboundRequest;

/// Error body returned by the backend.
///
/// `detail` is a string for most errors and a list for validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Performs network calls and classifies their outcome.
///
/// A 401 becomes [`AuthError::Expired`]; any other non-success status becomes
/// a [`ServerError`]; transport failures become [`TransportError`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base: ApiUrl,
}

impl HttpClient {
    /// Create a new transport for the configured backend.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base: config.api_url.clone(),
        })
    }

    /// Returns the backend URL this transport sends to.
    pub fn base(&self) -> &ApiUrl {
        &self.base
    }

    /// Send a request and return the success body.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path(), retried = request.is_retried()))]
    pub async fn send(&self, request: &OutboundRequest) -> Result<Vec<u8>> {
        let url = self.base.endpoint(request.path());
        debug!("Sending backend request");

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(request.wire_headers());

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.bytes().to_vec());
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        trace!(status = %status, "Backend response");

        if status.is_success() {
            let body = response.bytes().await.map_err(transport_error)?;
            return Ok(body.to_vec());
        }

        let detail = read_error_detail(response).await;
        Err(classify_status(status, detail))
    }
}

pub(crate) fn classify_status(status: StatusCode, detail: Option<String>) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        Error::Auth(AuthError::Expired { detail })
    } else {
        Error::Server(ServerError::new(status.as_u16(), detail))
    }
}

/// Parse the error body, falling back to the raw text.
pub(crate) async fn read_error_detail(response: reqwest::Response) -> Option<String> {
    let text = response.text().await.ok()?;
    if text.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => match body.detail {
            Some(serde_json::Value::String(detail)) => Some(detail),
            Some(other) => Some(other.to_string()),
            None => body.message.or(body.error),
        },
        Err(_) => Some(text),
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}
