//! Error types for findmypix operations.
//!
//! Every failure a caller can observe maps onto a [`FailureKind`]. Only
//! [`FailureKind::AuthorizationExpired`] is ever intercepted by the request
//! pipeline; everything else is delivered to the caller as-is.

use std::fmt;
use thiserror::Error;

/// The unified error type for findmypix operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authorization errors (expired credential, terminal rejection).
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    /// Non-authorization failure status returned by the backend.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// A successful response whose body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Input validation errors (URL, header value, payload encoding).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The session source failed to answer.
    #[error("session error: {message}")]
    Session { message: String },
}

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// First-time authorization failure; recoverable through a refresh.
    AuthorizationExpired,
    /// Terminal authorization failure.
    Unauthorized,
    /// Transport-level failure.
    Network,
    /// Any non-authorization failure status.
    Server,
    /// Undecodable success body.
    InvalidResponse,
    /// Caller-supplied input was rejected before sending.
    InvalidInput,
    /// The session source failed.
    Session,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::AuthorizationExpired => "authorization_expired",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Network => "network",
            FailureKind::Server => "server",
            FailureKind::InvalidResponse => "invalid_response",
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::Session => "session",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Returns the failure kind of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Transport(_) => FailureKind::Network,
            Error::Auth(AuthError::Expired { .. }) => FailureKind::AuthorizationExpired,
            Error::Auth(_) => FailureKind::Unauthorized,
            Error::Server(_) => FailureKind::Server,
            Error::InvalidResponse { .. } => FailureKind::InvalidResponse,
            Error::InvalidInput(_) => FailureKind::InvalidInput,
            Error::Session { .. } => FailureKind::Session,
        }
    }

    /// Check if this is a first-time, recoverable authorization failure.
    pub fn is_authorization_expired(&self) -> bool {
        self.kind() == FailureKind::AuthorizationExpired
    }

    /// Check if this is a terminal authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == FailureKind::Unauthorized
    }

    /// Convert an expired-authorization error into its terminal form.
    ///
    /// Other errors are returned unchanged.
    pub fn into_unauthorized(self) -> Self {
        match self {
            Error::Auth(AuthError::Expired { detail }) => {
                Error::Auth(AuthError::Unauthorized { detail })
            }
            other => other,
        }
    }

    /// Terminal authorization error with no backend detail.
    pub fn unauthorized() -> Self {
        Error::Auth(AuthError::Unauthorized { detail: None })
    }

    /// Shorthand for a session source failure.
    pub fn session(message: impl Into<String>) -> Self {
        Error::Session {
            message: message.into(),
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authorization-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend rejected the credential; a refresh may recover it.
    #[error("{}", with_detail("authorization expired", detail))]
    Expired { detail: Option<String> },

    /// The backend rejected the request and recovery is not possible.
    #[error("{}", with_detail("unauthorized", detail))]
    Unauthorized { detail: Option<String> },

    /// A session exists but no bearer credential could be minted.
    #[error("credential unavailable: {reason}")]
    CredentialUnavailable { reason: String },
}

fn with_detail(base: &str, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("{base}: {detail}"),
        None => base.to_string(),
    }
}

/// A non-authorization failure status from the backend.
#[derive(Debug)]
pub struct ServerError {
    /// HTTP status code.
    pub status: u16,
    /// The `detail` field of the error body, if present.
    pub detail: Option<String>,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServerError {}

impl ServerError {
    /// Create a new server error.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    /// Check if the backend reported a missing resource.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid service URL.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// Header name or value that cannot be sent.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Request payload that could not be encoded.
    #[error("invalid payload: {message}")]
    Payload { message: String },
}
