//! Authenticated session handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user identity attached to a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// An opaque handle meaning "the user is authenticated".
///
/// Sessions are owned by the identity provider. The request pipeline only
/// checks for their existence; the identity fields are informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session for the given user.
    pub fn new(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            expires: None,
        }
    }

    /// Returns a human-readable label for the session's user.
    pub fn display_name(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        user.name
            .as_deref()
            .or(user.email.as_deref())
            .or(user.id.as_deref())
    }

    /// Returns true if the session carries an expiry in the past.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}
