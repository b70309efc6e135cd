use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload for creating or updating an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventIn {
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An event as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOut {
    pub id: i64,
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the current user created the event.
    #[serde(default)]
    pub is_owner: bool,
}
