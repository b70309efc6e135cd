use std::fmt;

use serde::{Deserialize, Serialize};

/// Counters exposed under `/stats/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Events,
    Photos,
    Users,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Events, StatKind::Photos, StatKind::Users];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Events => "events",
            StatKind::Photos => "photos",
            StatKind::Users => "users",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
