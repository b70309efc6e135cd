//! Backend request and response types.
//!
//! These mirror the backend's JSON contract. The operations that produce them
//! live on the HTTP client.

mod events;
mod images;
mod matching;
mod stats;

pub use events::{EventIn, EventOut};
pub use images::{Embedding, ImageOut, ImageUpload};
pub use matching::{BoundingBox, MatchResult};
pub use stats::{CountResponse, HealthResponse, StatKind};
