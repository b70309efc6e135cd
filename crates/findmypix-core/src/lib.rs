//! findmypix-core - Core types and traits for the findmypix backend client.

pub mod credential;
pub mod error;
pub mod models;
pub mod session;
pub mod traits;
pub mod types;

pub use credential::Credential;
pub use error::{Error, FailureKind};
pub use session::{Session, SessionUser};
pub use traits::{SessionSource, SignOutSink};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
