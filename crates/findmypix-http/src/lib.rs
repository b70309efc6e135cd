//! findmypix-http - Authenticated HTTP client for the findmypix backend.
//!
//! Requests go through a pipeline that stamps the current session's bearer
//! credential and, when the backend answers 401, recovers once for every
//! concurrently failing request before replaying them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use findmypix_core::ApiUrl;
//! use findmypix_http::{BackendClient, ClientConfig, IdentityConfig, IdentityProvider};
//! # use findmypix_core::SignOutSink;
//! # async fn example(sign_out: Arc<dyn SignOutSink>) -> findmypix_core::Result<()> {
//! let identity = IdentityConfig::new(ApiUrl::new("http://localhost:3000")?, "cookie-value");
//! let sessions = Arc::new(IdentityProvider::new(&identity)?);
//!
//! let config = ClientConfig::new(ApiUrl::new("http://localhost:8000")?);
//! let client = BackendClient::new(config, sessions, sign_out)?;
//!
//! for event in client.list_my_events().await? {
//!     println!("{}: {}", event.id, event.title);
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod client;
pub mod config;
mod coordinator;
mod decorator;
mod identity;
mod request;
mod transport;

#[cfg(test)]
mod testing;

pub use api::UPLOAD_FIELD;
pub use client::BackendClient;
pub use config::{ClientConfig, IdentityConfig};
pub use coordinator::{PendingWaiter, RefreshCoordinator, RefreshOutcome, RefreshState};
pub use decorator::RequestDecorator;
pub use identity::IdentityProvider;
pub use request::{OutboundRequest, RequestBody};
pub use transport::HttpClient;
