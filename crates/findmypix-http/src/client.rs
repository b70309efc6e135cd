//! The authenticated request pipeline.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::instrument;

use findmypix_core::{ApiUrl, Error, Result, SessionSource, SignOutSink};

use crate::config::ClientConfig;
use crate::coordinator::RefreshCoordinator;
use crate::decorator::RequestDecorator;
use crate::request::OutboundRequest;
use crate::transport::HttpClient;

/// Client for the findmypix backend.
///
/// Every request is stamped with the current session's credential. When the
/// backend rejects one with 401, the client recovers once on behalf of all
/// in-flight requests and replays them.
///
/// This type is cheap to clone; clones share the same refresh state.
#[derive(Clone, Debug)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

#[derive(Debug)]
struct BackendClientInner {
    http: HttpClient,
    decorator: RequestDecorator,
    coordinator: RefreshCoordinator,
}

impl BackendClient {
    /// Create a client with its own refresh state.
    pub fn new(
        config: ClientConfig,
        sessions: Arc<dyn SessionSource>,
        sign_out: Arc<dyn SignOutSink>,
    ) -> Result<Self> {
        let http = HttpClient::new(&config)?;
        let decorator = RequestDecorator::new(sessions.clone());
        let coordinator = RefreshCoordinator::new(sessions, sign_out)
            .with_sign_out_on_failed_replay(config.sign_out_on_failed_replay);

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                decorator,
                coordinator,
            }),
        })
    }

    /// Returns the backend URL.
    pub fn api_url(&self) -> &ApiUrl {
        self.inner.http.base()
    }

    /// Returns the refresh coordinator shared by this client's requests.
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// Send a request and return the raw success body.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn send(&self, request: OutboundRequest) -> Result<Vec<u8>> {
        match self.attempt(&request).await {
            Ok(body) => Ok(body),
            Err(e) => {
                self.inner
                    .coordinator
                    .recover(request, e, |replay| async move { self.attempt(&replay).await })
                    .await
            }
        }
    }

    /// Send a request and decode the JSON success body.
    pub async fn send_json<R: DeserializeOwned>(&self, request: OutboundRequest) -> Result<R> {
        let body = self.send(request).await?;
        decode(&body)
    }

    /// Send a request whose success body is ignored.
    pub async fn send_empty(&self, request: OutboundRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    async fn attempt(&self, request: &OutboundRequest) -> Result<Vec<u8>> {
        let decorated = self.inner.decorator.decorate(request).await;
        self.inner.http.send(&decorated).await
    }
}

pub(crate) fn decode<R: DeserializeOwned>(body: &[u8]) -> Result<R> {
    serde_json::from_slice(body).map_err(|e| Error::InvalidResponse {
        message: e.to_string(),
    })
}
