//! Mock backend tests for the findmypix HTTP client.
//!
//! Two wiremock servers stand in for the backend and the identity provider,
//! so the whole pipeline runs: cookie-based session lookup, bearer stamping,
//! 401 recovery and replay.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use findmypix_core::models::{EventIn, ImageUpload, StatKind};
use findmypix_core::{ApiUrl, Error, FailureKind, Result, SignOutSink};
use findmypix_http::{BackendClient, ClientConfig, IdentityConfig, IdentityProvider};

const COOKIE: &str = "next-auth.session-token=cookie-1";

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct CountingSignOut {
    calls: AtomicUsize,
}

impl CountingSignOut {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignOutSink for CountingSignOut {
    async fn terminate(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scripted identity provider state shared by its two endpoints.
#[derive(Default)]
struct IdentityScript {
    session_calls: AtomicUsize,
    /// Hand out "fresh" tokens once this many session lookups happened.
    rotate_after: Option<usize>,
    /// Report no session once this many session lookups happened.
    end_after: Option<usize>,
}

struct SessionEndpoint(Arc<IdentityScript>);

impl Respond for SessionEndpoint {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let calls = self.0.session_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.0.end_after.is_some_and(|after| calls > after) {
            return ResponseTemplate::new(200).set_body_json(json!(null));
        }
        ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "1", "name": "Alice", "email": "alice@example.com"},
            "expires": "2030-01-01T00:00:00.000Z"
        }))
    }
}

struct TokenEndpoint(Arc<IdentityScript>);

impl Respond for TokenEndpoint {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let calls = self.0.session_calls.load(Ordering::SeqCst);
        let token = match self.0.rotate_after {
            Some(after) if calls > after => "fresh",
            _ => "stale",
        };
        ResponseTemplate::new(200).set_body_json(json!({ "token": token, "user": {"name": "Alice"} }))
    }
}

async fn mount_identity(server: &MockServer, script: IdentityScript) -> Arc<IdentityScript> {
    let script = Arc::new(script);
    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .and(header("cookie", COOKIE))
        .respond_with(SessionEndpoint(script.clone()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/token"))
        .and(header("cookie", COOKIE))
        .respond_with(TokenEndpoint(script.clone()))
        .mount(server)
        .await;
    script
}

async fn mount_expiring_backend(server: &MockServer, http_method: &str, route: &str, ok: ResponseTemplate) {
    Mock::given(method(http_method))
        .and(path(route))
        .and(header("authorization", "Bearer stale"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid or expired token"})),
        )
        .mount(server)
        .await;
    Mock::given(method(http_method))
        .and(path(route))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ok)
        .mount(server)
        .await;
}

fn url(server: &MockServer) -> ApiUrl {
    ApiUrl::new(server.uri()).unwrap()
}

fn client_for(
    backend: ApiUrl,
    identity: &MockServer,
    config: impl FnOnce(ClientConfig) -> ClientConfig,
) -> (BackendClient, Arc<CountingSignOut>) {
    let sessions = IdentityProvider::new(&IdentityConfig::new(url(identity), "cookie-1")).unwrap();
    let sign_out = Arc::new(CountingSignOut::default());
    let client = BackendClient::new(
        config(ClientConfig::new(backend)),
        Arc::new(sessions),
        sign_out.clone(),
    )
    .unwrap();
    (client, sign_out)
}

async fn setup(script: IdentityScript) -> (MockServer, MockServer, BackendClient, Arc<CountingSignOut>) {
    let backend = MockServer::start().await;
    let identity = MockServer::start().await;
    mount_identity(&identity, script).await;
    let (client, sign_out) = client_for(url(&backend), &identity, |c| c);
    (backend, identity, client, sign_out)
}

fn count_with_bearer(requests: &[Request], token: &str) -> usize {
    let expected = format!("Bearer {}", token);
    requests
        .iter()
        .filter(|r| {
            r.headers
                .get("authorization")
                .is_some_and(|v| v.to_str().ok() == Some(expected.as_str()))
        })
        .count()
}

fn event_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "date": "2025-04-12T18:00:00Z",
        "description": null,
        "is_owner": true
    })
}

// ============================================================================
// Credential stamping
// ============================================================================

#[tokio::test]
async fn test_request_carries_bearer_from_identity_provider() {
    let (backend, _identity, client, sign_out) = setup(IdentityScript::default()).await;

    Mock::given(method("GET"))
        .and(path("/events/my"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([event_json(1, "Gala")])))
        .expect(1)
        .mount(&backend)
        .await;

    let events = client.list_my_events().await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Gala");
    assert_eq!(sign_out.calls(), 0);
}

#[tokio::test]
async fn test_signed_out_request_goes_without_credential() {
    let backend = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&identity)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})))
        .expect(0)
        .mount(&identity)
        .await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&backend)
        .await;

    let (client, _) = client_for(url(&backend), &identity, |c| c);
    let events = client.list_events().await.unwrap();

    assert!(events.is_empty());
    let received = backend.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_credential_failure_sends_unauthenticated() {
    let backend = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {"name": "Alice"}})))
        .mount(&identity)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": null})))
        .mount(&identity)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&backend)
        .await;

    let (client, _) = client_for(url(&backend), &identity, |c| c);
    let health = client.health().await.unwrap();

    assert_eq!(health.status, "ok");
    let received = backend.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

// ============================================================================
// Recovery
// ============================================================================

#[tokio::test]
async fn test_concurrent_expiry_recovers_and_replays_all() {
    let (backend, _identity, client, sign_out) = setup(IdentityScript {
        rotate_after: Some(3),
        ..Default::default()
    })
    .await;
    mount_expiring_backend(
        &backend,
        "GET",
        "/events/my",
        ResponseTemplate::new(200).set_body_json(json!([event_json(4, "Marathon")])),
    )
    .await;

    let (a, b, c) = tokio::join!(
        client.list_my_events(),
        client.list_my_events(),
        client.list_my_events()
    );

    for result in [a, b, c] {
        assert_eq!(result.unwrap()[0].title, "Marathon");
    }
    assert_eq!(sign_out.calls(), 0);
    assert!(!client.coordinator().is_refreshing());

    let received = backend.received_requests().await.unwrap();
    assert_eq!(count_with_bearer(&received, "fresh"), 3);
    assert!(count_with_bearer(&received, "stale") <= 3);
}

#[tokio::test]
async fn test_expiry_without_session_signs_out_once() {
    let (backend, _identity, client, sign_out) = setup(IdentityScript {
        end_after: Some(1),
        ..Default::default()
    })
    .await;
    mount_expiring_backend(&backend, "GET", "/events/my", ResponseTemplate::new(200)).await;

    let err = client.list_my_events().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Unauthorized);
    assert_eq!(sign_out.calls(), 1);
    assert_eq!(backend.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_replay_rejected_again_is_terminal() {
    let (backend, _identity, client, sign_out) = setup(IdentityScript::default()).await;

    Mock::given(method("DELETE"))
        .and(path("/events/3"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
        .expect(2)
        .mount(&backend)
        .await;

    let err = client.delete_event(3).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(err.to_string().contains("Not authenticated"));
    assert_eq!(sign_out.calls(), 0);
}

#[tokio::test]
async fn test_replay_rejected_again_signs_out_when_configured() {
    let backend = MockServer::start().await;
    let identity = MockServer::start().await;
    mount_identity(&identity, IdentityScript::default()).await;

    Mock::given(method("GET"))
        .and(path("/events/my"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&backend)
        .await;

    let (client, sign_out) = client_for(url(&backend), &identity, |c| {
        c.with_sign_out_on_failed_replay(true)
    });
    let err = client.list_my_events().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(sign_out.calls(), 1);
}

#[tokio::test]
async fn test_upload_replay_sends_identical_body() {
    let (backend, _identity, client, _) = setup(IdentityScript {
        rotate_after: Some(1),
        ..Default::default()
    })
    .await;
    mount_expiring_backend(
        &backend,
        "POST",
        "/images/1",
        ResponseTemplate::new(200).set_body_json(json!({"id": 10, "path": "event_1/a.jpg", "embeddings": []})),
    )
    .await;

    let upload = ImageUpload::new("a.jpg", b"JPEGDATA".to_vec());
    let image = client.upload_image(1, &upload).await.unwrap();
    assert_eq!(image.id, 10);

    let received = backend.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].body, received[1].body);
    assert_eq!(
        received[0].headers.get("content-type"),
        received[1].headers.get("content-type")
    );
}

// ============================================================================
// Pass-through errors
// ============================================================================

#[tokio::test]
async fn test_server_error_passes_through_without_recovery() {
    let backend = MockServer::start().await;
    let identity = MockServer::start().await;
    let script = mount_identity(&identity, IdentityScript::default()).await;

    Mock::given(method("GET"))
        .and(path("/events/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Event not found"})))
        .expect(1)
        .mount(&backend)
        .await;

    let (client, sign_out) = client_for(url(&backend), &identity, |c| c);
    let err = client.get_event(99).await.unwrap_err();

    match err {
        Error::Server(server) => {
            assert!(server.is_not_found());
            assert_eq!(server.detail.as_deref(), Some("Event not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(script.session_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sign_out.calls(), 0);
}

#[tokio::test]
async fn test_forbidden_is_not_an_authorization_failure() {
    let (backend, _identity, client, sign_out) = setup(IdentityScript::default()).await;

    Mock::given(method("PUT"))
        .and(path("/events/5"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "Not authorized to modify this event"})),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let payload = EventIn {
        title: "Renamed".to_string(),
        date: "2025-04-12T18:00:00Z".parse().unwrap(),
        description: None,
    };
    let err = client.update_event(5, &payload).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Server);
    assert_eq!(sign_out.calls(), 0);
}

#[tokio::test]
async fn test_network_error_passes_through() {
    let identity = MockServer::start().await;
    let script = mount_identity(&identity, IdentityScript::default()).await;

    let unreachable = ApiUrl::new("http://127.0.0.1:1").unwrap();
    let (client, sign_out) = client_for(unreachable, &identity, |c| c);
    let err = client.list_events().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Network);
    assert_eq!(script.session_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sign_out.calls(), 0);
}

#[tokio::test]
async fn test_undecodable_body_is_invalid_response() {
    let (backend, _identity, client, _) = setup(IdentityScript::default()).await;

    Mock::given(method("GET"))
        .and(path("/stats/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&backend)
        .await;

    let err = client.count(StatKind::Users).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidResponse);
}

// ============================================================================
// Typed endpoints
// ============================================================================

#[tokio::test]
async fn test_create_event() {
    let (backend, _identity, client, _) = setup(IdentityScript::default()).await;

    Mock::given(method("POST"))
        .and(path("/events"))
        .and(body_json(json!({
            "title": "Spring Gala",
            "date": "2025-04-12T18:00:00Z",
            "description": "Annual fundraiser"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(event_json(12, "Spring Gala")))
        .expect(1)
        .mount(&backend)
        .await;

    let payload = EventIn {
        title: "Spring Gala".to_string(),
        date: "2025-04-12T18:00:00Z".parse().unwrap(),
        description: Some("Annual fundraiser".to_string()),
    };
    let event = client.create_event(&payload).await.unwrap();

    assert_eq!(event.id, 12);
    assert!(event.is_owner);
}

#[tokio::test]
async fn test_delete_image_with_empty_body() {
    let (backend, _identity, client, _) = setup(IdentityScript::default()).await;

    Mock::given(method("DELETE"))
        .and(path("/images/44"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend)
        .await;

    client.delete_image(44).await.unwrap();
}

#[tokio::test]
async fn test_match_photo_sends_multipart() {
    let (backend, _identity, client, _) = setup(IdentityScript::default()).await;

    Mock::given(method("POST"))
        .and(path("/match/2"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"file\"; filename=\"me.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "embedding_id": 8,
            "image_id": 3,
            "image_path": "event_2/b.jpg",
            "distance": 0.31,
            "threshold": 0.4,
            "bbox": {"x": 10, "y": 20, "w": 64, "h": 64},
            "other_embeddings": null
        }])))
        .expect(1)
        .mount(&backend)
        .await;

    let photo = ImageUpload::new("me.png", vec![0x89, 0x50, 0x4e, 0x47]);
    let matches = client.match_photo(2, &photo).await.unwrap();

    assert_eq!(matches.len(), 1);
    assert!(matches[0].is_within_threshold());
    assert_eq!(client.file_url(&matches[0].image_path), format!("{}/files/event_2/b.jpg", backend.uri()));
}

#[tokio::test]
async fn test_match_face_and_stats() {
    let (backend, _identity, client, _) = setup(IdentityScript::default()).await;

    Mock::given(method("GET"))
        .and(path("/match/2/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats/photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 1234})))
        .mount(&backend)
        .await;

    assert!(client.match_face(2, 8).await.unwrap().is_empty());
    assert_eq!(client.count(StatKind::Photos).await.unwrap(), 1234);
}

// ============================================================================
// Identity provider
// ============================================================================

#[tokio::test]
async fn test_identity_provider_session_states() {
    use findmypix_core::SessionSource;

    let identity = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .up_to_n_times(1)
        .mount(&identity)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&identity)
        .await;

    let provider = IdentityProvider::new(&IdentityConfig::new(url(&identity), "cookie-1")).unwrap();

    assert!(provider.current_session().await.unwrap().is_none());
    let err = provider.current_session().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Session);
}

#[tokio::test]
async fn test_identity_provider_token_rejected() {
    use findmypix_core::SessionSource;

    let identity = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})))
        .mount(&identity)
        .await;

    let provider = IdentityProvider::new(&IdentityConfig::new(url(&identity), "cookie-1")).unwrap();
    let err = provider.bearer_credential().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Unauthorized);
}
