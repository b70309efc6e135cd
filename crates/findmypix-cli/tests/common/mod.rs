use std::path::Path;
use std::process::Output;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_TOKEN: &str = "cookie-1";

/// Run the CLI with an isolated HOME so session storage never touches the
/// real user directory.
pub async fn run_cli(args: &[&str], home: &Path) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_findmypix"))
        .args(args)
        .env("HOME", home)
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("FINDMYPIX_API")
        .env_remove("FINDMYPIX_IDENTITY")
        .env_remove("RUST_LOG")
        .output()
        .await
        .expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub async fn run_cli_success(args: &[&str], home: &Path) -> String {
    let output = run_cli(args, home).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub async fn run_cli_failure(args: &[&str], home: &Path) -> String {
    let output = run_cli(args, home).await;
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Log in against the given servers.
pub async fn login(home: &Path, api: &MockServer, identity: &MockServer) -> String {
    run_cli_success(
        &[
            "login",
            "--session-token",
            SESSION_TOKEN,
            "--api",
            &api.uri(),
            "--identity",
            &identity.uri(),
        ],
        home,
    )
    .await
}

pub fn session_json() -> serde_json::Value {
    json!({
        "user": {"id": "1", "name": "Alice", "email": "alice@example.com"},
        "expires": "2030-01-01T00:00:00.000Z"
    })
}

/// Identity provider that always reports a session and hands out `token`.
pub async fn mount_identity(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
        .mount(server)
        .await;
    mount_token(server, token).await;
}

pub async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .mount(server)
        .await;
}
