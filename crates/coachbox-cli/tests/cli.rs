//! CLI tests against a mock backend.
//!
//! Each test runs the built binary with its own HOME and session file.

mod common;

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{jwt, run_cli, run_cli_success, session_file, token_body, write_session};

#[tokio::test]
async fn test_login_then_whoami() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body(&jwt(3600, "coach-1"), "r1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stdout = run_cli_success(
        &["login", "--username", "coach", "--password", "secret"],
        home.path(),
        &server.uri(),
    )
    .await;
    assert!(stdout.contains("Logged in successfully"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(session_file(home.path())).unwrap())
            .unwrap();
    assert_eq!(stored["refresh_token"], "r1");

    let stdout = run_cli_success(&["whoami"], home.path(), &server.uri()).await;
    assert!(stdout.contains("coach-1"));
    assert!(stdout.contains("valid"));
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let output = run_cli(
        &["login", "--username", "coach", "--password", "wrong"],
        home.path(),
        &server.uri(),
    )
    .await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid credentials"));
    assert!(!session_file(home.path()).exists());
}

#[tokio::test]
async fn test_whoami_without_session() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    let output = run_cli(&["whoami"], home.path(), &server.uri()).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No active session"));
}

#[tokio::test]
async fn test_request_refreshes_expired_session() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let renewed = jwt(3600, "coach-1");

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(query_param("refresh_token", "r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(&renewed, "r2")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/athletes"))
        .and(query_param("team", "u17"))
        .and(header("authorization", format!("Bearer {renewed}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "Ana"}])))
        .expect(1)
        .mount(&server)
        .await;

    write_session(home.path(), &jwt(-3600, "coach-1"), "r1");

    let stdout = run_cli_success(
        &["request", "get", "/athletes", "--query", "team=u17"],
        home.path(),
        &server.uri(),
    )
    .await;
    assert!(stdout.contains("Ana"));

    let stored = std::fs::read_to_string(session_file(home.path())).unwrap();
    assert!(stored.contains("r2"));
}

#[tokio::test]
async fn test_rejected_refresh_reports_session_expired() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    write_session(home.path(), &jwt(-3600, "coach-1"), "revoked");

    let output = run_cli(&["request", "GET", "/athletes"], home.path(), &server.uri()).await;

    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr)
            .contains("Session expired. Run 'coachbox login' again.")
    );
    assert!(!session_file(home.path()).exists());
}

#[tokio::test]
async fn test_request_posts_json() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/comments"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5})))
        .expect(1)
        .mount(&server)
        .await;

    write_session(home.path(), &jwt(3600, "coach-1"), "r1");

    let stdout = run_cli_success(
        &["request", "POST", "/comments", "--json", r#"{"text":"nice"}"#],
        home.path(),
        &server.uri(),
    )
    .await;
    assert!(stdout.contains("\"id\": 5"));
}

#[tokio::test]
async fn test_upload_sends_multipart() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let clip = home.path().join("clip.mp4");
    std::fs::write(&clip, b"not really a video").unwrap();

    Mock::given(method("POST"))
        .and(path("/videos/upload"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 8})))
        .expect(1)
        .mount(&server)
        .await;

    write_session(home.path(), &jwt(3600, "coach-1"), "r1");

    run_cli_success(
        &[
            "upload",
            "--file",
            clip.to_str().unwrap(),
            "--field",
            "athlete_id=3",
        ],
        home.path(),
        &server.uri(),
    )
    .await;

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0].headers.get("content-type").unwrap();
    assert!(
        content_type
            .to_str()
            .unwrap()
            .starts_with("multipart/form-data")
    );
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("filename=\"clip.mp4\""));
    assert!(body.contains("athlete_id"));
}

#[tokio::test]
async fn test_logout_clears_session_even_if_backend_fails() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(50)))
        .expect(1)
        .mount(&server)
        .await;

    write_session(home.path(), &jwt(3600, "coach-1"), "r1");

    run_cli_success(&["logout"], home.path(), &server.uri()).await;
    assert!(!session_file(home.path()).exists());
}

#[tokio::test]
async fn test_unsupported_method_fails_before_network() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    write_session(home.path(), &jwt(3600, "coach-1"), "r1");

    let output = run_cli(&["request", "TRACE", "/athletes"], home.path(), &server.uri()).await;

    assert!(!output.status.success());
    assert!(server.received_requests().await.unwrap().is_empty());
}
