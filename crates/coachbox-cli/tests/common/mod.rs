use std::path::{Path, PathBuf};
use std::process::Output;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;
use tokio::process::Command;

/// A JWT-shaped token for `sub` expiring `offset` seconds from now.
pub fn jwt(offset: i64, sub: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let exp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
        + offset;
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp, "sub": sub }).to_string());
    format!("{header}.{payload}.signature")
}

/// Token response body as the backend returns it.
pub fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer"
    })
}

/// Session file inside an isolated home.
pub fn session_file(home: &Path) -> PathBuf {
    home.join("session.json")
}

/// Write a session file directly, as a previous login would have.
pub fn write_session(home: &Path, access: &str, refresh: &str) {
    let body = token_body(access, refresh).to_string();
    std::fs::write(session_file(home), body).unwrap();
}

/// Run the CLI with an isolated HOME and session file against `api`.
pub async fn run_cli(args: &[&str], home: &Path, api: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_coachbox"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("COACHBOX_API", api);
    cmd.env("COACHBOX_SESSION_FILE", session_file(home));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd.output().await.expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub async fn run_cli_success(args: &[&str], home: &Path, api: &str) -> String {
    let output = run_cli(args, home, api).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}
