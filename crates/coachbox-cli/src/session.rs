//! Session wiring: where the credential lives and how the manager is built.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use tracing::debug;

use coachbox_core::{ApiUrl, SessionState};
use coachbox_file::FileCredentialStore;
use coachbox_http::{ClientConfig, SessionManager};

use crate::cli::GlobalArgs;

/// Default session file in the platform data directory.
fn default_session_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "coachbox").context("Could not determine data directory")?;

    Ok(dirs.data_dir().join("session.json"))
}

/// Resolve the session file from `--session-file` or the default location.
pub fn session_path(global: &GlobalArgs) -> Result<PathBuf> {
    match &global.session_file {
        Some(path) => Ok(path.clone()),
        None => default_session_path(),
    }
}

/// Build a session manager over the file-backed credential store.
pub fn open(global: &GlobalArgs) -> Result<SessionManager> {
    let api = ApiUrl::new(&global.api).context("Invalid API URL")?;
    let path = session_path(global)?;
    debug!(path = %path.display(), api = %api, "Opening session");

    let config = ClientConfig::new(api)
        .with_timeout(Duration::from_secs(global.timeout))
        .with_user_agent(concat!("coachbox-cli/", env!("COACHBOX_VERSION")));

    SessionManager::new(config, Arc::new(FileCredentialStore::new(path)))
        .context("Failed to open session")
}

/// Open the session and fail unless a credential is stored.
pub fn open_logged_in(global: &GlobalArgs) -> Result<SessionManager> {
    let session = open(global)?;
    if session.state() == SessionState::Anonymous {
        bail!("No active session. Run 'coachbox login' first.");
    }
    Ok(session)
}
