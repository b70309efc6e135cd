//! Session storage for persisting login state.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use findmypix_core::SessionUser;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// What `login` remembers between invocations.
///
/// The cookie is the identity provider's session; bearer credentials are
/// minted from it on every request and never stored.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub api_url: String,
    pub identity_url: String,
    pub cookie_name: String,
    pub cookie_value: String,
    /// User reported by the identity provider at login.
    #[serde(default)]
    pub user: Option<SessionUser>,
}

// Custom Debug impl that hides the session cookie
impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("api_url", &self.api_url)
            .field("identity_url", &self.identity_url)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_value", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Get the session file path.
fn session_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "findmypix").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("session.json"))
}

/// Save a session to disk.
pub fn save_session(session: &StoredSession) -> Result<()> {
    save_to(&session_path()?, session)
}

/// Load the stored session, if any.
pub fn load_session() -> Result<Option<StoredSession>> {
    load_from(&session_path()?)
}

/// Remove the stored session. Returns false if there was none.
pub fn clear_session() -> Result<bool> {
    clear_at(&session_path()?)
}

fn save_to(path: &Path, session: &StoredSession) -> Result<()> {
    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, &json).context("Failed to write session file")?;

    // Set restrictive permissions (Unix only)
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

fn load_from(path: &Path) -> Result<Option<StoredSession>> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path).context("Failed to read session file")?;
    let stored = serde_json::from_str(&json).context("Invalid session file")?;
    Ok(Some(stored))
}

fn clear_at(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).context("Failed to remove session file")?;
    Ok(true)
}
