use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged-in session, persisted between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub server: String,
    pub token: String,
    pub uid: String,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// JSON file holding the current [`Session`].
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// `<config dir>/mottagning/session.json`.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("Cannot determine config directory"))?;
        Ok(Self::at(dir.join("mottagning").join("session.json")))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt session file {}", self.path.display()))?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Returns `false` if there was no session to remove.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}
