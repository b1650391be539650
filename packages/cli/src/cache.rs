use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How long a cached user list is served without asking the server.
pub const USER_CACHE_TTL_HOURS: i64 = 12;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedUsers {
    server: String,
    fetched_at: DateTime<Utc>,
    users: Vec<Value>,
}

/// Advisory on-disk cache of `GET /admin/users`.
///
/// Any write through the CLI that changes users invalidates it. Changes made
/// elsewhere show up once the entry expires.
pub struct UserCache {
    path: PathBuf,
    ttl: Duration,
}

impl UserCache {
    /// `<cache dir>/mottagning/users.json`.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::cache_dir().ok_or_else(|| anyhow!("Cannot determine cache directory"))?;
        Ok(Self::at(dir.join("mottagning").join("users.json")))
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            ttl: Duration::hours(USER_CACHE_TTL_HOURS),
        }
    }

    /// Cached users for `server`, or `None` if absent, stale, unreadable or
    /// fetched from another server.
    pub fn load(&self, server: &str, now: DateTime<Utc>) -> Option<Vec<Value>> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let cached: CachedUsers = serde_json::from_str(&raw).ok()?;
        if cached.server != server || now - cached.fetched_at >= self.ttl {
            return None;
        }
        Some(cached.users)
    }

    pub fn store(&self, server: &str, users: &[Value], now: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let cached = CachedUsers {
            server: server.to_string(),
            fetched_at: now,
            users: users.to_vec(),
        };
        fs::write(&self.path, serde_json::to_vec(&cached)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    pub fn invalidate(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to drop user cache");
            }
        }
    }
}
