pub mod admin;
pub mod album;
pub mod auth;
pub mod event;
pub mod post;

use anyhow::{Result, bail};
use chrono::Utc;
use dialoguer::Confirm;

use crate::cache::UserCache;
use crate::client::ApiClient;
use crate::session::{Session, SessionStore};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";

/// Everything a command needs: where to talk to and where state lives.
pub struct Context {
    server_override: Option<String>,
    pub sessions: SessionStore,
    pub users: UserCache,
}

impl Context {
    pub fn new(server_override: Option<String>) -> Result<Self> {
        Ok(Self {
            server_override,
            sessions: SessionStore::default_location()?,
            users: UserCache::default_location()?,
        })
    }

    /// `--server`, else the session's server, else the local default.
    pub fn server(&self) -> Result<String> {
        if let Some(server) = &self.server_override {
            return Ok(server.trim_end_matches('/').to_string());
        }
        Ok(self
            .sessions
            .load()?
            .map(|s| s.server)
            .unwrap_or_else(|| DEFAULT_SERVER.to_string()))
    }

    /// The stored session, which must be unexpired and for the target server.
    pub fn session(&self) -> Result<Session> {
        let Some(session) = self.sessions.load()? else {
            bail!("Not logged in. Run `mottagning login` first.");
        };
        if session.is_expired(Utc::now()) {
            bail!("Session expired. Run `mottagning login` again.");
        }
        let server = self.server()?;
        if session.server != server {
            bail!(
                "Logged in to {}, not {}. Run `mottagning login` first.",
                session.server,
                server
            );
        }
        Ok(session)
    }

    /// A client carrying the session token.
    pub fn client(&self) -> Result<ApiClient> {
        let session = self.session()?;
        ApiClient::new(&session.server, Some(session.token))
    }
}

/// Ask before a destructive action unless `--yes` was given.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
