//! Identity verification and account administration.
//!
//! Handlers only see the [`IdentityProvider`] trait; [`DbIdentityProvider`]
//! is the implementation shipped with the server.

mod database;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

pub use database::DbIdentityProvider;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Identity store error: {0}")]
    Database(#[from] DbErr),

    #[error("Identity provider error: {0}")]
    Internal(String),
}

/// The verified caller behind a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub is_admin: bool,
}

/// A stored identity as seen by administrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an identity.
#[derive(Debug, Clone, Default)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

/// One page of identities. `next_page_token` is `None` on the last page.
#[derive(Debug, Clone, Default)]
pub struct IdentityPage {
    pub users: Vec<IdentityRecord>,
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate a bearer token and return the identity it carries.
    async fn verify_token(&self, token: &str) -> Result<Identity, IdentityError>;

    /// Exchange credentials for a token.
    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedToken, IdentityError>;

    async fn create_user(&self, new: NewIdentity) -> Result<IdentityRecord, IdentityError>;

    async fn get_user(&self, uid: &str) -> Result<Option<IdentityRecord>, IdentityError>;

    /// List identities in uid order, `page_size` at a time.
    async fn list_users(
        &self,
        page_size: u64,
        page_token: Option<String>,
    ) -> Result<IdentityPage, IdentityError>;

    /// Set or clear the admin claim. Fails with `NotFound` for unknown uids.
    async fn set_admin_claim(&self, uid: &str, is_admin: bool) -> Result<(), IdentityError>;

    async fn update_display_name(&self, uid: &str, display_name: &str)
    -> Result<(), IdentityError>;

    /// Returns `false` if the identity did not exist.
    async fn delete_user(&self, uid: &str) -> Result<bool, IdentityError>;
}
