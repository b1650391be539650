use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::identity::IssuedToken;

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// E-mail (identifier) of the account.
    #[schema(example = "nolle@example.org")]
    pub email: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "0190f5a2c1e97c3d9b6a4f1e2d3c4b5a")]
    pub uid: String,
    /// Admin claim carried by the token.
    #[schema(example = false)]
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for LoginResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            uid: issued.identity.uid,
            is_admin: issued.identity.is_admin,
            expires_at: issued.expires_at,
        }
    }
}

/// Identity carried by the caller's token.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[schema(example = "0190f5a2c1e97c3d9b6a4f1e2d3c4b5a")]
    pub uid: String,
    #[schema(example = "nolle@example.org")]
    pub email: String,
    #[schema(example = false)]
    pub is_admin: bool,
}

impl From<AuthUser> for MeResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            is_admin: user.is_admin(),
            uid: user.uid,
            email: user.email,
        }
    }
}
