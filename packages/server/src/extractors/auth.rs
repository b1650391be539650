use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;

/// Roles a caller can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Member,
    Admin,
}

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Role checks happen via `require_role()` in the handler body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Returns `Ok(())` if the user holds `role` or a stronger one,
    /// `Err(PermissionDenied)` otherwise.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role >= role {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let identity = state
            .identity
            .verify_token(token)
            .await
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            uid: identity.uid,
            email: identity.email,
            role: if identity.is_admin {
                Role::Admin
            } else {
                Role::Member
            },
        })
    }
}
