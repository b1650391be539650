use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::shared::non_blank;

/// Fallback avatar served by the front end.
pub const DEFAULT_PROFILE_PIC: &str = "/defaultprofile.svg";

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetClaimRequest {
    #[schema(example = "0190f5a2c1e97c3d9b6a4f1e2d3c4b5a")]
    pub uid: Option<String>,
    /// Defaults to `true`.
    #[schema(example = true)]
    pub is_admin: Option<bool>,
}

/// Validated `(uid, is_admin)` of a claim change.
pub fn validate_set_claim(payload: &SetClaimRequest) -> Result<(String, bool), AppError> {
    let uid = non_blank(payload.uid.as_deref())
        .ok_or_else(|| AppError::Validation("User ID is required".into()))?;
    Ok((uid.to_string(), payload.is_admin.unwrap_or(true)))
}

/// One entry of a bulk user import. Fields other than `identifier` and
/// `password` end up on the profile document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkUserEntry {
    /// Login identifier, used as the e-mail of the identity.
    pub identifier: Option<String>,
    pub password: Option<String>,
    /// Profile fields such as `displayName`, `username`, `name`, `phoneNumber`.
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BulkCreateUsersRequest {
    /// Objects with `identifier`, `password` and any profile fields.
    #[schema(
        value_type = Vec<Object>,
        example = json!([{"identifier": "nolle1@example.org", "password": "hemligt1", "displayName": "Nolle 1"}])
    )]
    pub users: Option<Vec<BulkUserEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BulkStatus {
    Success,
    Error,
}

/// Outcome of one bulk import entry.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BulkCreateResult {
    pub identifier: Option<String>,
    pub status: BulkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkCreateResult {
    pub fn success(identifier: &str, uid: String) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            status: BulkStatus::Success,
            uid: Some(uid),
            error: None,
        }
    }

    pub fn failure(identifier: Option<String>, error: impl Into<String>) -> Self {
        Self {
            identifier,
            status: BulkStatus::Error,
            uid: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BulkCreateUsersResponse {
    #[schema(example = "Bulk user creation finished.")]
    pub message: String,
    pub results: Vec<BulkCreateResult>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PurgeUsersRequest {
    /// Uids to keep. Must not be empty.
    pub whitelist: Option<Vec<String>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurgeUsersResponse {
    pub deleted_count: usize,
    pub kept_count: usize,
    pub deleted_uids: Vec<String>,
    pub kept_uids: Vec<String>,
}

/// An identity merged with its profile document.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[schema(example = "0190f5a2c1e97c3d9b6a4f1e2d3c4b5a")]
    pub uid: String,
    #[schema(example = "nolle@example.org")]
    pub email: Option<String>,
    #[schema(example = "Loke")]
    pub display_name: Option<String>,
    #[schema(example = "loke")]
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Signed URL of the profile picture, or the default avatar path.
    #[schema(example = "/defaultprofile.svg")]
    pub profile_pic: String,
    pub is_admin: bool,
    /// Remaining profile fields from the bulk import.
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AdminListResponse {
    pub admins: Vec<UserRecord>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDisplayNameRequest {
    #[schema(example = "Loke")]
    pub display_name: Option<String>,
}

pub fn validate_display_name(payload: &UpdateDisplayNameRequest) -> Result<String, AppError> {
    let name = non_blank(payload.display_name.as_deref())
        .ok_or_else(|| AppError::Validation("displayName is required".into()))?;
    if name.chars().count() > 64 {
        return Err(AppError::Validation(
            "displayName must be at most 64 characters".into(),
        ));
    }
    Ok(name.to_string())
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProfilePictureResponse {
    #[schema(example = "Profile picture updated.")]
    pub message: String,
    /// Object key of the stored picture.
    #[schema(example = "profilepics/0190f5a2c1e97c3d9b6a4f1e2d3c4b5a.webp")]
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_claim_defaults_to_granting() {
        let req = SetClaimRequest {
            uid: Some(" abc ".into()),
            is_admin: None,
        };
        assert_eq!(validate_set_claim(&req).unwrap(), ("abc".to_string(), true));

        let req = SetClaimRequest {
            uid: Some("abc".into()),
            is_admin: Some(false),
        };
        assert!(!validate_set_claim(&req).unwrap().1);
    }

    #[test]
    fn set_claim_requires_uid() {
        let req = SetClaimRequest {
            uid: Some("  ".into()),
            is_admin: None,
        };
        assert!(matches!(
            validate_set_claim(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn bulk_entry_collects_profile_fields() {
        let entry: BulkUserEntry = serde_json::from_value(serde_json::json!({
            "identifier": "a@example.org",
            "password": "secret1",
            "displayName": "A",
            "group": 3
        }))
        .unwrap();
        assert_eq!(entry.identifier.as_deref(), Some("a@example.org"));
        assert_eq!(entry.profile.len(), 2);
        assert_eq!(entry.profile["group"], 3);
    }

    #[test]
    fn bulk_result_omits_absent_fields() {
        let ok = serde_json::to_value(BulkCreateResult::success("a", "u1".into())).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"identifier": "a", "status": "success", "uid": "u1"})
        );
        let err = serde_json::to_value(BulkCreateResult::failure(None, "boom")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({"identifier": null, "status": "error", "error": "boom"})
        );
    }
}
