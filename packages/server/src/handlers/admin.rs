use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::admin::{
    AdminListResponse, BulkCreateUsersRequest, BulkCreateUsersResponse, ProfilePictureResponse,
    PurgeUsersRequest, PurgeUsersResponse, SetClaimRequest, UpdateDisplayNameRequest,
    UserListResponse,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/setClaim",
    tag = "Admin",
    operation_id = "setAdminClaim",
    summary = "Grant or revoke the admin claim",
    description = "Sets the admin claim of a user. `isAdmin` defaults to `true`. The change applies to tokens issued afterwards.",
    request_body = SetClaimRequest,
    responses(
        (status = 200, description = "Claim updated", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(uid = %auth_user.uid))]
pub async fn set_claim(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetClaimRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = state.admin().set_admin_claim(&auth_user, &payload).await?;
    Ok(Json(MessageResponse { message }))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List users",
    description = "Every identity merged with its profile document and a signed profile picture URL.",
    responses(
        (status = 200, description = "Users", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(uid = %auth_user.uid))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = state.admin().list_users(&auth_user).await?;
    Ok(Json(UserListResponse { users }))
}

#[utoipa::path(
    get,
    path = "/admins",
    tag = "Admin",
    operation_id = "listAdmins",
    summary = "List admins",
    description = "The same records as `GET /admin/users`, restricted to users holding the admin claim.",
    responses(
        (status = 200, description = "Admins", body = AdminListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(uid = %auth_user.uid))]
pub async fn list_admins(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminListResponse>, AppError> {
    let admins = state.admin().list_admins(&auth_user).await?;
    Ok(Json(AdminListResponse { admins }))
}

#[utoipa::path(
    post,
    path = "/bulkCreateUsers",
    tag = "Admin",
    operation_id = "bulkCreateUsers",
    summary = "Create many users",
    description = "Creates an identity and a profile document per entry. Entries are processed one at a time and a failing entry never aborts the batch; inspect `results` for per-entry outcomes.",
    request_body = BulkCreateUsersRequest,
    responses(
        (status = 200, description = "Batch finished", body = BulkCreateUsersResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(uid = %auth_user.uid))]
pub async fn bulk_create_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<BulkCreateUsersRequest>,
) -> Result<Json<BulkCreateUsersResponse>, AppError> {
    Ok(Json(
        state.admin().bulk_create_users(&auth_user, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/purge",
    tag = "Admin",
    operation_id = "purgeUsers",
    summary = "Delete every user outside a whitelist",
    description = "Deletes the identity, profile document and profile picture of every user whose uid is not whitelisted. The whitelist must not be empty.",
    request_body = PurgeUsersRequest,
    responses(
        (status = 200, description = "Purge finished", body = PurgeUsersResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(uid = %auth_user.uid))]
pub async fn purge_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PurgeUsersRequest>,
) -> Result<Json<PurgeUsersResponse>, AppError> {
    Ok(Json(
        state
            .admin()
            .purge_non_whitelisted_users(&auth_user, &payload)
            .await?,
    ))
}

#[utoipa::path(
    put,
    path = "/users/{uid}/displayName",
    tag = "Admin",
    operation_id = "updateDisplayName",
    summary = "Change a user's display name",
    description = "Updates the identity and the profile document, creating the document if it does not exist.",
    params(("uid" = String, Path, description = "User ID")),
    request_body = UpdateDisplayNameRequest,
    responses(
        (status = 200, description = "Display name updated", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(uid = %auth_user.uid, target = %uid))]
pub async fn update_display_name(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    AppJson(payload): AppJson<UpdateDisplayNameRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .admin()
        .update_display_name(&auth_user, &uid, &payload)
        .await?;
    Ok(Json(MessageResponse {
        message: "Display name updated.".into(),
    }))
}

#[utoipa::path(
    put,
    path = "/users/{uid}/profilePicture",
    tag = "Admin",
    operation_id = "setProfilePicture",
    summary = "Replace a user's profile picture",
    description = "Stores the raw request body, which must be a square WebP image, as `profilepics/<uid>.webp`.",
    params(("uid" = String, Path, description = "User ID")),
    request_body(content = Vec<u8>, content_type = "image/webp"),
    responses(
        (status = 200, description = "Picture stored", body = ProfilePictureResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, body), fields(uid = %auth_user.uid, target = %uid, size = body.len()))]
pub async fn set_profile_picture(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    body: Bytes,
) -> Result<Json<ProfilePictureResponse>, AppError> {
    let key = state
        .admin()
        .set_profile_picture(&auth_user, &uid, body.to_vec())
        .await?;
    Ok(Json(ProfilePictureResponse {
        message: "Profile picture updated.".into(),
        key,
    }))
}
