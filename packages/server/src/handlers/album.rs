use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, Role};
use crate::extractors::json::AppJson;
use crate::models::album::{
    AlbumListResponse, AlbumPage, AlbumUploadResponse, DeleteAlbumRequest, DeleteAlbumResponse,
    NewAlbum, UploadAlbumForm,
};
use crate::state::AppState;

/// Body limit for album uploads, which carry every page of a rasterized PDF.
pub fn album_body_limit(limit: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(limit)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Albums",
    operation_id = "listAlbums",
    summary = "List Bländare albums",
    description = "Returns every album, oldest first, with signed page URLs valid for 24 hours. `allImages` only contains albums that have at least one page.",
    responses(
        (status = 200, description = "Albums", body = AlbumListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Storage failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(uid = %auth_user.uid))]
pub async fn list_albums(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AlbumListResponse>, AppError> {
    Ok(Json(state.albums().list_albums().await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Albums",
    operation_id = "uploadAlbum",
    summary = "Upload a Bländare album",
    description = "Multipart upload of pre-rendered page images (`images[]`), the folder name (`pdfName`) and an optional `displayName`. Fails with 409 if the sanitized folder already exists. Requires the admin claim.",
    request_body(content = UploadAlbumForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Album stored", body = AlbumUploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Album already exists (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Storage failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(uid = %auth_user.uid))]
pub async fn upload_album(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;

    let mut album = NewAlbum::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images[]" | "images" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?;
                album.pages.push(AlbumPage {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "pdfName" => {
                album.raw_name = Some(read_text(field).await?);
            }
            "displayName" => {
                album.display_name = Some(read_text(field).await?);
            }
            _ => {}
        }
    }

    let uploaded = state.albums().create_album(&auth_user, album).await?;

    Ok((
        StatusCode::CREATED,
        Json(AlbumUploadResponse {
            success: true,
            uploaded,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/",
    tag = "Albums",
    operation_id = "deleteAlbum",
    summary = "Delete a Bländare album",
    description = "Deletes every object in the album folder, including its metadata. Requires the admin claim.",
    request_body = DeleteAlbumRequest,
    responses(
        (status = 200, description = "Album deleted", body = DeleteAlbumResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Album not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(uid = %auth_user.uid))]
pub async fn delete_album(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteAlbumRequest>,
) -> Result<Json<DeleteAlbumResponse>, AppError> {
    Ok(Json(state.albums().delete_album(&auth_user, &payload).await?))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))
}
