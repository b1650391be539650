use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::post::{CreatePostRequest, CreatePostResponse, PostListResponse, PostResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Posts",
    operation_id = "listPosts",
    summary = "List announcements",
    description = "Returns every post, newest first.",
    responses(
        (status = 200, description = "Posts", body = PostListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(uid = %auth_user.uid))]
pub async fn list_posts(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostListResponse>, AppError> {
    let posts = state.posts().list_posts().await?;
    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Posts",
    operation_id = "createPost",
    summary = "Publish an announcement",
    description = "Requires the admin claim.",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = CreatePostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(uid = %auth_user.uid))]
pub async fn create_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = state.posts().create_post(&auth_user, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            success: true,
            post_id: post.id,
        }),
    ))
}
