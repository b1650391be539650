//! Object reads for the filesystem storage backend.
//!
//! The filesystem store hands out URLs pointing back at this server:
//! `/files/{key}?expires=..&signature=..` for signed reads and
//! `/public/{key}` for objects stored as public. With the S3 backend both
//! routes answer 404, since the bucket serves its own URLs.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::Response;
use chrono::Utc;
use common::ObjectInfo;
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

const SIGNED_CACHE_CONTROL: &str = "private, max-age=3600";
const PUBLIC_CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Deserialize)]
pub struct SignedUrlQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

/// Serve an object behind a signed URL.
#[instrument(skip(state, query))]
pub async fn serve_signed(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedUrlQuery>,
) -> Result<Response, AppError> {
    let signer = state
        .url_signer
        .as_ref()
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
        return Err(AppError::PermissionDenied);
    };
    if !signer.verify(&key, expires, signature, Utc::now()) {
        return Err(AppError::PermissionDenied);
    }

    let info = state
        .store
        .head(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    let content = state.store.get(&key).await?;

    object_response(&info, content, SIGNED_CACHE_CONTROL)
}

/// Serve an object that was stored as public.
#[instrument(skip(state))]
pub async fn serve_public(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    if state.url_signer.is_none() {
        return Err(AppError::NotFound("File not found".into()));
    }

    let info = state
        .store
        .head(&key)
        .await?
        .filter(|info| info.public)
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    let content = state.store.get(&key).await?;

    object_response(&info, content, PUBLIC_CACHE_CONTROL)
}

fn object_response(
    info: &ObjectInfo,
    content: Vec<u8>,
    default_cache_control: &str,
) -> Result<Response, AppError> {
    let content_type = info.content_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&info.key)
            .first_or_octet_stream()
            .to_string()
    });
    let cache_control = info
        .cache_control
        .as_deref()
        .unwrap_or(default_cache_control);

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}
