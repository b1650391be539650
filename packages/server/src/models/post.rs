use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::post;
use crate::error::AppError;
use crate::models::shared::non_blank;

const MAX_TITLE_LEN: usize = 200;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePostRequest {
    #[schema(example = "Schema för nollningen")]
    pub title: Option<String>,
    #[schema(example = "Första veckan börjar med uppropet.")]
    pub description: Option<String>,
}

/// Validated `(title, description)` of a new post.
pub fn validate_create_post(payload: &CreatePostRequest) -> Result<(String, String), AppError> {
    let (Some(title), Some(description)) = (
        non_blank(payload.title.as_deref()),
        non_blank(payload.description.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: title and description are required".into(),
        ));
    };
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok((title.to_string(), description.to_string()))
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author_uid: String,
    pub created_at: DateTime<Utc>,
}

impl From<post::Model> for PostResponse {
    fn from(m: post::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            author_uid: m.author_uid,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostResponse {
    #[schema(example = true)]
    pub success: bool,
    pub post_id: Uuid,
}
