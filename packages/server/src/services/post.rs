use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::post;
use crate::error::AppError;
use crate::extractors::auth::{AuthUser, Role};
use crate::models::post::{CreatePostRequest, validate_create_post};

/// Announcements shown to every member.
pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, caller, request), fields(uid = %caller.uid))]
    pub async fn create_post(
        &self,
        caller: &AuthUser,
        request: &CreatePostRequest,
    ) -> Result<post::Model, AppError> {
        caller.require_role(Role::Admin)?;
        let (title, description) = validate_create_post(request)?;

        let model = post::ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(title),
            description: Set(description),
            author_uid: Set(caller.uid.clone()),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(&self.db).await?)
    }

    /// Newest first.
    pub async fn list_posts(&self) -> Result<Vec<post::Model>, AppError> {
        Ok(post::Entity::find()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await?)
    }
}
