use std::sync::Arc;

use chrono::Utc;
use common::{ObjectStore, PutOptions};
use sea_orm::*;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::entity::{event, user_profile};
use crate::error::AppError;
use crate::extractors::auth::{AuthUser, Role};
use crate::models::event::{
    CreateEventRequest, ThumbnailUpload, UpdateEventRequest, parse_event_id,
    validate_create_event, validate_update_event,
};
use crate::utils::filename::thumbnail_key;

const THUMBNAIL_CONTENT_TYPE: &str = "image/webp";
const UNKNOWN_UPLOADER: &str = "Unknown User";

/// Event lifecycle: thumbnail blob plus database row.
///
/// Blob and row writes are not transactional. A failed row write after an
/// upload removes the fresh blob on a best-effort basis; a failed cleanup is
/// only logged.
pub struct EventService {
    db: DatabaseConnection,
    store: Arc<dyn ObjectStore>,
}

impl EventService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn ObjectStore>) -> Self {
        Self { db, store }
    }

    /// All events, newest event date first.
    pub async fn list_events(&self) -> Result<Vec<event::Model>, AppError> {
        Ok(event::Entity::find()
            .order_by_desc(event::Column::EventDate)
            .order_by_desc(event::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    #[instrument(skip(self, caller, payload), fields(uid = %caller.uid))]
    pub async fn create_event(
        &self,
        caller: &AuthUser,
        payload: &CreateEventRequest,
    ) -> Result<event::Model, AppError> {
        caller.require_role(Role::Admin)?;
        let input = validate_create_event(payload)?;

        let (thumbnail_key, thumbnail_url) = self.upload_thumbnail(input.thumbnail).await?;
        let username = self.uploader_name(&caller.uid).await?;

        let model = event::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            drive_url: Set(input.drive_url),
            thumbnail_url: Set(thumbnail_url),
            thumbnail_key: Set(thumbnail_key.clone()),
            event_date: Set(input.event_date),
            created_at: Set(Utc::now()),
            uploaded_by_uid: Set(caller.uid.clone()),
            uploaded_by_username: Set(username),
        };

        match model.insert(&self.db).await {
            Ok(event) => Ok(event),
            Err(e) => {
                warn!(key = %thumbnail_key, "Event insert failed, thumbnail left orphaned");
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, caller, payload), fields(uid = %caller.uid))]
    pub async fn update_event(
        &self,
        caller: &AuthUser,
        id: &str,
        payload: &UpdateEventRequest,
    ) -> Result<event::Model, AppError> {
        caller.require_role(Role::Admin)?;
        let update = validate_update_event(payload)?;

        let existing = self.find_event(parse_event_id(id)?).await?;
        if update.is_empty() {
            return Ok(existing);
        }

        let old_key = existing.thumbnail_key.clone();
        let mut active: event::ActiveModel = existing.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(drive_url) = update.drive_url {
            active.drive_url = Set(drive_url);
        }
        if let Some(event_date) = update.event_date {
            active.event_date = Set(event_date);
        }

        let new_key = match update.thumbnail {
            Some(thumbnail) => {
                let (key, url) = self.upload_thumbnail(thumbnail).await?;
                active.thumbnail_key = Set(key.clone());
                active.thumbnail_url = Set(url);
                Some(key)
            }
            None => None,
        };

        let updated = match active.update(&self.db).await {
            Ok(model) => model,
            Err(e) => {
                if let Some(key) = &new_key {
                    self.delete_blob_best_effort(key).await;
                }
                return Err(match e {
                    DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => {
                        AppError::NotFound("Event not found".into())
                    }
                    other => other.into(),
                });
            }
        };

        if new_key.is_some() {
            self.delete_blob_best_effort(&old_key).await;
        }
        Ok(updated)
    }

    /// Delete the row, then the thumbnail blob. A failed blob delete does not
    /// fail the operation.
    #[instrument(skip(self, caller), fields(uid = %caller.uid))]
    pub async fn delete_event(&self, caller: &AuthUser, id: &str) -> Result<(), AppError> {
        caller.require_role(Role::Admin)?;

        let existing = self.find_event(parse_event_id(id)?).await?;
        let result = event::Entity::delete_by_id(existing.id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }

        self.delete_blob_best_effort(&existing.thumbnail_key).await;
        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> Result<event::Model, AppError> {
        event::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    /// Store a thumbnail under a fresh timestamped key and return
    /// `(key, public_url)`.
    async fn upload_thumbnail(
        &self,
        thumbnail: ThumbnailUpload,
    ) -> Result<(String, String), AppError> {
        let mut millis = Utc::now().timestamp_millis();
        let key = loop {
            let candidate = thumbnail_key(millis, &thumbnail.file_name);
            if !self.store.exists(&candidate).await? {
                break candidate;
            }
            millis += 1;
        };

        self.store
            .put(
                &key,
                thumbnail.bytes,
                PutOptions::new(THUMBNAIL_CONTENT_TYPE).public(),
            )
            .await?;
        let url = self.store.public_url(&key);
        Ok((key, url))
    }

    /// Display name of the caller from their profile document:
    /// `displayName`, then `username`, then `name`.
    async fn uploader_name(&self, uid: &str) -> Result<String, AppError> {
        let profile = user_profile::Entity::find_by_id(uid.to_string())
            .one(&self.db)
            .await?;

        Ok(profile
            .and_then(|p| {
                [p.display_name, p.username, p.name]
                    .into_iter()
                    .flatten()
                    .find(|v| !v.trim().is_empty())
            })
            .unwrap_or_else(|| UNKNOWN_UPLOADER.to_string()))
    }

    async fn delete_blob_best_effort(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            warn!(key, error = %e, "Failed to delete thumbnail");
        }
    }
}
