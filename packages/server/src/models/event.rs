use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::event;
use crate::error::AppError;
use crate::models::shared::{
    decode_webp_payload, non_blank, optional_non_blank, parse_event_date, validate_http_url,
};

/// Request body for creating an event.
///
/// Every field is required; they are optional here so that a missing field
/// yields a `VALIDATION_ERROR` instead of a deserialization failure.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[schema(example = "Nollningsfest")]
    pub name: Option<String>,
    /// Link to the externally hosted photos.
    #[schema(example = "https://drive.google.com/drive/folders/abc")]
    pub drive_url: Option<String>,
    /// WebP thumbnail as base64, optionally with a `data:image/webp;base64,` prefix.
    #[schema(example = "data:image/webp;base64,UklGR...")]
    pub thumbnail_data: Option<String>,
    /// Original file name of the thumbnail; its stem becomes part of the key.
    #[schema(example = "fest.jpg")]
    pub thumbnail_file_name: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DDTHH:MM` (UTC).
    #[schema(example = "2024-08-20T18:00")]
    pub event_date: Option<String>,
}

/// Request body for updating an event. Only supplied fields change.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[schema(example = "Nollningsfest")]
    pub name: Option<String>,
    #[schema(example = "https://drive.google.com/drive/folders/abc")]
    pub drive_url: Option<String>,
    #[schema(example = "data:image/webp;base64,UklGR...")]
    pub thumbnail_data: Option<String>,
    #[schema(example = "fest.jpg")]
    pub thumbnail_file_name: Option<String>,
    #[schema(example = "2024-08-21T18:00")]
    pub event_date: Option<String>,
}

/// A decoded thumbnail, already transcoded to WebP by the client.
#[derive(Debug, Clone)]
pub struct ThumbnailUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Validated input for [`crate::services::EventService::create_event`].
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub drive_url: String,
    pub thumbnail: ThumbnailUpload,
    pub event_date: DateTime<Utc>,
}

/// Validated input for [`crate::services::EventService::update_event`].
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub drive_url: Option<String>,
    pub thumbnail: Option<ThumbnailUpload>,
    pub event_date: Option<DateTime<Utc>>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.drive_url.is_none()
            && self.thumbnail.is_none()
            && self.event_date.is_none()
    }
}

pub fn validate_create_event(payload: &CreateEventRequest) -> Result<NewEvent, AppError> {
    let (Some(name), Some(drive_url), Some(data), Some(file_name), Some(event_date)) = (
        non_blank(payload.name.as_deref()),
        non_blank(payload.drive_url.as_deref()),
        non_blank(payload.thumbnail_data.as_deref()),
        non_blank(payload.thumbnail_file_name.as_deref()),
        non_blank(payload.event_date.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: name, driveUrl, thumbnailData, thumbnailFileName, and eventDate are required".into(),
        ));
    };

    validate_http_url(drive_url, "driveUrl")?;

    Ok(NewEvent {
        name: name.to_string(),
        drive_url: drive_url.to_string(),
        thumbnail: ThumbnailUpload {
            bytes: decode_webp_payload(data, "thumbnailData")?,
            file_name: file_name.to_string(),
        },
        event_date: parse_event_date(event_date)?,
    })
}

pub fn validate_update_event(payload: &UpdateEventRequest) -> Result<EventUpdate, AppError> {
    let name = optional_non_blank(payload.name.as_deref(), "name")?;
    let drive_url = optional_non_blank(payload.drive_url.as_deref(), "driveUrl")?;
    if let Some(url) = drive_url {
        validate_http_url(url, "driveUrl")?;
    }
    let event_date = optional_non_blank(payload.event_date.as_deref(), "eventDate")?
        .map(parse_event_date)
        .transpose()?;

    let thumbnail = match optional_non_blank(payload.thumbnail_data.as_deref(), "thumbnailData")? {
        None => None,
        Some(data) => {
            let file_name = non_blank(payload.thumbnail_file_name.as_deref()).ok_or_else(|| {
                AppError::Validation("thumbnailFileName is required with thumbnailData".into())
            })?;
            Some(ThumbnailUpload {
                bytes: decode_webp_payload(data, "thumbnailData")?,
                file_name: file_name.to_string(),
            })
        }
    };

    Ok(EventUpdate {
        name: name.map(str::to_string),
        drive_url: drive_url.map(str::to_string),
        thumbnail,
        event_date,
    })
}

/// Parse an event id from the path. Malformed ids cannot exist, so they are
/// reported as not found.
pub fn parse_event_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound("Event not found".into()))
}

/// Snapshot of the admin who created an event.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadedBy {
    #[schema(example = "0190f5a2c1e97c3d9b6a4f1e2d3c4b5a")]
    pub uid: String,
    #[schema(example = "Loke")]
    pub username: String,
}

/// An event as returned by the API.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Uuid,
    #[schema(example = "Nollningsfest")]
    pub name: String,
    #[schema(example = "https://drive.google.com/drive/folders/abc")]
    pub drive_url: String,
    pub thumbnail_url: String,
    pub event_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub uploaded_by: UploadedBy,
}

impl From<event::Model> for EventResponse {
    fn from(m: event::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            drive_url: m.drive_url,
            thumbnail_url: m.thumbnail_url,
            event_date: m.event_date,
            created_at: m.created_at,
            uploaded_by: UploadedBy {
                uid: m.uploaded_by_uid,
                username: m.uploaded_by_username,
            },
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub events: Vec<EventResponse>,
}

/// Result of creating or updating an event.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventMutationResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Event created successfully")]
    pub message: String,
    pub event_id: Uuid,
}
