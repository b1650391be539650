use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::{
    CreateEventRequest, EventListResponse, EventMutationResponse, EventResponse,
    UpdateEventRequest,
};
use crate::models::shared::SuccessResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "Returns every event, newest event date first.",
    responses(
        (status = 200, description = "Events", body = EventListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(uid = %auth_user.uid))]
pub async fn list_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<EventListResponse>, AppError> {
    let events = state.events().list_events().await?;
    Ok(Json(EventListResponse {
        events: events.into_iter().map(EventResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Stores the thumbnail (base64, a `data:` URL prefix is accepted) as a public WebP object and creates the event. Requires the admin claim.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventMutationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 500, description = "Storage failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(uid = %auth_user.uid))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.events().create_event(&auth_user, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(EventMutationResponse {
            success: true,
            message: "Event created successfully".into(),
            event_id: event.id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "Partial update: only supplied fields change. A new thumbnail replaces the old object, which is then deleted. Requires the admin claim.",
    params(("id" = String, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventMutationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(uid = %auth_user.uid, event_id = %id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventMutationResponse>, AppError> {
    let event = state
        .events()
        .update_event(&auth_user, &id, &payload)
        .await?;

    Ok(Json(EventMutationResponse {
        success: true,
        message: "Event updated successfully".into(),
        event_id: event.id,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Deletes the event and its thumbnail object. Requires the admin claim.",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(uid = %auth_user.uid, event_id = %id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.events().delete_event(&auth_user, &id).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: "Event deleted successfully".into(),
    }))
}
