//! Event routes: admin authoring and lifecycle, alumni detail view.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{CreateEventRequest, EventResponse, EventStatus, NewEvent};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Caller;

/// Create an event in draft.
///
/// POST /api/v1/admin/events
pub async fn create_event(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    caller.require_admin()?;
    request.validate()?;

    let event = state
        .services
        .lifecycle
        .create(NewEvent::from(request), Utc::now())
        .await?;

    tracing::info!(
        event_id = %event.id,
        created_by = %caller.alumni_id,
        capacity = ?event.capacity,
        "Event created"
    );

    Ok((
        StatusCode::CREATED,
        Json(EventResponse::new(event, Default::default())),
    ))
}

/// Event detail with remaining capacity and attendance counts.
///
/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state.services.lifecycle.get(event_id).await?;
    // Drafts are not visible to alumni yet.
    if event.status == EventStatus::Draft && !caller.is_admin() {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }
    let attendance = state.services.ledger.summary(event_id).await?;
    Ok(Json(EventResponse::new(event, attendance)))
}

async fn transition(
    state: &AppState,
    caller: &Caller,
    event_id: Uuid,
    next: EventStatus,
) -> Result<Json<EventResponse>, ApiError> {
    caller.require_admin()?;
    let event = state
        .services
        .lifecycle
        .transition(event_id, next, Utc::now())
        .await?;
    let attendance = state.services.ledger.summary(event_id).await?;
    Ok(Json(EventResponse::new(event, attendance)))
}

/// POST /api/v1/admin/events/:event_id/publish
pub async fn publish_event(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    transition(&state, &caller, event_id, EventStatus::Published).await
}

/// POST /api/v1/admin/events/:event_id/start
pub async fn start_event(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    transition(&state, &caller, event_id, EventStatus::Ongoing).await
}

/// POST /api/v1/admin/events/:event_id/complete
pub async fn complete_event(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    transition(&state, &caller, event_id, EventStatus::Completed).await
}

/// POST /api/v1/admin/events/:event_id/cancel
pub async fn cancel_event(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    transition(&state, &caller, event_id, EventStatus::Cancelled).await
}
