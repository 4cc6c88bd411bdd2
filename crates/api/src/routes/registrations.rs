//! Registration routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{ListRegistrationsQuery, RegisterForEventRequest, Registration, RegistrationPage};
use shared::pagination::decode_cursor;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{Caller, OptionalJson};
use crate::middleware::metrics::record_registration;

/// Register the caller for an event.
///
/// POST /api/v1/events/:event_id/registrations
///
/// The body may be omitted; `fee_paid` then defaults to false. It is
/// ignored for free events. A malformed body is rejected.
pub async fn register_for_event(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
    OptionalJson(request): OptionalJson<RegisterForEventRequest>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let result = state
        .services
        .ledger
        .register(event_id, &caller.alumnus, request.fee_paid, Utc::now())
        .await;

    match result {
        Ok(registration) => {
            record_registration("confirmed");
            Ok((StatusCode::CREATED, Json(registration)))
        }
        Err(err) => {
            record_registration(err.code());
            Err(err.into())
        }
    }
}

/// Cancel a registration and release its seat.
///
/// DELETE /api/v1/registrations/:registration_id
///
/// Allowed for the registrant and for admins.
pub async fn cancel_registration(
    State(state): State<AppState>,
    caller: Caller,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<Registration>, ApiError> {
    let existing = state.services.ledger.get(registration_id).await?;
    caller.require_owner_or_admin(existing.alumni_id)?;

    let cancelled = state
        .services
        .ledger
        .cancel(registration_id, Utc::now())
        .await?;

    tracing::info!(
        registration_id = %registration_id,
        cancelled_by = %caller.alumni_id,
        "Registration cancelled by request"
    );

    Ok(Json(cancelled))
}

/// Roster of an event in registration order.
///
/// GET /api/v1/admin/events/:event_id/registrations?cursor=&limit=
pub async fn list_registrations(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Json<RegistrationPage>, ApiError> {
    caller.require_admin()?;

    let after = query.cursor.as_deref().map(decode_cursor).transpose()?;
    let page = state
        .services
        .ledger
        .list(event_id, after, query.limit)
        .await?;

    Ok(Json(page))
}
