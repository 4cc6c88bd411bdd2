//! Attendance routes: token issuance for venue QR codes and the attendee's
//! verify/mark flow.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    build_qr_data, AttendanceMark, EventSummary, IssueAttendanceTokenRequest,
    IssueAttendanceTokenResponse, MarkAttendanceRequest, RevokeAttendanceTokenResponse,
    VerifyAttendanceQuery,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{Caller, OptionalJson};
use crate::middleware::metrics::{record_attendance_mark, record_token_issued};

/// Issue a fresh attendance token, revoking the previous one.
///
/// POST /api/v1/admin/events/:event_id/attendance-token
///
/// The plaintext token appears only in this response.
pub async fn issue_attendance_token(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
    OptionalJson(request): OptionalJson<IssueAttendanceTokenRequest>,
) -> Result<(StatusCode, Json<IssueAttendanceTokenResponse>), ApiError> {
    caller.require_admin()?;
    request.validate()?;

    let token = state
        .services
        .tokens
        .issue(
            event_id,
            request.ttl_minutes,
            Some(caller.alumni_id),
            Utc::now(),
        )
        .await?;
    record_token_issued();

    let qr_data = build_qr_data(&state.config.server.app_base_url, event_id, &token.token);

    Ok((
        StatusCode::CREATED,
        Json(IssueAttendanceTokenResponse { token, qr_data }),
    ))
}

/// Revoke the event's live token. Idempotent.
///
/// DELETE /api/v1/admin/events/:event_id/attendance-token
pub async fn revoke_attendance_token(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> Result<Json<RevokeAttendanceTokenResponse>, ApiError> {
    caller.require_admin()?;

    let revoked = state.services.tokens.revoke(event_id, Utc::now()).await?;

    Ok(Json(RevokeAttendanceTokenResponse { event_id, revoked }))
}

/// Check a scanned token before the attendee confirms.
///
/// GET /api/v1/events/:event_id/attendance/verify?token=
pub async fn verify_attendance_token(
    State(state): State<AppState>,
    _caller: Caller,
    Path(event_id): Path<Uuid>,
    Query(query): Query<VerifyAttendanceQuery>,
) -> Result<Json<EventSummary>, ApiError> {
    let summary = state
        .services
        .verifier
        .verify(event_id, &query.token, Utc::now())
        .await?;
    Ok(Json(summary))
}

/// Mark the caller as present.
///
/// POST /api/v1/events/:event_id/attendance
///
/// Repeating the call returns the original mark with `newly_marked: false`.
pub async fn mark_attendance(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
    Json(request): Json<MarkAttendanceRequest>,
) -> Result<Json<AttendanceMark>, ApiError> {
    request.validate()?;

    let result = state
        .services
        .verifier
        .mark_attendance(event_id, &request.token, caller.alumni_id, Utc::now())
        .await;

    match result {
        Ok(mark) => {
            record_attendance_mark(if mark.newly_marked {
                "marked"
            } else {
                "already_marked"
            });
            Ok(Json(mark))
        }
        Err(err) => {
            record_attendance_mark(err.code());
            Err(err.into())
        }
    }
}
