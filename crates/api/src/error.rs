use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::EventCoreError;
use serde::Serialize;
use shared::jwt::JwtError;
use shared::pagination::CursorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<Vec<ValidationDetail>>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Core(#[from] EventCoreError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

/// Status for each core error kind.
fn core_status(err: &EventCoreError) -> StatusCode {
    match err {
        EventCoreError::EventNotFound { .. } | EventCoreError::RegistrationNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        EventCoreError::InvalidTransition { .. }
        | EventCoreError::RegistrationClosed { .. }
        | EventCoreError::DuplicateRegistration { .. }
        | EventCoreError::CapacityExceeded { .. }
        | EventCoreError::AlreadyCancelled { .. }
        | EventCoreError::RegistrationCancelled { .. }
        | EventCoreError::AttendanceAlreadyMarked { .. }
        | EventCoreError::EventNotAttendable { .. } => StatusCode::CONFLICT,
        EventCoreError::NotEligible { .. } => StatusCode::FORBIDDEN,
        EventCoreError::TokenInvalid { .. } => StatusCode::UNAUTHORIZED,
        EventCoreError::TokenExpired { .. } => StatusCode::GONE,
        EventCoreError::InvalidTokenTtl { .. } => StatusCode::BAD_REQUEST,
        EventCoreError::InvariantViolation(_) | EventCoreError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Validation { message, details } => {
                (StatusCode::BAD_REQUEST, "validation_error", message, details)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
            ApiError::Core(err) => {
                let status = core_status(&err);
                let message = if status.is_server_error() {
                    tracing::error!(code = err.code(), error = %err, "Event core failure");
                    "An internal error occurred".to_string()
                } else {
                    err.to_string()
                };
                (status, err.code(), message, None)
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".into()),
            JwtError::InvalidKey(msg) => ApiError::Internal(format!("JWT key error: {}", msg)),
            _ => ApiError::Unauthorized("Invalid token".into()),
        }
    }
}

impl From<CursorError> for ApiError {
    fn from(err: CursorError) -> Self {
        ApiError::Validation {
            message: err.to_string(),
            details: Some(vec![ValidationDetail {
                field: "cursor".into(),
                message: err.to_string(),
            }]),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = match details.as_slice() {
            [only] => only.message.clone(),
            _ => format!("{} validation errors", details.len()),
        };

        ApiError::Validation {
            message,
            details: Some(details),
        }
    }
}
