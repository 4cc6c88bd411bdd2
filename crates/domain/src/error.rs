//! Caller-facing errors of the registration and attendance core.
//!
//! Every variant is a business-rule outcome or a benign race loss and is
//! reported as-is. Only `Storage` reflects an infrastructure failure; the
//! core never retries it.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::EventStatus;
use crate::services::eligibility::IneligibleReason;
use crate::store::StoreError;

/// How a registration was looked up, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationLookup {
    ById(Uuid),
    ByAttendee { event_id: Uuid, alumni_id: Uuid },
}

impl std::fmt::Display for RegistrationLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationLookup::ById(id) => write!(f, "registration {}", id),
            RegistrationLookup::ByAttendee {
                event_id,
                alumni_id,
            } => write!(
                f,
                "confirmed registration of alumnus {} for event {}",
                alumni_id, event_id
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum EventCoreError {
    #[error("Event {event_id} not found")]
    EventNotFound { event_id: Uuid },

    #[error("Event {event_id} cannot move from {from} to {to}")]
    InvalidTransition {
        event_id: Uuid,
        from: EventStatus,
        to: EventStatus,
    },

    #[error("Registration for event {event_id} is closed (status: {status})")]
    RegistrationClosed { event_id: Uuid, status: EventStatus },

    #[error("Alumnus {alumni_id} is not eligible for event {event_id}: {reason}")]
    NotEligible {
        event_id: Uuid,
        alumni_id: Uuid,
        reason: IneligibleReason,
    },

    #[error("Alumnus {alumni_id} is already registered for event {event_id}")]
    DuplicateRegistration { event_id: Uuid, alumni_id: Uuid },

    #[error("Event {event_id} is full (capacity {capacity})")]
    CapacityExceeded { event_id: Uuid, capacity: i32 },

    #[error("No {lookup} exists")]
    RegistrationNotFound { lookup: RegistrationLookup },

    #[error("Registration {registration_id} is already cancelled")]
    AlreadyCancelled { registration_id: Uuid },

    #[error("Registration {registration_id} was cancelled")]
    RegistrationCancelled { registration_id: Uuid },

    #[error("Registration {registration_id} has attendance recorded and cannot be cancelled")]
    AttendanceAlreadyMarked { registration_id: Uuid },

    #[error("Attendance token is not valid for event {event_id}")]
    TokenInvalid { event_id: Uuid },

    #[error("Attendance token for event {event_id} expired at {expired_at}")]
    TokenExpired {
        event_id: Uuid,
        expired_at: DateTime<Utc>,
    },

    #[error("Event {event_id} does not accept attendance (status: {status})")]
    EventNotAttendable { event_id: Uuid, status: EventStatus },

    #[error("Token lifetime of {minutes} minutes is outside 1..={max}")]
    InvalidTokenTtl { minutes: i64, max: i64 },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl EventCoreError {
    /// Stable machine-readable code for API responses and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            EventCoreError::EventNotFound { .. } => "event_not_found",
            EventCoreError::InvalidTransition { .. } => "invalid_transition",
            EventCoreError::RegistrationClosed { .. } => "registration_closed",
            EventCoreError::NotEligible { .. } => "not_eligible",
            EventCoreError::DuplicateRegistration { .. } => "duplicate_registration",
            EventCoreError::CapacityExceeded { .. } => "capacity_exceeded",
            EventCoreError::RegistrationNotFound { .. } => "registration_not_found",
            EventCoreError::AlreadyCancelled { .. } => "already_cancelled",
            EventCoreError::RegistrationCancelled { .. } => "registration_cancelled",
            EventCoreError::AttendanceAlreadyMarked { .. } => "attendance_already_marked",
            EventCoreError::TokenInvalid { .. } => "token_invalid",
            EventCoreError::TokenExpired { .. } => "token_expired",
            EventCoreError::EventNotAttendable { .. } => "event_not_attendable",
            EventCoreError::InvalidTokenTtl { .. } => "invalid_token_ttl",
            EventCoreError::InvariantViolation(_) => "invariant_violation",
            EventCoreError::Storage(_) => "storage_error",
        }
    }

    /// Only transient storage failures may be retried, and by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EventCoreError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_context() {
        let event_id = Uuid::new_v4();
        let err = EventCoreError::CapacityExceeded {
            event_id,
            capacity: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains(&event_id.to_string()));
        assert!(msg.contains("capacity 2"));
    }

    #[test]
    fn test_registration_lookup_display() {
        let id = Uuid::new_v4();
        let err = EventCoreError::RegistrationNotFound {
            lookup: RegistrationLookup::ById(id),
        };
        assert_eq!(err.to_string(), format!("No registration {} exists", id));

        let err = EventCoreError::RegistrationNotFound {
            lookup: RegistrationLookup::ByAttendee {
                event_id: Uuid::nil(),
                alumni_id: Uuid::nil(),
            },
        };
        assert!(err.to_string().contains("confirmed registration of alumnus"));
    }

    #[test]
    fn test_transition_display() {
        let err = EventCoreError::InvalidTransition {
            event_id: Uuid::nil(),
            from: EventStatus::Completed,
            to: EventStatus::Published,
        };
        assert!(err.to_string().contains("from completed to published"));
    }

    #[test]
    fn test_codes_are_snake_case() {
        let errors = [
            EventCoreError::EventNotFound {
                event_id: Uuid::nil(),
            },
            EventCoreError::TokenInvalid {
                event_id: Uuid::nil(),
            },
            EventCoreError::InvariantViolation("x".to_string()),
        ];
        for err in errors {
            assert!(err
                .code()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn test_only_storage_is_retryable() {
        assert!(EventCoreError::Storage(StoreError::Backend("timeout".into())).is_retryable());
        assert!(!EventCoreError::CapacityExceeded {
            event_id: Uuid::nil(),
            capacity: 1
        }
        .is_retryable());
    }
}
