//! Event domain model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{normalize_labels, validate_labels, validate_not_blank};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::registration::AttendanceSummary;

/// Publication status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    /// Completed and cancelled events accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Cancelled)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "draft"),
            EventStatus::Published => write!(f, "published"),
            EventStatus::Ongoing => write!(f, "ongoing"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Half-open interval `[opens_at, closes_at)` during which registration is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationWindow {
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

impl RegistrationWindow {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.opens_at <= now && now < self.closes_at
    }
}

/// Who may register for an event. Empty sets match everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case", default)]
pub struct EligibilityRules {
    #[validate(custom(function = "validate_labels"))]
    pub batches: BTreeSet<String>,
    #[validate(custom(function = "validate_labels"))]
    pub departments: BTreeSet<String>,
    pub requires_membership: bool,
    #[validate(custom(function = "validate_labels"))]
    pub required_tiers: BTreeSet<String>,
}

/// Event domain model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub status: EventStatus,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub registration_window: RegistrationWindow,
    /// `None` means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    pub current_attendees: i32,
    pub eligibility: EligibilityRules,
    /// Fee in minor currency units.
    pub registration_fee_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Remaining seats (None if unlimited).
    pub fn remaining_capacity(&self) -> Option<i32> {
        self.capacity
            .map(|cap| (cap - self.current_attendees).max(0))
    }

    /// Check if the event has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.current_attendees >= cap)
    }

    pub fn is_free(&self) -> bool {
        self.registration_fee_cents == 0
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            event_id: self.id,
            title: self.title.clone(),
            start_date_time: self.start_date_time,
        }
    }
}

/// Minimal event information shown before an attendee confirms a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventSummary {
    pub event_id: Uuid,
    pub title: String,
    pub start_date_time: DateTime<Utc>,
}

/// Fields required to insert an event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub registration_window: RegistrationWindow,
    pub capacity: Option<i32>,
    pub eligibility: EligibilityRules,
    pub registration_fee_cents: i64,
}

/// Request to create a new event (admin authoring collaborator).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_schedule"))]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub registration_opens_at: DateTime<Utc>,
    pub registration_closes_at: DateTime<Utc>,
    #[validate(range(min = 1, max = 100000, message = "capacity must be between 1 and 100000"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub eligibility: EligibilityRules,
    #[validate(range(min = 0, message = "registration_fee_cents must not be negative"))]
    #[serde(default)]
    pub registration_fee_cents: i64,
}

fn validate_schedule(request: &CreateEventRequest) -> Result<(), ValidationError> {
    if request.end_date_time <= request.start_date_time {
        let mut err = ValidationError::new("schedule");
        err.message = Some("end_date_time must be after start_date_time".into());
        return Err(err);
    }
    if request.registration_closes_at <= request.registration_opens_at {
        let mut err = ValidationError::new("registration_window");
        err.message = Some("registration_closes_at must be after registration_opens_at".into());
        return Err(err);
    }
    if request.registration_closes_at > request.end_date_time {
        let mut err = ValidationError::new("registration_window");
        err.message = Some("Registration must close before the event ends".into());
        return Err(err);
    }
    Ok(())
}

impl From<CreateEventRequest> for NewEvent {
    fn from(request: CreateEventRequest) -> Self {
        Self {
            title: request.title.trim().to_string(),
            start_date_time: request.start_date_time,
            end_date_time: request.end_date_time,
            registration_window: RegistrationWindow {
                opens_at: request.registration_opens_at,
                closes_at: request.registration_closes_at,
            },
            capacity: request.capacity,
            eligibility: EligibilityRules {
                batches: normalize_labels(&request.eligibility.batches),
                departments: normalize_labels(&request.eligibility.departments),
                requires_membership: request.eligibility.requires_membership,
                required_tiers: normalize_labels(&request.eligibility.required_tiers),
            },
            registration_fee_cents: request.registration_fee_cents,
        }
    }
}

/// Event detail returned to portal clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_capacity: Option<i32>,
    pub attendance: AttendanceSummary,
}

impl EventResponse {
    pub fn new(event: Event, attendance: AttendanceSummary) -> Self {
        Self {
            remaining_capacity: event.remaining_capacity(),
            event,
            attendance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 1, 18, 0, 0).unwrap()
    }

    fn create_request() -> CreateEventRequest {
        let start = base_time();
        CreateEventRequest {
            title: "Class of 2015 Reunion".to_string(),
            start_date_time: start,
            end_date_time: start + Duration::hours(4),
            registration_opens_at: start - Duration::days(30),
            registration_closes_at: start - Duration::days(1),
            capacity: Some(120),
            eligibility: EligibilityRules::default(),
            registration_fee_cents: 2500,
        }
    }

    fn event_with(capacity: Option<i32>, current_attendees: i32) -> Event {
        let new: NewEvent = create_request().into();
        Event {
            id: Uuid::new_v4(),
            title: new.title,
            status: EventStatus::Published,
            start_date_time: new.start_date_time,
            end_date_time: new.end_date_time,
            registration_window: new.registration_window,
            capacity,
            current_attendees,
            eligibility: new.eligibility,
            registration_fee_cents: 0,
            created_at: base_time(),
            updated_at: base_time(),
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EventStatus::Draft.to_string(), "draft");
        assert_eq!(EventStatus::Published.to_string(), "published");
        assert_eq!(EventStatus::Ongoing.to_string(), "ongoing");
        assert_eq!(EventStatus::Completed.to_string(), "completed");
        assert_eq!(EventStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_status_terminal() {
        assert!(EventStatus::Completed.is_terminal());
        assert!(EventStatus::Cancelled.is_terminal());
        assert!(!EventStatus::Draft.is_terminal());
        assert!(!EventStatus::Published.is_terminal());
        assert!(!EventStatus::Ongoing.is_terminal());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&EventStatus::Ongoing).unwrap();
        assert_eq!(json, "\"ongoing\"");
        let parsed: EventStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, EventStatus::Cancelled);
    }

    #[test]
    fn test_registration_window_is_half_open() {
        let window = RegistrationWindow {
            opens_at: base_time(),
            closes_at: base_time() + Duration::hours(1),
        };
        assert!(window.contains(base_time()));
        assert!(window.contains(base_time() + Duration::minutes(59)));
        assert!(!window.contains(base_time() + Duration::hours(1)));
        assert!(!window.contains(base_time() - Duration::seconds(1)));
    }

    #[test]
    fn test_remaining_capacity() {
        assert_eq!(event_with(Some(10), 7).remaining_capacity(), Some(3));
        assert_eq!(event_with(Some(10), 10).remaining_capacity(), Some(0));
        assert_eq!(event_with(None, 500).remaining_capacity(), None);
    }

    #[test]
    fn test_is_full() {
        assert!(event_with(Some(2), 2).is_full());
        assert!(!event_with(Some(2), 1).is_full());
        assert!(!event_with(None, 10_000).is_full());
    }

    #[test]
    fn test_create_request_validation() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_blank_title() {
        let mut request = create_request();
        request.title = "   ".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_zero_capacity() {
        let mut request = create_request();
        request.capacity = Some(0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_negative_fee() {
        let mut request = create_request();
        request.registration_fee_cents = -1;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_inverted_schedule() {
        let mut request = create_request();
        request.end_date_time = request.start_date_time - Duration::hours(1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_window_after_event_end() {
        let mut request = create_request();
        request.registration_closes_at = request.end_date_time + Duration::hours(1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_blank_batch_label() {
        let mut request = create_request();
        request.eligibility.batches.insert("  ".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_new_event_trims_title() {
        let mut request = create_request();
        request.title = "  Homecoming  ".to_string();
        let new: NewEvent = request.into();
        assert_eq!(new.title, "Homecoming");
    }

    #[test]
    fn test_new_event_normalizes_eligibility_labels() {
        let mut request = create_request();
        request.eligibility.departments.insert(" Computer Science ".to_string());
        request.eligibility.departments.insert("computer science".to_string());
        let new: NewEvent = request.into();
        assert_eq!(new.eligibility.departments.len(), 1);
        assert!(new.eligibility.departments.contains("computer science"));
    }

    #[test]
    fn test_event_response_includes_remaining_capacity() {
        let response = EventResponse::new(
            event_with(Some(5), 3),
            AttendanceSummary {
                confirmed: 3,
                attended: 1,
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["remaining_capacity"], 2);
        assert_eq!(json["attendance"]["attended"], 1);
        assert_eq!(json["status"], "published");
    }
}
