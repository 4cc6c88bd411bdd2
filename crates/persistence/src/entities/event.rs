//! Event entity for database operations.

use chrono::{DateTime, Utc};
use domain::models::{EligibilityRules, Event, EventStatus, RegistrationWindow};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for event status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Draft,
    Published,
    Ongoing,
    Completed,
    Cancelled,
}

impl From<EventStatusDb> for EventStatus {
    fn from(db: EventStatusDb) -> Self {
        match db {
            EventStatusDb::Draft => EventStatus::Draft,
            EventStatusDb::Published => EventStatus::Published,
            EventStatusDb::Ongoing => EventStatus::Ongoing,
            EventStatusDb::Completed => EventStatus::Completed,
            EventStatusDb::Cancelled => EventStatus::Cancelled,
        }
    }
}

impl From<EventStatus> for EventStatusDb {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Draft => EventStatusDb::Draft,
            EventStatus::Published => EventStatusDb::Published,
            EventStatus::Ongoing => EventStatusDb::Ongoing,
            EventStatus::Completed => EventStatusDb::Completed,
            EventStatus::Cancelled => EventStatusDb::Cancelled,
        }
    }
}

/// Database entity for events.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub title: String,
    pub status: EventStatusDb,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub registration_opens_at: DateTime<Utc>,
    pub registration_closes_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub current_attendees: i32,
    pub eligible_batches: Vec<String>,
    pub eligible_departments: Vec<String>,
    pub requires_membership: bool,
    pub required_tiers: Vec<String>,
    pub registration_fee_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list shared by every event query.
pub const EVENT_COLUMNS: &str = "id, title, status, start_date_time, end_date_time, \
     registration_opens_at, registration_closes_at, capacity, current_attendees, \
     eligible_batches, eligible_departments, requires_membership, required_tiers, \
     registration_fee_cents, created_at, updated_at";

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Event {
            id: entity.id,
            title: entity.title,
            status: entity.status.into(),
            start_date_time: entity.start_date_time,
            end_date_time: entity.end_date_time,
            registration_window: RegistrationWindow {
                opens_at: entity.registration_opens_at,
                closes_at: entity.registration_closes_at,
            },
            capacity: entity.capacity,
            current_attendees: entity.current_attendees,
            eligibility: EligibilityRules {
                batches: entity.eligible_batches.into_iter().collect(),
                departments: entity.eligible_departments.into_iter().collect(),
                requires_membership: entity.requires_membership,
                required_tiers: entity.required_tiers.into_iter().collect(),
            },
            registration_fee_cents: entity.registration_fee_cents,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            EventStatus::Draft,
            EventStatus::Published,
            EventStatus::Ongoing,
            EventStatus::Completed,
            EventStatus::Cancelled,
        ] {
            let db: EventStatusDb = status.into();
            assert_eq!(EventStatus::from(db), status);
        }
    }

    #[test]
    fn test_event_entity_to_domain() {
        let now = Utc::now();
        let entity = EventEntity {
            id: Uuid::new_v4(),
            title: "Homecoming".to_string(),
            status: EventStatusDb::Published,
            start_date_time: now,
            end_date_time: now,
            registration_opens_at: now,
            registration_closes_at: now,
            capacity: Some(80),
            current_attendees: 12,
            eligible_batches: vec!["2015".to_string(), "2016".to_string()],
            eligible_departments: vec![],
            requires_membership: true,
            required_tiers: vec!["gold".to_string()],
            registration_fee_cents: 2500,
            created_at: now,
            updated_at: now,
        };

        let event: Event = entity.clone().into();
        assert_eq!(event.id, entity.id);
        assert_eq!(event.status, EventStatus::Published);
        assert_eq!(event.remaining_capacity(), Some(68));
        assert_eq!(event.eligibility.batches.len(), 2);
        assert!(event.eligibility.departments.is_empty());
        assert!(event.eligibility.required_tiers.contains("gold"));
    }
}
