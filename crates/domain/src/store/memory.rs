//! In-memory `EventStore` for tests and local demos.
//!
//! Each trait method takes the table lock exactly once, so every operation is
//! a single critical section, the same guarantee a row lock plus conditional
//! UPDATE gives in PostgreSQL. The lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use super::{CancelOutcome, EventStore, MarkOutcome, ReserveOutcome, StoreError};
use crate::models::{
    AttendanceSummary, AttendanceToken, Event, EventStatus, NewAttendanceToken, NewEvent,
    NewRegistration, Registration, RegistrationStatus,
};

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    registrations: HashMap<Uuid, Registration>,
    tokens: Vec<AttendanceToken>,
}

/// Process-local store backed by hash maps.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    tables: Mutex<Tables>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    /// Overwrites an event's counter, bypassing every check.
    ///
    /// Fault injection for tests that exercise invariant reporting.
    pub fn force_current_attendees(&self, event_id: Uuid, value: i32) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if let Some(event) = tables.events.get_mut(&event_id) {
            event.current_attendees = value;
        }
        Ok(())
    }

    /// Total number of stored tokens, revoked ones included.
    pub fn token_count(&self, event_id: Uuid) -> Result<usize, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .tokens
            .iter()
            .filter(|t| t.event_id == event_id)
            .count())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn insert_event(&self, event: NewEvent, now: DateTime<Utc>) -> Result<Event, StoreError> {
        let event = Event {
            id: Uuid::new_v4(),
            title: event.title,
            status: EventStatus::Draft,
            start_date_time: event.start_date_time,
            end_date_time: event.end_date_time,
            registration_window: event.registration_window,
            capacity: event.capacity,
            current_attendees: 0,
            eligibility: event.eligibility,
            registration_fee_cents: event.registration_fee_cents,
            created_at: now,
            updated_at: now,
        };
        let mut tables = self.lock()?;
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.lock()?.events.get(&event_id).cloned())
    }

    async fn update_event_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError> {
        let mut tables = self.lock()?;
        match tables.events.get_mut(&event_id) {
            Some(event) if event.status == expected => {
                event.status = next;
                event.updated_at = now;
                Ok(Some(event.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        Ok(self.lock()?.registrations.get(&registration_id).cloned())
    }

    async fn find_confirmed_registration(
        &self,
        event_id: Uuid,
        alumni_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .registrations
            .values()
            .find(|r| r.event_id == event_id && r.alumni_id == alumni_id && r.is_confirmed())
            .cloned())
    }

    async fn reserve_and_register(
        &self,
        new: NewRegistration,
    ) -> Result<ReserveOutcome, StoreError> {
        let mut tables = self.lock()?;

        if tables.registrations.values().any(|r| {
            r.event_id == new.event_id && r.alumni_id == new.alumni_id && r.is_confirmed()
        }) {
            return Ok(ReserveOutcome::Duplicate);
        }
        if tables
            .registrations
            .values()
            .any(|r| r.registration_number == new.registration_number)
        {
            return Ok(ReserveOutcome::NumberTaken);
        }

        let Some(event) = tables.events.get_mut(&new.event_id) else {
            return Ok(ReserveOutcome::EventMissing);
        };
        if event.status != EventStatus::Published {
            return Ok(ReserveOutcome::EventNotOpen {
                status: event.status,
            });
        }
        if let Some(capacity) = event.capacity {
            if event.current_attendees >= capacity {
                return Ok(ReserveOutcome::CapacityExceeded { capacity });
            }
        }
        event.current_attendees += 1;

        let registration = Registration {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            alumni_id: new.alumni_id,
            status: RegistrationStatus::Confirmed,
            registration_number: new.registration_number,
            attended: false,
            attendance_marked_at: None,
            fee_paid: new.fee_paid,
            // Microsecond resolution, as `timestamptz` stores it; cursors encode micros.
            registered_at: new.registered_at.trunc_subsecs(6),
            cancelled_at: None,
        };
        tables
            .registrations
            .insert(registration.id, registration.clone());

        Ok(ReserveOutcome::Registered(registration))
    }

    async fn cancel_registration(
        &self,
        registration_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome, StoreError> {
        let mut tables = self.lock()?;

        let Some(existing) = tables.registrations.get(&registration_id).cloned() else {
            return Ok(CancelOutcome::NotFound);
        };
        if existing.is_cancelled() {
            return Ok(CancelOutcome::AlreadyCancelled(existing));
        }
        if existing.attended {
            return Ok(CancelOutcome::Attended(existing));
        }

        match tables.events.get_mut(&existing.event_id) {
            Some(event) if event.current_attendees > 0 => {
                event.current_attendees -= 1;
            }
            _ => {
                return Ok(CancelOutcome::CounterUnderflow {
                    event_id: existing.event_id,
                })
            }
        }

        let registration = tables
            .registrations
            .get_mut(&registration_id)
            .ok_or_else(|| StoreError::Backend("registration vanished under lock".to_string()))?;
        registration.status = RegistrationStatus::Cancelled;
        registration.cancelled_at = Some(now);

        Ok(CancelOutcome::Cancelled(registration.clone()))
    }

    async fn mark_attended(
        &self,
        event_id: Uuid,
        alumni_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MarkOutcome, StoreError> {
        let mut tables = self.lock()?;

        if let Some(registration) = tables
            .registrations
            .values_mut()
            .find(|r| r.event_id == event_id && r.alumni_id == alumni_id && r.is_confirmed())
        {
            if registration.attended {
                return Ok(MarkOutcome::AlreadyMarked(registration.clone()));
            }
            registration.attended = true;
            registration.attendance_marked_at = Some(now);
            return Ok(MarkOutcome::Marked(registration.clone()));
        }

        // Most recent cancelled registration, if the pair ever registered.
        let cancelled = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id && r.alumni_id == alumni_id)
            .max_by_key(|r| r.registered_at)
            .cloned();

        Ok(match cancelled {
            Some(registration) => MarkOutcome::Cancelled(registration),
            None => MarkOutcome::NotRegistered,
        })
    }

    async fn list_registrations(
        &self,
        event_id: Uuid,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: u32,
    ) -> Result<Vec<Registration>, StoreError> {
        let tables = self.lock()?;
        let mut rows: Vec<Registration> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .filter(|r| match after {
                Some(cursor) => (r.registered_at, r.id) > cursor,
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.registered_at, r.id));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn attendance_summary(&self, event_id: Uuid) -> Result<AttendanceSummary, StoreError> {
        let tables = self.lock()?;
        let mut summary = AttendanceSummary::default();
        for registration in tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id && r.is_confirmed())
        {
            summary.confirmed += 1;
            if registration.attended {
                summary.attended += 1;
            }
        }
        Ok(summary)
    }

    async fn issue_attendance_token(
        &self,
        new: NewAttendanceToken,
    ) -> Result<AttendanceToken, StoreError> {
        let mut tables = self.lock()?;

        for token in tables
            .tokens
            .iter_mut()
            .filter(|t| t.event_id == new.event_id && t.revoked_at.is_none())
        {
            token.revoked_at = Some(new.issued_at);
        }

        let token = AttendanceToken {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            token_hash: new.token_hash,
            token_prefix: new.token_prefix,
            issued_at: new.issued_at,
            expires_at: new.expires_at,
            revoked_at: None,
            issued_by: new.issued_by,
        };
        tables.tokens.push(token.clone());
        Ok(token)
    }

    async fn revoke_attendance_tokens(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        let mut revoked = 0;
        for token in tables
            .tokens
            .iter_mut()
            .filter(|t| t.event_id == event_id && t.revoked_at.is_none())
        {
            token.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn find_active_token(
        &self,
        event_id: Uuid,
        token_hash: &str,
    ) -> Result<Option<AttendanceToken>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .tokens
            .iter()
            .find(|t| t.event_id == event_id && t.token_hash == token_hash && !t.is_revoked())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EligibilityRules, RegistrationWindow};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn new_event(capacity: Option<i32>) -> NewEvent {
        NewEvent {
            title: "Alumni Gala".to_string(),
            start_date_time: now() + Duration::days(10),
            end_date_time: now() + Duration::days(10) + Duration::hours(3),
            registration_window: RegistrationWindow {
                opens_at: now() - Duration::days(1),
                closes_at: now() + Duration::days(9),
            },
            capacity,
            eligibility: EligibilityRules::default(),
            registration_fee_cents: 0,
        }
    }

    fn new_registration(event_id: Uuid, number: &str) -> NewRegistration {
        NewRegistration {
            event_id,
            alumni_id: Uuid::new_v4(),
            registration_number: number.to_string(),
            fee_paid: true,
            registered_at: now(),
        }
    }

    async fn published_event(store: &InMemoryEventStore, capacity: Option<i32>) -> Event {
        let event = store.insert_event(new_event(capacity), now()).await.unwrap();
        store
            .update_event_status(event.id, EventStatus::Draft, EventStatus::Published, now())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_event_starts_as_draft() {
        let store = InMemoryEventStore::new();
        let event = store.insert_event(new_event(Some(5)), now()).await.unwrap();
        assert_eq!(event.status, EventStatus::Draft);
        assert_eq!(event.current_attendees, 0);
    }

    #[tokio::test]
    async fn test_status_compare_and_set() {
        let store = InMemoryEventStore::new();
        let event = store.insert_event(new_event(None), now()).await.unwrap();

        let stale = store
            .update_event_status(event.id, EventStatus::Published, EventStatus::Ongoing, now())
            .await
            .unwrap();
        assert!(stale.is_none());

        let applied = store
            .update_event_status(event.id, EventStatus::Draft, EventStatus::Published, now())
            .await
            .unwrap();
        assert_eq!(applied.unwrap().status, EventStatus::Published);
    }

    #[tokio::test]
    async fn test_reserve_rejects_draft_event() {
        let store = InMemoryEventStore::new();
        let event = store.insert_event(new_event(Some(5)), now()).await.unwrap();

        let outcome = store
            .reserve_and_register(new_registration(event.id, "REG-1"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ReserveOutcome::EventNotOpen {
                status: EventStatus::Draft
            }
        ));
    }

    #[tokio::test]
    async fn test_reserve_stops_at_capacity() {
        let store = InMemoryEventStore::new();
        let event = published_event(&store, Some(1)).await;

        let first = store
            .reserve_and_register(new_registration(event.id, "REG-1"))
            .await
            .unwrap();
        assert!(matches!(first, ReserveOutcome::Registered(_)));

        let second = store
            .reserve_and_register(new_registration(event.id, "REG-2"))
            .await
            .unwrap();
        assert!(matches!(
            second,
            ReserveOutcome::CapacityExceeded { capacity: 1 }
        ));

        let event = store.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(event.current_attendees, 1);
    }

    #[tokio::test]
    async fn test_reserve_detects_number_collision() {
        let store = InMemoryEventStore::new();
        let event = published_event(&store, None).await;

        store
            .reserve_and_register(new_registration(event.id, "REG-SAME"))
            .await
            .unwrap();
        let outcome = store
            .reserve_and_register(new_registration(event.id, "REG-SAME"))
            .await
            .unwrap();
        assert!(matches!(outcome, ReserveOutcome::NumberTaken));

        let event = store.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(event.current_attendees, 1);
    }

    #[tokio::test]
    async fn test_cancel_reports_underflow_without_writing() {
        let store = InMemoryEventStore::new();
        let event = published_event(&store, Some(3)).await;
        let ReserveOutcome::Registered(registration) = store
            .reserve_and_register(new_registration(event.id, "REG-1"))
            .await
            .unwrap()
        else {
            panic!("expected registration");
        };

        store.force_current_attendees(event.id, 0).unwrap();

        let outcome = store
            .cancel_registration(registration.id, now())
            .await
            .unwrap();
        assert!(matches!(outcome, CancelOutcome::CounterUnderflow { .. }));

        let unchanged = store
            .find_registration(registration.id)
            .await
            .unwrap()
            .unwrap();
        assert!(unchanged.is_confirmed());
    }

    #[tokio::test]
    async fn test_issue_token_revokes_previous() {
        let store = InMemoryEventStore::new();
        let event = published_event(&store, None).await;

        let first = NewAttendanceToken::from_secret(event.id, "att_one", now(), 60, None);
        store.issue_attendance_token(first).await.unwrap();
        let second = NewAttendanceToken::from_secret(event.id, "att_two", now(), 60, None);
        store.issue_attendance_token(second).await.unwrap();

        let old = store
            .find_active_token(event.id, &shared::crypto::sha256_hex("att_one"))
            .await
            .unwrap();
        assert!(old.is_none());

        let current = store
            .find_active_token(event.id, &shared::crypto::sha256_hex("att_two"))
            .await
            .unwrap();
        assert!(current.is_some());
        assert_eq!(store.token_count(event.id).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_token_lookup_is_event_scoped() {
        let store = InMemoryEventStore::new();
        let event = published_event(&store, None).await;
        let other = published_event(&store, None).await;

        let token = NewAttendanceToken::from_secret(event.id, "att_scoped", now(), 60, None);
        store.issue_attendance_token(token).await.unwrap();

        let found = store
            .find_active_token(other.id, &shared::crypto::sha256_hex("att_scoped"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_registrations_pages_in_order() {
        let store = InMemoryEventStore::new();
        let event = published_event(&store, None).await;
        for i in 0..5 {
            let mut new = new_registration(event.id, &format!("REG-{i}"));
            new.registered_at = now() + Duration::seconds(i);
            store.reserve_and_register(new).await.unwrap();
        }

        let first = store.list_registrations(event.id, None, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        let last = first.last().unwrap();

        let rest = store
            .list_registrations(event.id, Some((last.registered_at, last.id)), 10)
            .await
            .unwrap();
        assert_eq!(rest.len(), 3);
        assert!(rest[0].registered_at > last.registered_at);
    }

    #[tokio::test]
    async fn test_cursor_page_does_not_repeat_sub_micro_rows() {
        let store = InMemoryEventStore::new();
        let event = published_event(&store, None).await;
        let base = now() + Duration::nanoseconds(123_456_789);
        for i in 0..3 {
            let mut new = new_registration(event.id, &format!("REG-N{i}"));
            new.registered_at = base + Duration::microseconds(i);
            store.reserve_and_register(new).await.unwrap();
        }

        let first = store.list_registrations(event.id, None, 2).await.unwrap();
        let last = first.last().unwrap();
        let cursor = shared::pagination::encode_cursor(last.registered_at, last.id);
        let after = shared::pagination::decode_cursor(&cursor).unwrap();

        let second = store
            .list_registrations(event.id, Some(after), 2)
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert!(first.iter().all(|r| r.id != second[0].id));
    }
}
