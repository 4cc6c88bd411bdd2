//! Storage seam for events, registrations and attendance tokens.
//!
//! The store is the single source of truth shared by every request handler,
//! possibly across processes. Each mutating method is one atomic step in the
//! backing store: preconditions are checked in the same operation that
//! writes, never read first and written later by the caller. That is the only
//! synchronization the services rely on.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AttendanceSummary, AttendanceToken, Event, EventStatus, NewAttendanceToken, NewEvent,
    NewRegistration, Registration,
};

pub use memory::InMemoryEventStore;

/// Infrastructure failure of the backing store (timeouts, connectivity, ...).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Outcome of the atomic seat reservation + registration insert.
#[derive(Debug, Clone)]
pub enum ReserveOutcome {
    Registered(Registration),
    /// The conditional increment found no free seat.
    CapacityExceeded { capacity: i32 },
    /// A confirmed registration for the pair already exists.
    Duplicate,
    /// The generated registration number collided; nothing was written.
    NumberTaken,
    /// The event left `published` before the seat was taken.
    EventNotOpen { status: EventStatus },
    EventMissing,
}

/// Outcome of the atomic cancel + seat release.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled(Registration),
    NotFound,
    AlreadyCancelled(Registration),
    Attended(Registration),
    /// Releasing the seat would drive the counter below zero; nothing was written.
    CounterUnderflow { event_id: Uuid },
}

/// Outcome of the atomic attendance mark.
#[derive(Debug, Clone)]
pub enum MarkOutcome {
    Marked(Registration),
    AlreadyMarked(Registration),
    NotRegistered,
    Cancelled(Registration),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Cheap round trip used by readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert_event(&self, event: NewEvent, now: DateTime<Utc>)
        -> Result<Event, StoreError>;

    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, StoreError>;

    /// Compare-and-set on the status column. Returns `None` when the event is
    /// missing or its status is no longer `expected`.
    async fn update_event_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError>;

    async fn find_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Registration>, StoreError>;

    async fn find_confirmed_registration(
        &self,
        event_id: Uuid,
        alumni_id: Uuid,
    ) -> Result<Option<Registration>, StoreError>;

    /// Increments `current_attendees` only while the event is published and
    /// below capacity, and inserts the confirmed registration, as one unit.
    async fn reserve_and_register(
        &self,
        registration: NewRegistration,
    ) -> Result<ReserveOutcome, StoreError>;

    /// Cancels a confirmed, not yet attended registration and decrements the
    /// counter by exactly one, as one unit.
    async fn cancel_registration(
        &self,
        registration_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome, StoreError>;

    /// Sets `attended` on the pair's confirmed registration if not yet set.
    async fn mark_attended(
        &self,
        event_id: Uuid,
        alumni_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MarkOutcome, StoreError>;

    /// Registrations ordered by `(registered_at, id)`, strictly after `after`.
    async fn list_registrations(
        &self,
        event_id: Uuid,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: u32,
    ) -> Result<Vec<Registration>, StoreError>;

    async fn attendance_summary(&self, event_id: Uuid) -> Result<AttendanceSummary, StoreError>;

    /// Revokes every live token of the event and stores the new one, as one unit.
    async fn issue_attendance_token(
        &self,
        token: NewAttendanceToken,
    ) -> Result<AttendanceToken, StoreError>;

    /// Returns the number of tokens revoked by this call.
    async fn revoke_attendance_tokens(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Non-revoked token of the event with the given digest, expired or not.
    async fn find_active_token(
        &self,
        event_id: Uuid,
        token_hash: &str,
    ) -> Result<Option<AttendanceToken>, StoreError>;
}
