//! PostgreSQL implementation of the domain `EventStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    AttendanceSummary, AttendanceToken, Event, EventStatus, NewAttendanceToken, NewEvent,
    NewRegistration, Registration,
};
use domain::store::{CancelOutcome, EventStore, MarkOutcome, ReserveOutcome, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repositories::{AttendanceTokenRepository, EventRepository, RegistrationRepository};

fn backend(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Database error");
    StoreError::Backend(err.to_string())
}

/// `EventStore` backed by the repositories over one pool.
#[derive(Clone)]
pub struct PgEventStore {
    events: EventRepository,
    registrations: RegistrationRepository,
    tokens: AttendanceTokenRepository,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            tokens: AttendanceTokenRepository::new(pool),
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.events.ping().await.map_err(backend)
    }

    async fn insert_event(&self, event: NewEvent, now: DateTime<Utc>) -> Result<Event, StoreError> {
        self.events.create(&event, now).await.map_err(backend)
    }

    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, StoreError> {
        self.events.find_by_id(event_id).await.map_err(backend)
    }

    async fn update_event_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError> {
        self.events
            .update_status(event_id, expected, next, now)
            .await
            .map_err(backend)
    }

    async fn find_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        self.registrations
            .find_by_id(registration_id)
            .await
            .map_err(backend)
    }

    async fn find_confirmed_registration(
        &self,
        event_id: Uuid,
        alumni_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        self.registrations
            .find_confirmed(event_id, alumni_id)
            .await
            .map_err(backend)
    }

    async fn reserve_and_register(
        &self,
        registration: NewRegistration,
    ) -> Result<ReserveOutcome, StoreError> {
        self.registrations.reserve(&registration).await.map_err(backend)
    }

    async fn cancel_registration(
        &self,
        registration_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome, StoreError> {
        self.registrations
            .cancel(registration_id, now)
            .await
            .map_err(backend)
    }

    async fn mark_attended(
        &self,
        event_id: Uuid,
        alumni_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MarkOutcome, StoreError> {
        self.registrations
            .mark_attended(event_id, alumni_id, now)
            .await
            .map_err(backend)
    }

    async fn list_registrations(
        &self,
        event_id: Uuid,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: u32,
    ) -> Result<Vec<Registration>, StoreError> {
        self.registrations
            .list_for_event(event_id, after, limit)
            .await
            .map_err(backend)
    }

    async fn attendance_summary(&self, event_id: Uuid) -> Result<AttendanceSummary, StoreError> {
        self.registrations.summary(event_id).await.map_err(backend)
    }

    async fn issue_attendance_token(
        &self,
        token: NewAttendanceToken,
    ) -> Result<AttendanceToken, StoreError> {
        self.tokens.issue(&token).await.map_err(backend)
    }

    async fn revoke_attendance_tokens(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.tokens
            .revoke_for_event(event_id, now)
            .await
            .map_err(backend)
    }

    async fn find_active_token(
        &self,
        event_id: Uuid,
        token_hash: &str,
    ) -> Result<Option<AttendanceToken>, StoreError> {
        self.tokens
            .find_active(event_id, token_hash)
            .await
            .map_err(backend)
    }
}
