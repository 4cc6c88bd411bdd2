//! Event repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{Event, EventStatus, NewEvent};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::event::{EventEntity, EventStatusDb, EVENT_COLUMNS};
use crate::metrics::QueryTimer;

/// Repository for event database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event in `draft`.
    pub async fn create(&self, event: &NewEvent, now: DateTime<Utc>) -> Result<Event, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let sql = format!(
            r#"
            INSERT INTO events (
                title, status, start_date_time, end_date_time,
                registration_opens_at, registration_closes_at, capacity,
                eligible_batches, eligible_departments, requires_membership, required_tiers,
                registration_fee_cents, created_at, updated_at
            )
            VALUES ($1, 'draft', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(&event.title)
            .bind(event.start_date_time)
            .bind(event.end_date_time)
            .bind(event.registration_window.opens_at)
            .bind(event.registration_window.closes_at)
            .bind(event.capacity)
            .bind(event.eligibility.batches.iter().cloned().collect::<Vec<_>>())
            .bind(event.eligibility.departments.iter().cloned().collect::<Vec<_>>())
            .bind(event.eligibility.requires_membership)
            .bind(event.eligibility.required_tiers.iter().cloned().collect::<Vec<_>>())
            .bind(event.registration_fee_cents)
            .bind(now)
            .fetch_one(&self.pool)
            .await;
        let result = timer.finish(result);

        Ok(result?.into())
    }

    /// Find event by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        let result = timer.finish(result);

        Ok(result?.map(Into::into))
    }

    /// Compare-and-set on status. `None` when the row is missing or its
    /// status is no longer `expected`.
    pub async fn update_status(
        &self,
        id: Uuid,
        expected: EventStatus,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, sqlx::Error> {
        let timer = QueryTimer::new("update_event_status");
        let sql = format!(
            r#"
            UPDATE events
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(id)
            .bind(EventStatusDb::from(expected))
            .bind(EventStatusDb::from(next))
            .bind(now)
            .fetch_optional(&self.pool)
            .await;
        let result = timer.finish(result);

        Ok(result?.map(Into::into))
    }

    /// Round trip for readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("ping");
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        timer.finish(result)?;
        Ok(())
    }
}
