//! Registration repository for database operations.
//!
//! Seat accounting happens here: every change to `events.current_attendees`
//! is a conditional UPDATE inside the same transaction as the registration
//! row it belongs to.

use chrono::{DateTime, Utc};
use domain::models::{AttendanceSummary, EventStatus, NewRegistration, Registration};
use domain::store::{CancelOutcome, MarkOutcome, ReserveOutcome};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::event::EventStatusDb;
use crate::entities::registration::{RegistrationEntity, REGISTRATION_COLUMNS};
use crate::metrics::QueryTimer;

/// Partial unique index enforcing one confirmed registration per pair.
const ONE_CONFIRMED_INDEX: &str = "registrations_one_confirmed_per_alumnus";

/// Unique constraint on registration numbers.
const NUMBER_CONSTRAINT: &str = "registrations_registration_number_key";

/// Classifies the row read back after the conditional mark matched nothing.
///
/// The read runs outside the UPDATE, so a confirmed row that is still
/// unattended was inserted in between and is treated as not registered yet.
fn unmarked_outcome(latest: Option<Registration>) -> MarkOutcome {
    match latest {
        Some(registration) if registration.is_confirmed() && registration.attended => {
            MarkOutcome::AlreadyMarked(registration)
        }
        Some(registration) if !registration.is_confirmed() => MarkOutcome::Cancelled(registration),
        _ => MarkOutcome::NotRegistered,
    }
}

/// Repository for registration database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find registration by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_id");
        let sql = format!(
            "SELECT {} FROM registrations WHERE id = $1",
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        let result = timer.finish(result);

        Ok(result?.map(Into::into))
    }

    /// Find the confirmed registration of an alumnus for an event.
    pub async fn find_confirmed(
        &self,
        event_id: Uuid,
        alumni_id: Uuid,
    ) -> Result<Option<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("find_confirmed_registration");
        let sql = format!(
            r#"
            SELECT {}
            FROM registrations
            WHERE event_id = $1 AND alumni_id = $2 AND status = 'confirmed'
            "#,
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(event_id)
            .bind(alumni_id)
            .fetch_optional(&self.pool)
            .await;
        let result = timer.finish(result);

        Ok(result?.map(Into::into))
    }

    /// Take a seat and insert the confirmed registration in one transaction.
    pub async fn reserve(&self, new: &NewRegistration) -> Result<ReserveOutcome, sqlx::Error> {
        let timer = QueryTimer::new("reserve_and_register");
        let mut tx = self.pool.begin().await?;

        // The row lock taken here serializes concurrent reservations for the event.
        let seat = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE events
            SET current_attendees = current_attendees + 1
            WHERE id = $1
              AND status = 'published'
              AND (capacity IS NULL OR current_attendees < capacity)
            RETURNING id
            "#,
        )
        .bind(new.event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if seat.is_none() {
            let state = sqlx::query_as::<_, (EventStatusDb, Option<i32>)>(
                "SELECT status, capacity FROM events WHERE id = $1",
            )
            .bind(new.event_id)
            .fetch_optional(&mut *tx)
            .await?;
            tx.rollback().await?;
            timer.record();

            return Ok(match state {
                None => ReserveOutcome::EventMissing,
                Some((status, capacity)) => {
                    let status = EventStatus::from(status);
                    match capacity {
                        Some(capacity) if status == EventStatus::Published => {
                            ReserveOutcome::CapacityExceeded { capacity }
                        }
                        _ => ReserveOutcome::EventNotOpen { status },
                    }
                }
            });
        }

        let sql = format!(
            r#"
            INSERT INTO registrations (event_id, alumni_id, status, registration_number, fee_paid, registered_at)
            VALUES ($1, $2, 'confirmed', $3, $4, $5)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let inserted = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(new.event_id)
            .bind(new.alumni_id)
            .bind(&new.registration_number)
            .bind(new.fee_paid)
            .bind(new.registered_at)
            .fetch_one(&mut *tx)
            .await;

        let entity = match inserted {
            Ok(entity) => entity,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let outcome = match db_err.constraint() {
                    Some(ONE_CONFIRMED_INDEX) => Some(ReserveOutcome::Duplicate),
                    Some(NUMBER_CONSTRAINT) => Some(ReserveOutcome::NumberTaken),
                    _ => None,
                };
                // Also undoes the seat increment.
                tx.rollback().await?;
                timer.record();
                return outcome.ok_or(sqlx::Error::Database(db_err));
            }
            Err(e) => return Err(e),
        };

        tx.commit().await?;
        timer.record();
        Ok(ReserveOutcome::Registered(entity.into()))
    }

    /// Cancel a confirmed registration and give its seat back in one transaction.
    pub async fn cancel(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome, sqlx::Error> {
        let timer = QueryTimer::new("cancel_registration");
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM registrations WHERE id = $1 FOR UPDATE",
            REGISTRATION_COLUMNS
        );
        let existing = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let existing: Registration = match existing {
            Some(entity) => entity.into(),
            None => {
                tx.rollback().await?;
                timer.record();
                return Ok(CancelOutcome::NotFound);
            }
        };
        if existing.is_cancelled() {
            tx.rollback().await?;
            timer.record();
            return Ok(CancelOutcome::AlreadyCancelled(existing));
        }
        if existing.attended {
            tx.rollback().await?;
            timer.record();
            return Ok(CancelOutcome::Attended(existing));
        }

        let released = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE events
            SET current_attendees = current_attendees - 1
            WHERE id = $1 AND current_attendees > 0
            RETURNING id
            "#,
        )
        .bind(existing.event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if released.is_none() {
            tx.rollback().await?;
            timer.record();
            return Ok(CancelOutcome::CounterUnderflow {
                event_id: existing.event_id,
            });
        }

        let sql = format!(
            r#"
            UPDATE registrations
            SET status = 'cancelled', cancelled_at = $2
            WHERE id = $1
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let cancelled = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(CancelOutcome::Cancelled(cancelled.into()))
    }

    /// Set `attended` on the pair's confirmed registration if not yet set.
    pub async fn mark_attended(
        &self,
        event_id: Uuid,
        alumni_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MarkOutcome, sqlx::Error> {
        let timer = QueryTimer::new("mark_attended");
        let sql = format!(
            r#"
            UPDATE registrations
            SET attended = TRUE, attendance_marked_at = $3
            WHERE event_id = $1
              AND alumni_id = $2
              AND status = 'confirmed'
              AND attended = FALSE
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let marked = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(event_id)
            .bind(alumni_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(entity) = marked {
            timer.record();
            return Ok(MarkOutcome::Marked(entity.into()));
        }

        // Nothing updated: tell an earlier mark apart from a missing or
        // cancelled registration.
        let sql = format!(
            r#"
            SELECT {}
            FROM registrations
            WHERE event_id = $1 AND alumni_id = $2
            ORDER BY (status = 'confirmed') DESC, registered_at DESC
            LIMIT 1
            "#,
            REGISTRATION_COLUMNS
        );
        let latest = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(event_id)
            .bind(alumni_id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        Ok(unmarked_outcome(latest.map(Registration::from)))
    }

    /// Registrations of an event in `(registered_at, id)` order after a cursor.
    pub async fn list_for_event(
        &self,
        event_id: Uuid,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: u32,
    ) -> Result<Vec<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_registrations");
        let (after_at, after_id) = match after {
            Some((at, id)) => (Some(at), Some(id)),
            None => (None, None),
        };
        let sql = format!(
            r#"
            SELECT {}
            FROM registrations
            WHERE event_id = $1
              AND ($2::timestamptz IS NULL OR (registered_at, id) > ($2, $3))
            ORDER BY registered_at ASC, id ASC
            LIMIT $4
            "#,
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(event_id)
            .bind(after_at)
            .bind(after_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await;
        let result = timer.finish(result);

        Ok(result?.into_iter().map(Into::into).collect())
    }

    /// Confirmed and attended counts.
    pub async fn summary(&self, event_id: Uuid) -> Result<AttendanceSummary, sqlx::Error> {
        let timer = QueryTimer::new("attendance_summary");
        let (confirmed, attended) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'confirmed'),
                COUNT(*) FILTER (WHERE status = 'confirmed' AND attended)
            FROM registrations
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok(AttendanceSummary {
            confirmed,
            attended,
        })
    }
}
