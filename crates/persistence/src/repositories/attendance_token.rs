//! Attendance token repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{AttendanceToken, NewAttendanceToken};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::attendance_token::AttendanceTokenEntity;
use crate::metrics::QueryTimer;

/// Repository for attendance token database operations.
#[derive(Clone)]
pub struct AttendanceTokenRepository {
    pool: PgPool,
}

impl AttendanceTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Revoke every live token of the event and store the new one.
    ///
    /// Locks the event row first so concurrent issues run one at a time.
    pub async fn issue(&self, new: &NewAttendanceToken) -> Result<AttendanceToken, sqlx::Error> {
        let timer = QueryTimer::new("issue_attendance_token");
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(new.event_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE attendance_tokens
            SET revoked_at = $2
            WHERE event_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(new.event_id)
        .bind(new.issued_at)
        .execute(&mut *tx)
        .await?;

        let entity = sqlx::query_as::<_, AttendanceTokenEntity>(
            r#"
            INSERT INTO attendance_tokens (event_id, token_hash, token_prefix, issued_at, expires_at, issued_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, event_id, token_hash, token_prefix, issued_at, expires_at, revoked_at, issued_by
            "#,
        )
        .bind(new.event_id)
        .bind(&new.token_hash)
        .bind(&new.token_prefix)
        .bind(new.issued_at)
        .bind(new.expires_at)
        .bind(new.issued_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity.into())
    }

    /// Revoke all live tokens of an event. Returns how many rows changed.
    pub async fn revoke_for_event(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("revoke_attendance_tokens");
        let result = sqlx::query(
            r#"
            UPDATE attendance_tokens
            SET revoked_at = $2
            WHERE event_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(event_id)
        .bind(now)
        .execute(&self.pool)
        .await;
        let result = timer.finish(result);

        Ok(result?.rows_affected())
    }

    /// Find the non-revoked token of an event by digest.
    pub async fn find_active(
        &self,
        event_id: Uuid,
        token_hash: &str,
    ) -> Result<Option<AttendanceToken>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_attendance_token");
        let result = sqlx::query_as::<_, AttendanceTokenEntity>(
            r#"
            SELECT id, event_id, token_hash, token_prefix, issued_at, expires_at, revoked_at, issued_by
            FROM attendance_tokens
            WHERE event_id = $1 AND token_hash = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(event_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await;
        let result = timer.finish(result);

        Ok(result?.map(Into::into))
    }
}
