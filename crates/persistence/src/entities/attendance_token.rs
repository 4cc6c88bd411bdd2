//! Attendance token entity for database operations.

use chrono::{DateTime, Utc};
use domain::models::AttendanceToken;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for attendance tokens.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceTokenEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub token_hash: String,
    pub token_prefix: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub issued_by: Option<Uuid>,
}

impl From<AttendanceTokenEntity> for AttendanceToken {
    fn from(entity: AttendanceTokenEntity) -> Self {
        AttendanceToken {
            id: entity.id,
            event_id: entity.event_id,
            token_hash: entity.token_hash,
            token_prefix: entity.token_prefix,
            issued_at: entity.issued_at,
            expires_at: entity.expires_at,
            revoked_at: entity.revoked_at,
            issued_by: entity.issued_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_attendance_token_entity_to_domain() {
        let now = Utc::now();
        let entity = AttendanceTokenEntity {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            token_hash: "a".repeat(64),
            token_prefix: "att_AbCd".to_string(),
            issued_at: now,
            expires_at: now + Duration::minutes(60),
            revoked_at: None,
            issued_by: Some(Uuid::new_v4()),
        };

        let token: AttendanceToken = entity.clone().into();
        assert_eq!(token.id, entity.id);
        assert_eq!(token.token_prefix, "att_AbCd");
        assert!(!token.is_revoked());
    }
}
