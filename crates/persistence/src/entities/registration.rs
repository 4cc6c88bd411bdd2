//! Registration entity for database operations.

use chrono::{DateTime, Utc};
use domain::models::{Registration, RegistrationStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for registration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Confirmed,
    Cancelled,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(db: RegistrationStatusDb) -> Self {
        match db {
            RegistrationStatusDb::Confirmed => RegistrationStatus::Confirmed,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
        }
    }
}

/// Database entity for registrations.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub alumni_id: Uuid,
    pub status: RegistrationStatusDb,
    pub registration_number: String,
    pub attended: bool,
    pub attendance_marked_at: Option<DateTime<Utc>>,
    pub fee_paid: bool,
    pub registered_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

pub const REGISTRATION_COLUMNS: &str = "id, event_id, alumni_id, status, registration_number, \
     attended, attendance_marked_at, fee_paid, registered_at, cancelled_at";

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Registration {
            id: entity.id,
            event_id: entity.event_id,
            alumni_id: entity.alumni_id,
            status: entity.status.into(),
            registration_number: entity.registration_number,
            attended: entity.attended,
            attendance_marked_at: entity.attendance_marked_at,
            fee_paid: entity.fee_paid,
            registered_at: entity.registered_at,
            cancelled_at: entity.cancelled_at,
        }
    }
}
