//! Event registration domain model.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration number prefix.
pub const REGISTRATION_NUMBER_PREFIX: &str = "REG";

/// Number of random characters in a registration number.
const REGISTRATION_NUMBER_RANDOM_LEN: usize = 8;

/// Crockford-style alphabet without easily confused characters (0/O, 1/I/L).
const REGISTRATION_NUMBER_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Status of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Confirmed => write!(f, "confirmed"),
            RegistrationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Registration domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub alumni_id: Uuid,
    pub status: RegistrationStatus,
    pub registration_number: String,
    pub attended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_marked_at: Option<DateTime<Utc>>,
    /// Informational; payment capture happens elsewhere.
    pub fee_paid: bool,
    pub registered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Registration {
    pub fn is_confirmed(&self) -> bool {
        self.status == RegistrationStatus::Confirmed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RegistrationStatus::Cancelled
    }
}

/// Fields required to create a registration.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: Uuid,
    pub alumni_id: Uuid,
    pub registration_number: String,
    pub fee_paid: bool,
    pub registered_at: DateTime<Utc>,
}

/// Confirmed and attended counts for one event.
///
/// `attended` counts rows with `attended = true`, so repeated marks of the
/// same registration never inflate it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttendanceSummary {
    pub confirmed: i64,
    pub attended: i64,
}

/// Request body for registering for an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegisterForEventRequest {
    /// Paid flag forwarded by the payment collaborator.
    #[serde(default)]
    pub fee_paid: bool,
}

/// Query parameters for listing an event's registrations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRegistrationsQuery {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

/// A page of registrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationPage {
    pub data: Vec<Registration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Generate a human-readable registration number, e.g. `REG-20261018-7K3QXZ9A`.
///
/// Uniqueness is enforced by the store; the random part only has to make
/// collisions rare enough that a retry is cheap.
pub fn generate_registration_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REGISTRATION_NUMBER_RANDOM_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..REGISTRATION_NUMBER_ALPHABET.len());
            REGISTRATION_NUMBER_ALPHABET[idx] as char
        })
        .collect();
    format!(
        "{}-{}-{}",
        REGISTRATION_NUMBER_PREFIX,
        now.format("%Y%m%d"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn registration(status: RegistrationStatus) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            alumni_id: Uuid::new_v4(),
            status,
            registration_number: "REG-20261018-ABCDEFGH".to_string(),
            attended: false,
            attendance_marked_at: None,
            fee_paid: false,
            registered_at: Utc::now(),
            cancelled_at: None,
        }
    }

    #[test]
    fn test_registration_status_display() {
        assert_eq!(RegistrationStatus::Confirmed.to_string(), "confirmed");
        assert_eq!(RegistrationStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_registration_status_helpers() {
        assert!(registration(RegistrationStatus::Confirmed).is_confirmed());
        assert!(registration(RegistrationStatus::Cancelled).is_cancelled());
    }

    #[test]
    fn test_generate_registration_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let number = generate_registration_number(now);

        assert!(number.starts_with("REG-20261018-"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), REGISTRATION_NUMBER_RANDOM_LEN);
        assert!(suffix
            .bytes()
            .all(|b| REGISTRATION_NUMBER_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_registration_number_has_no_ambiguous_chars() {
        for _ in 0..100 {
            let number = generate_registration_number(Utc::now());
            let suffix = number.rsplit('-').next().unwrap();
            assert!(!suffix.contains(['0', 'O', '1', 'I', 'L']));
        }
    }

    #[test]
    fn test_generate_registration_number_uniqueness() {
        let now = Utc::now();
        let numbers: HashSet<String> = (0..1000).map(|_| generate_registration_number(now)).collect();
        assert_eq!(numbers.len(), 1000);
    }

    #[test]
    fn test_registration_serialization_skips_empty_optionals() {
        let json = serde_json::to_value(registration(RegistrationStatus::Confirmed)).unwrap();
        assert_eq!(json["status"], "confirmed");
        assert!(json.get("attendance_marked_at").is_none());
        assert!(json.get("cancelled_at").is_none());
    }

    #[test]
    fn test_register_request_defaults_to_unpaid() {
        let request: RegisterForEventRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.fee_paid);
    }
}
