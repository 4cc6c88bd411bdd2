//! Attendance token domain model.
//!
//! An attendance token is an event-scoped bearer capability: one secret is
//! rendered as a QR code at the venue and scanned by many attendees, each of
//! whom confirms their own existing registration. It carries no identity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::crypto::{display_prefix, generate_secret, sha256_hex};
use uuid::Uuid;
use validator::Validate;

use super::registration::Registration;

/// Attendance token prefix.
pub const TOKEN_PREFIX: &str = "att_";

/// Length of random bytes for token generation.
const TOKEN_RANDOM_BYTES: usize = 32;

/// Default token lifetime in minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Validity of a stored token at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    NotYetValid,
    Expired,
    Revoked,
}

/// Attendance token as stored. Only the digest of the secret is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttendanceToken {
    pub id: Uuid,
    pub event_id: Uuid,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub token_prefix: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<Uuid>,
}

impl AttendanceToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Tokens authorize attendance only while `now ∈ [issued_at, expires_at)`.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.is_revoked() {
            TokenState::Revoked
        } else if now < self.issued_at {
            TokenState::NotYetValid
        } else if now >= self.expires_at {
            TokenState::Expired
        } else {
            TokenState::Valid
        }
    }
}

/// Fields required to store a freshly issued token.
#[derive(Debug, Clone)]
pub struct NewAttendanceToken {
    pub event_id: Uuid,
    pub token_hash: String,
    pub token_prefix: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issued_by: Option<Uuid>,
}

impl NewAttendanceToken {
    /// Builds the stored half of a token from its plaintext secret.
    pub fn from_secret(
        event_id: Uuid,
        secret: &str,
        issued_at: DateTime<Utc>,
        ttl_minutes: i64,
        issued_by: Option<Uuid>,
    ) -> Self {
        Self {
            event_id,
            token_hash: sha256_hex(secret),
            token_prefix: display_prefix(secret),
            issued_at,
            expires_at: issued_at + Duration::minutes(ttl_minutes),
            issued_by,
        }
    }
}

/// Result of issuing a token. The plaintext is only ever returned here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IssuedAttendanceToken {
    pub token: String,
    pub token_prefix: String,
    pub event_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Request to issue a token for an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct IssueAttendanceTokenRequest {
    #[validate(range(min = 1, max = 1440, message = "ttl_minutes must be between 1 and 1440"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_minutes: Option<i64>,
}

/// Response for token issuance: the token plus a payload for the QR layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IssueAttendanceTokenResponse {
    #[serde(flatten)]
    pub token: IssuedAttendanceToken,
    pub qr_data: String,
}

/// Query for the read-only verification step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VerifyAttendanceQuery {
    pub token: String,
}

/// Request to mark the caller as present.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct MarkAttendanceRequest {
    #[validate(length(min = 1, max = 256, message = "token must be between 1 and 256 characters"))]
    pub token: String,
}

/// Outcome of an attendance mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttendanceMark {
    pub registration: Registration,
    /// False when the registration had already been marked earlier.
    pub newly_marked: bool,
}

/// Response for revoking an event's tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RevokeAttendanceTokenResponse {
    pub event_id: Uuid,
    pub revoked: u64,
}

/// Generate a new attendance token secret.
pub fn generate_token() -> String {
    generate_secret(TOKEN_PREFIX, TOKEN_RANDOM_BYTES)
}

/// Build the payload encoded into the venue QR code.
pub fn build_qr_data(app_base_url: &str, event_id: Uuid, token: &str) -> String {
    format!(
        "{}/events/{}/attendance?token={}",
        app_base_url.trim_end_matches('/'),
        event_id,
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 1, 17, 0, 0).unwrap()
    }

    fn stored_token(revoked_at: Option<DateTime<Utc>>) -> AttendanceToken {
        let new = NewAttendanceToken::from_secret(
            Uuid::new_v4(),
            "att_secret",
            issued_at(),
            DEFAULT_TOKEN_TTL_MINUTES,
            None,
        );
        AttendanceToken {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            token_hash: new.token_hash,
            token_prefix: new.token_prefix,
            issued_at: new.issued_at,
            expires_at: new.expires_at,
            revoked_at,
            issued_by: None,
        }
    }

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert!(token.len() > 40);
    }

    #[test]
    fn test_generate_token_uniqueness() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_new_token_stores_digest_not_secret() {
        let new = NewAttendanceToken::from_secret(Uuid::new_v4(), "att_secret", issued_at(), 60, None);
        assert_eq!(new.token_hash, sha256_hex("att_secret"));
        assert_ne!(new.token_hash, "att_secret");
        assert_eq!(new.token_prefix, "att_secr");
        assert_eq!(new.expires_at, issued_at() + Duration::minutes(60));
    }

    #[test]
    fn test_state_within_window() {
        let token = stored_token(None);
        assert_eq!(token.state_at(issued_at()), TokenState::Valid);
        assert_eq!(
            token.state_at(issued_at() + Duration::minutes(59)),
            TokenState::Valid
        );
    }

    #[test]
    fn test_state_expires_at_boundary() {
        let token = stored_token(None);
        assert_eq!(
            token.state_at(issued_at() + Duration::minutes(60)),
            TokenState::Expired
        );
        assert_eq!(
            token.state_at(issued_at() + Duration::hours(5)),
            TokenState::Expired
        );
    }

    #[test]
    fn test_state_before_issue() {
        let token = stored_token(None);
        assert_eq!(
            token.state_at(issued_at() - Duration::seconds(1)),
            TokenState::NotYetValid
        );
    }

    #[test]
    fn test_state_revoked_wins() {
        let token = stored_token(Some(issued_at()));
        assert_eq!(
            token.state_at(issued_at() + Duration::minutes(1)),
            TokenState::Revoked
        );
    }

    #[test]
    fn test_token_hash_never_serialized() {
        let json = serde_json::to_value(stored_token(None)).unwrap();
        assert!(json.get("token_hash").is_none());
        assert!(json.get("token_prefix").is_some());
    }

    #[test]
    fn test_build_qr_data() {
        let event_id = Uuid::nil();
        let data = build_qr_data("https://alumni.example.org/", event_id, "att_xyz");
        assert_eq!(
            data,
            "https://alumni.example.org/events/00000000-0000-0000-0000-000000000000/attendance?token=att_xyz"
        );
    }

    #[test]
    fn test_issue_request_validation() {
        let ok = IssueAttendanceTokenRequest {
            ttl_minutes: Some(60),
        };
        assert!(ok.validate().is_ok());

        let zero = IssueAttendanceTokenRequest {
            ttl_minutes: Some(0),
        };
        assert!(zero.validate().is_err());

        let default = IssueAttendanceTokenRequest::default();
        assert!(default.validate().is_ok());
    }

    #[test]
    fn test_mark_request_rejects_empty_token() {
        let request = MarkAttendanceRequest {
            token: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
