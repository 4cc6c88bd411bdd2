//! Attendance token issuance, revocation and validation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::crypto::sha256_hex;
use tracing::info;
use uuid::Uuid;

use super::lifecycle::can_mark_attendance;
use crate::error::EventCoreError;
use crate::models::{
    generate_token, AttendanceToken, IssuedAttendanceToken, NewAttendanceToken, TokenState,
    DEFAULT_TOKEN_TTL_MINUTES,
};
use crate::store::EventStore;

/// Upper bound on a token lifetime when none is configured (one day).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 1440;

/// Token lifetime bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub default_ttl_minutes: i64,
    pub max_ttl_minutes: i64,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            default_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            max_ttl_minutes: MAX_TOKEN_TTL_MINUTES,
        }
    }
}

impl TokenPolicy {
    fn resolve_ttl(&self, requested: Option<i64>) -> Result<i64, EventCoreError> {
        let minutes = requested.unwrap_or(self.default_ttl_minutes);
        if minutes < 1 || minutes > self.max_ttl_minutes {
            return Err(EventCoreError::InvalidTokenTtl {
                minutes,
                max: self.max_ttl_minutes,
            });
        }
        Ok(minutes)
    }
}

#[derive(Clone)]
pub struct AttendanceTokenService {
    store: Arc<dyn EventStore>,
    policy: TokenPolicy,
}

impl AttendanceTokenService {
    pub fn new(store: Arc<dyn EventStore>, policy: TokenPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Issues a fresh token and revokes every earlier token of the event.
    ///
    /// The plaintext secret exists only in the returned value.
    pub async fn issue(
        &self,
        event_id: Uuid,
        ttl_minutes: Option<i64>,
        issued_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<IssuedAttendanceToken, EventCoreError> {
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(EventCoreError::EventNotFound { event_id })?;
        if !can_mark_attendance(&event) {
            return Err(EventCoreError::EventNotAttendable {
                event_id,
                status: event.status,
            });
        }

        let ttl_minutes = self.policy.resolve_ttl(ttl_minutes)?;
        let secret = generate_token();
        let stored = self
            .store
            .issue_attendance_token(NewAttendanceToken::from_secret(
                event_id,
                &secret,
                now,
                ttl_minutes,
                issued_by,
            ))
            .await?;

        info!(
            event_id = %event_id,
            token_prefix = %stored.token_prefix,
            expires_at = %stored.expires_at,
            "Attendance token issued"
        );

        Ok(IssuedAttendanceToken {
            token: secret,
            token_prefix: stored.token_prefix,
            event_id,
            issued_at: stored.issued_at,
            expires_at: stored.expires_at,
        })
    }

    /// Revokes the event's live token. Idempotent; returns how many were revoked.
    pub async fn revoke(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<u64, EventCoreError> {
        if self.store.find_event(event_id).await?.is_none() {
            return Err(EventCoreError::EventNotFound { event_id });
        }
        let revoked = self.store.revoke_attendance_tokens(event_id, now).await?;
        info!(event_id = %event_id, revoked, "Attendance tokens revoked");
        Ok(revoked)
    }

    /// Resolves a presented secret to the event's live token.
    pub async fn validate(
        &self,
        event_id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceToken, EventCoreError> {
        let stored = self
            .store
            .find_active_token(event_id, &sha256_hex(token))
            .await?
            .ok_or(EventCoreError::TokenInvalid { event_id })?;

        match stored.state_at(now) {
            TokenState::Valid => Ok(stored),
            TokenState::Expired => Err(EventCoreError::TokenExpired {
                event_id,
                expired_at: stored.expires_at,
            }),
            TokenState::NotYetValid | TokenState::Revoked => {
                Err(EventCoreError::TokenInvalid { event_id })
            }
        }
    }
}
