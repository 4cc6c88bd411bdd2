//! Caller identity extractor.
//!
//! Verifies the identity provider's bearer JWT and resolves the caller's
//! capabilities once per request.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use domain::models::Alumnus;
use shared::jwt::{IdentityClaims, Role};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct Caller {
    pub alumni_id: Uuid,
    pub role: Role,
    /// Attributes eligibility rules are evaluated against.
    pub alumnus: Alumnus,
}

impl Caller {
    pub fn from_claims(claims: IdentityClaims) -> Result<Self, ApiError> {
        let alumni_id = claims.alumni_id()?;
        let membership_tier = claims
            .membership_tier
            .filter(|tier| !tier.trim().is_empty());
        Ok(Self {
            alumni_id,
            role: claims.role,
            alumnus: Alumnus::new(alumni_id, claims.batch, claims.department, membership_tier),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Owners may act on their own records; admins on anyone's.
    pub fn require_owner_or_admin(&self, owner_id: Uuid) -> Result<(), ApiError> {
        if self.is_admin() || self.alumni_id == owner_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Only the owner or an admin can do this".to_string(),
            ))
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.jwt.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected identity token");
            ApiError::from(e)
        })?;
        Caller::from_claims(claims)
    }
}
