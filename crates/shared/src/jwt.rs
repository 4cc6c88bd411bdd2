//! Identity token verification.
//!
//! Session management lives with the identity provider. This service only
//! verifies the bearer JWTs that provider issues and reads the alumnus
//! attributes carried in their claims. Production deployments verify RS256
//! signatures with the provider's public key; HS256 with a shared secret is
//! accepted for development and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("This configuration cannot sign tokens")]
    SigningUnavailable,
}

/// Portal role asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Alumni,
}

/// Claims of an identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (alumni ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub role: Role,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_tier: Option<String>,
}

impl IdentityClaims {
    /// Builds claims valid for `ttl_secs` seconds from now.
    pub fn new(
        alumni_id: Uuid,
        role: Role,
        batch: impl Into<String>,
        department: impl Into<String>,
        membership_tier: Option<String>,
        ttl_secs: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: alumni_id.to_string(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
            iat: now.timestamp(),
            role,
            batch: batch.into(),
            department: department.into(),
            membership_tier,
        }
    }

    /// Parses the subject as an alumni ID.
    pub fn alumni_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// Configuration for identity token verification.
#[derive(Clone)]
pub struct JwtConfig {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    /// Only present for shared-secret configs; RS256 signing stays with the provider.
    encoding_key: Option<EncodingKey>,
    /// Leeway in seconds for clock skew tolerance
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .field("decoding_key", &"[REDACTED]")
            .field("encoding_key", &self.encoding_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl JwtConfig {
    /// Creates a verifier for RS256 tokens from the provider's public key in PEM format.
    pub fn from_rsa_public_key(public_key_pem: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            algorithm: Algorithm::RS256,
            decoding_key,
            encoding_key: None,
            leeway_secs,
        })
    }

    /// Creates an HS256 config from a shared secret. Able to sign as well as verify.
    pub fn from_shared_secret(secret: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("Shared secret is empty".to_string()));
        }

        Ok(Self {
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: Some(EncodingKey::from_secret(secret.as_bytes())),
            leeway_secs,
        })
    }

    /// Signs identity claims. Used by development tooling and tests.
    pub fn sign(&self, claims: &IdentityClaims) -> Result<String, JwtError> {
        let key = self
            .encoding_key
            .as_ref()
            .ok_or(JwtError::SigningUnavailable)?;

        encode(&Header::new(self.algorithm), claims, key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates a token and returns its claims.
    pub fn validate(&self, token: &str) -> Result<IdentityClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let token_data =
            decode::<IdentityClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidToken
                    | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                    _ => JwtError::DecodingError(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> JwtConfig {
        JwtConfig::from_shared_secret("test_secret_key_for_jwt_testing_12345", 0).unwrap()
    }

    fn alumni_claims(ttl_secs: i64) -> IdentityClaims {
        IdentityClaims::new(
            Uuid::new_v4(),
            Role::Alumni,
            "2015",
            "Computer Science",
            Some("lifetime".to_string()),
            ttl_secs,
        )
    }

    #[test]
    fn test_sign_and_validate() {
        let config = create_test_config();
        let claims = alumni_claims(600);

        let token = config.sign(&claims).unwrap();
        let decoded = config.validate(&token).unwrap();

        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.role, Role::Alumni);
        assert_eq!(decoded.batch, "2015");
        assert_eq!(decoded.membership_tier.as_deref(), Some("lifetime"));
    }

    #[test]
    fn test_expired_token() {
        let config = create_test_config();
        let token = config.sign(&alumni_claims(-120)).unwrap();

        let result = config.validate(&token);
        assert!(
            matches!(result, Err(JwtError::TokenExpired)),
            "Expected TokenExpired, got: {:?}",
            result
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_test_config().sign(&alumni_claims(600)).unwrap();
        let other = JwtConfig::from_shared_secret("another_secret", 0).unwrap();

        assert!(matches!(other.validate(&token), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_malformed_token() {
        let config = create_test_config();
        assert!(config.validate("not_a_jwt").is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            JwtConfig::from_shared_secret("", 0),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_invalid_public_key_rejected() {
        assert!(matches!(
            JwtConfig::from_rsa_public_key("not a pem", 30),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_alumni_id_parsing() {
        let claims = alumni_claims(600);
        assert_eq!(claims.alumni_id().unwrap().to_string(), claims.sub);

        let mut bad = claims.clone();
        bad.sub = "not-a-uuid".to_string();
        assert!(matches!(bad.alumni_id(), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_missing_optional_claims_default() {
        let json = serde_json::json!({
            "sub": Uuid::new_v4().to_string(),
            "exp": 0,
            "iat": 0,
            "role": "admin"
        });
        let claims: IdentityClaims = serde_json::from_value(json).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.batch.is_empty());
        assert!(claims.membership_tier.is_none());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", create_test_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test_secret_key"));
    }
}
