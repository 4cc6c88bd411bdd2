use serde::Deserialize;
use shared::jwt::{JwtConfig, JwtError};
use std::net::{AddrParseError, SocketAddr};

use domain::services::{TokenPolicy, MAX_TOKEN_TTL_MINUTES};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// Identity token verification
    pub jwt: JwtAuthConfig,
    #[serde(default)]
    pub attendance: AttendanceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Public URL of the alumni app, used as the base of QR payloads.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Identity token verification settings.
///
/// Production sets `public_key` (RS256 PEM from the identity provider).
/// `shared_secret` selects HS256 and is meant for development and tests.
#[derive(Clone, Deserialize)]
pub struct JwtAuthConfig {
    #[serde(default)]
    pub public_key: String,

    #[serde(default)]
    pub shared_secret: String,

    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthConfig")
            .field("public_key_set", &!self.public_key.is_empty())
            .field("shared_secret", &"[REDACTED]")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl JwtAuthConfig {
    /// Builds the verifier. The public key wins when both are configured.
    pub fn verifier(&self) -> Result<JwtConfig, JwtError> {
        if !self.public_key.is_empty() {
            JwtConfig::from_rsa_public_key(&self.public_key, self.leeway_secs)
        } else {
            JwtConfig::from_shared_secret(&self.shared_secret, self.leeway_secs)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceConfig {
    #[serde(default = "default_token_ttl_minutes")]
    pub default_token_ttl_minutes: i64,

    #[serde(default = "default_max_token_ttl_minutes")]
    pub max_token_ttl_minutes: i64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            default_token_ttl_minutes: default_token_ttl_minutes(),
            max_token_ttl_minutes: default_max_token_ttl_minutes(),
        }
    }
}

impl AttendanceConfig {
    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy {
            default_ttl_minutes: self.default_token_ttl_minutes,
            max_ttl_minutes: self.max_token_ttl_minutes,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_app_base_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_jwt_leeway() -> u64 {
    shared::jwt::DEFAULT_LEEWAY_SECS
}
fn default_token_ttl_minutes() -> i64 {
    domain::models::DEFAULT_TOKEN_TTL_MINUTES
}
fn default_max_token_ttl_minutes() -> i64 {
    MAX_TOKEN_TTL_MINUTES
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with AEP__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("AEP").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration from embedded defaults plus overrides, without
    /// touching config files or validating.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            app_base_url = "http://localhost:3000"

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []

            [jwt]
            shared_secret = "test-shared-secret"
            leeway_secs = 30

            [attendance]
            default_token_ttl_minutes = 60
            max_token_ttl_minutes = 1440
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "AEP__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.jwt.public_key.is_empty() && self.jwt.shared_secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "AEP__JWT__PUBLIC_KEY or AEP__JWT__SHARED_SECRET must be set".to_string(),
            ));
        }

        let attendance = &self.attendance;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&attendance.max_token_ttl_minutes) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "attendance.max_token_ttl_minutes must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            )));
        }
        if !(1..=attendance.max_token_ttl_minutes).contains(&attendance.default_token_ttl_minutes)
        {
            return Err(ConfigValidationError::InvalidValue(
                "attendance.default_token_ttl_minutes must be between 1 and max_token_ttl_minutes"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    /// Pool settings in the shape the persistence crate expects.
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            connect_timeout_secs: self.database.connect_timeout_secs,
            idle_timeout_secs: self.database.idle_timeout_secs,
        }
    }
}
