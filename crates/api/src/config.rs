//! API server configuration.

use common::{
    env_first, env_parse, AppResult, CacheConfig, DatabaseConfig, JwtConfig, RateLimitConfig,
};

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Everything the HTTP server needs at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub jwt: JwtConfig,
    /// Limit for regular endpoints
    pub rate_limit: RateLimitConfig,
    /// Stricter limit for the credential endpoints
    pub auth_rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            host: env_first(&["SERVER_HOST"]).unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            database: DatabaseConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            auth_rate_limit: RateLimitConfig::auth_from_env()?,
        })
    }

    /// Config with defaults around the given pieces (tests, embedding).
    pub fn new(database: DatabaseConfig, jwt: JwtConfig) -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            database,
            cache: CacheConfig::default(),
            jwt,
            rate_limit: RateLimitConfig::default(),
            auth_rate_limit: RateLimitConfig::auth_default(),
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
