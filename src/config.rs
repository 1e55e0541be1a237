use jsonwebtoken::Algorithm;
use serde::Deserialize;

pub const DEFAULT_JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Session lifetime. Fixed for every issued token.
pub const SESSION_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: DEFAULT_JWT_ALGORITHM,
            ttl_minutes: SESSION_TTL_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let jwt = JwtConfig::new(std::env::var("JWT_SECRET")?);
        Ok(Self {
            database_url,
            max_connections,
            jwt,
        })
    }
}
