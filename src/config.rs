use anyhow::bail;
use serde::Deserialize;

/// Placeholder secret shipped in example env files; never valid in a running
/// process.
const PLACEHOLDER_SECRET: &str = "dev-secret";

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

impl JwtConfig {
    /// Fail-fast check run at startup so a weak secret never reaches
    /// request handling.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret == PLACEHOLDER_SECRET {
            bail!("JWT_SECRET must not be \"{PLACEHOLDER_SECRET}\"; set a strong random value");
        }
        if self.secret.len() < MIN_SECRET_LEN {
            bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} characters");
        }
        if self.ttl_minutes <= 0 || self.refresh_ttl_minutes <= 0 {
            bail!("token TTLs must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_path: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/db.sqlite".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        jwt.validate()?;
        Ok(Self { database_path, jwt })
    }
}
