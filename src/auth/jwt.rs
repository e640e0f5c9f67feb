use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::config::JwtConfig;
use crate::state::AppState;
use crate::validate::is_valid_email;

/// Suffix appended to the configured secret for refresh tokens, so the two
/// token kinds never verify under each other's key.
const REFRESH_SECRET_SUFFIX: &str = "_refresh";

/// Identity claims embedded in both token kinds. `sub` must resolve to a
/// numeric user id; a non-numeric value fails decoding instead of being
/// coerced. Unknown extra fields in a token are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(deserialize_with = "deserialize_sub")]
    pub sub: i64,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

fn deserialize_sub<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Str(s) => s
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom("sub is not a numeric user id")),
    }
}

/// Signing and verification keys for both token kinds, derived once from
/// config at startup.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> Self {
        let refresh_secret = format!("{}{}", config.secret, REFRESH_SECRET_SUFFIX);
        Self {
            access_encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: Duration::from_secs((config.ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((config.refresh_ttl_minutes as u64) * 60),
        }
    }

    fn sign_with(&self, key: &EncodingKey, ttl: Duration, sub: i64, email: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, key)?;
        debug!(user_id = sub, "jwt signed");
        Ok(token)
    }

    fn verify_with(&self, key: &DecodingKey, token: &str) -> anyhow::Result<Claims> {
        // Tokens expire exactly at the embedded timestamp.
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, key, &validation)?;
        let claims = data.claims;
        if !is_valid_email(&claims.email) {
            anyhow::bail!("email claim is not a valid email");
        }
        debug!(user_id = claims.sub, "jwt verified");
        Ok(claims)
    }

    pub fn sign_access(&self, sub: i64, email: &str) -> anyhow::Result<String> {
        self.sign_with(&self.access_encoding, self.access_ttl, sub, email)
    }

    pub fn sign_refresh(&self, sub: i64, email: &str) -> anyhow::Result<String> {
        self.sign_with(&self.refresh_encoding, self.refresh_ttl, sub, email)
    }

    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify_with(&self.access_decoding, token)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify_with(&self.refresh_decoding, token)
    }
}
