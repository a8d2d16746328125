use std::{fmt::Display, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use axum::http::HeaderValue;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Browser origin allowed by CORS. Any origin when unset.
    pub cors_origin: Option<HeaderValue>,

    /// Upper bound on a single live push to a recipient's socket.
    pub push_timeout: Duration,
    /// Outbound frames queued per socket before pushes start waiting.
    pub socket_buffer: usize,
    pub session_inactivity: time::Duration,

    pub bcrypt_cost: u32,
    pub avatar_api: String,
    pub avatar_candidates: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://snappy.db?mode=rwc".to_owned(),
            db_max_connections: 16,
            host: "0.0.0.0".to_owned(),
            port: 5000,
            cors_origin: None,
            push_timeout: Duration::from_millis(500),
            socket_buffer: 32,
            session_inactivity: time::Duration::minutes(60),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            avatar_api: "https://api.multiavatar.com/4645646".to_owned(),
            avatar_candidates: 4,
        }
    }
}

impl Config {
    /// Reads the process environment, with `.env` taking part through dotenv.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            cors_origin: lookup("CORS_ORIGIN")
                .filter(|origin| !origin.is_empty())
                .map(|origin| HeaderValue::from_str(&origin).with_context(|| format!("invalid CORS_ORIGIN value {origin:?}")))
                .transpose()?,
            push_timeout: Duration::from_millis(parse_or(&lookup, "PUSH_TIMEOUT_MS", 500u64)?),
            socket_buffer: parse_or(&lookup, "SOCKET_BUFFER", defaults.socket_buffer)?,
            session_inactivity: session_inactivity(parse_or(&lookup, "SESSION_INACTIVITY_MINUTES", 60i64)?)?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
            avatar_api: lookup("AVATAR_API").unwrap_or(defaults.avatar_api),
            avatar_candidates: parse_or(&lookup, "AVATAR_CANDIDATES", defaults.avatar_candidates)?,
        };

        if config.socket_buffer == 0 {
            return Err(anyhow!("SOCKET_BUFFER must be at least 1"));
        }
        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(anyhow!("BCRYPT_COST must be between 4 and 31"));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Sessions may idle for at most a year.
const MAX_SESSION_MINUTES: i64 = 365 * 24 * 60;

fn session_inactivity(minutes: i64) -> anyhow::Result<time::Duration> {
    if !(1..=MAX_SESSION_MINUTES).contains(&minutes) {
        return Err(anyhow!(
            "SESSION_INACTIVITY_MINUTES must be between 1 and {MAX_SESSION_MINUTES}, got {minutes}"
        ));
    }
    Ok(time::Duration::minutes(minutes))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value {raw:?}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
