//! Server configuration parsed from environment variables.
//!
//! `.env` is loaded by `main` before this runs, so values may come from
//! either source. Parsing goes through a lookup closure so tests never
//! touch the process environment.

use std::time::Duration;

use crate::rate_limit::{
    DEFAULT_GLOBAL_LIMIT, DEFAULT_GLOBAL_WINDOW_SECS, DEFAULT_PER_LIST_LIMIT, DEFAULT_PER_LIST_WINDOW_SECS,
    RateLimitConfig,
};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SUGGESTION_MAX_TOKENS: u32 = 8192;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL required when STORE_BACKEND=postgres")]
    MissingDatabaseUrl,
    #[error("unknown STORE_BACKEND: {0}")]
    UnknownBackend(String),
    #[error("invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreBackend,
    /// Origin used when rendering share links, e.g. `https://wish.example`.
    pub public_base_url: Option<String>,
    pub affiliate_tag: Option<String>,
    pub suggestion_max_tokens: u32,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns an error for malformed values or a Postgres backend without
    /// `DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store = match var("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres {
                database_url: non_empty(var("DATABASE_URL")).ok_or(ConfigError::MissingDatabaseUrl)?,
                max_connections: parse(&var, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            },
            "memory" => StoreBackend::Memory,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let rate_limit = RateLimitConfig {
            per_list_limit: parse(&var, "RATE_LIMIT_PER_LIST", DEFAULT_PER_LIST_LIMIT)?,
            per_list_window: Duration::from_secs(parse(
                &var,
                "RATE_LIMIT_PER_LIST_WINDOW_SECS",
                DEFAULT_PER_LIST_WINDOW_SECS,
            )?),
            global_limit: parse(&var, "RATE_LIMIT_GLOBAL", DEFAULT_GLOBAL_LIMIT)?,
            global_window: Duration::from_secs(parse(&var, "RATE_LIMIT_GLOBAL_WINDOW_SECS", DEFAULT_GLOBAL_WINDOW_SECS)?),
        };

        Ok(Self {
            port: parse(&var, "PORT", DEFAULT_PORT)?,
            store,
            public_base_url: non_empty(var("PUBLIC_BASE_URL")).map(|u| u.trim_end_matches('/').to_string()),
            affiliate_tag: non_empty(var("AFFILIATE_TAG")),
            suggestion_max_tokens: parse(&var, "SUGGESTION_MAX_TOKENS", DEFAULT_SUGGESTION_MAX_TOKENS)?,
            rate_limit,
        })
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Absent means default; present but unparseable is an error.
fn parse<T>(var: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match non_empty(var(key)) {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
