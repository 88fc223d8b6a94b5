use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Where cached recommendations live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            other => bail!("CACHE_BACKEND must be 'redis' or 'memory' (got '{other}')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Budget for one request, propagated to upstream calls.
    pub request_timeout: Duration,
    /// Jobs close this many days after their creation date.
    pub job_open_days: i64,
    /// TTL used when no cached job closes in the future.
    pub cache_min_ttl: Duration,
    pub cache_backend: CacheBackend,
    /// Entry bound for the in-process cache backend.
    pub cache_max_entries: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            port: optional_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            request_timeout: Duration::from_millis(
                optional_env("REQUEST_TIMEOUT_MS", 3_000)
                    .context("REQUEST_TIMEOUT_MS must be a number of milliseconds")?,
            ),
            job_open_days: optional_env("JOB_OPEN_DAYS", 30)
                .context("JOB_OPEN_DAYS must be a number of days")?,
            cache_min_ttl: Duration::from_secs(
                optional_env("CACHE_MIN_TTL_SECS", 86_400)
                    .context("CACHE_MIN_TTL_SECS must be a number of seconds")?,
            ),
            cache_backend: std::env::var("CACHE_BACKEND")
                .unwrap_or_else(|_| "redis".to_string())
                .parse()?,
            cache_max_entries: optional_env("CACHE_MAX_ENTRIES", 100_000)
                .context("CACHE_MAX_ENTRIES must be a number of entries")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_backend_parsing() {
        assert_eq!("redis".parse::<CacheBackend>().unwrap(), CacheBackend::Redis);
        assert_eq!(" Memory ".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert!("memcached".parse::<CacheBackend>().is_err());
    }
}
