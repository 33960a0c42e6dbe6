//! Configuration management for the sync service.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// How many queued plans a sync run pushes at once
    pub concurrency: usize,
    /// Upper bound on a single `push_plan` call
    pub push_timeout: Duration,
    /// Upper bound on the connectivity probe
    pub connectivity_timeout: Duration,
    /// Where the local store keeps its queue, if anywhere
    pub local_store_path: Option<PathBuf>,
    /// Key material for credential protection
    pub auth_secret: Option<String>,
    /// Sync attempts the demo makes before giving up
    pub retry_attempts: u32,
    /// Pause between demo sync attempts
    pub retry_delay: Duration,
    /// Probability the demo remote reports itself reachable
    pub demo_online_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: 4,
            push_timeout: Duration::from_millis(5_000),
            connectivity_timeout: Duration::from_millis(2_000),
            local_store_path: None,
            auth_secret: None,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
            demo_online_ratio: 0.5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let concurrency = parse_or(&lookup, "SYNC_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            return Err(ConfigError::InvalidValue("SYNC_CONCURRENCY"));
        }

        let push_timeout = millis_or(&lookup, "SYNC_PUSH_TIMEOUT_MS", defaults.push_timeout)?;
        let connectivity_timeout = millis_or(
            &lookup,
            "SYNC_CONNECTIVITY_TIMEOUT_MS",
            defaults.connectivity_timeout,
        )?;

        let local_store_path = lookup("LOCAL_STORE_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let auth_secret = lookup("AUTH_SECRET");

        let retry_attempts = parse_or(&lookup, "SYNC_RETRY_ATTEMPTS", defaults.retry_attempts)?;
        let retry_delay = millis_or(&lookup, "SYNC_RETRY_DELAY_MS", defaults.retry_delay)?;

        let demo_online_ratio: f64 =
            parse_or(&lookup, "DEMO_ONLINE_RATIO", defaults.demo_online_ratio)?;
        if !(0.0..=1.0).contains(&demo_online_ratio) {
            return Err(ConfigError::InvalidValue("DEMO_ONLINE_RATIO"));
        }

        Ok(Self {
            concurrency,
            push_timeout,
            connectivity_timeout,
            local_store_path,
            auth_secret,
            retry_attempts,
            retry_delay,
            demo_online_ratio,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

fn millis_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms = parse_or(lookup, key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {0} value")]
    InvalidValue(&'static str),
}
