use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use jobboard_infra::RetentionPolicy;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub port: u16,
    /// Normalized path prefix (`""` or `"/segment..."`, never a trailing slash).
    pub api_prefix: String,
    pub database_max_connections: u32,
    pub retention_sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .trim()
                .parse()
                .context("PORT must be a valid number")?,
            api_prefix: normalize_prefix(get("API_PREFIX").as_deref().unwrap_or("")),
            database_max_connections: get("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .trim()
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            retention_sweep_interval: Duration::from_secs(
                get("RETENTION_SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(|| "60".to_string())
                    .trim()
                    .parse::<u64>()
                    .context("RETENTION_SWEEP_INTERVAL_SECS must be a valid number")?
                    .max(1),
            ),
        })
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::default().with_sweep_interval(self.retention_sweep_interval)
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
