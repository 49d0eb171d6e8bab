use std::time::Duration;

use anyhow::{Context, Result};

/// Backend configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub agent_url: String,
    pub poll_interval: Duration,
    pub poll_grace: Duration,
    /// `None` polls until the agent finishes.
    pub poll_max_attempts: Option<u32>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            agent_url: env_or("AGENT_URL", "http://localhost:5001"),
            poll_interval: Duration::from_secs(parse_env("POLL_INTERVAL_SECS", "2")?),
            poll_grace: Duration::from_secs(parse_env("POLL_GRACE_SECS", "3")?),
            poll_max_attempts: match std::env::var("POLL_MAX_ATTEMPTS") {
                Ok(raw) => Some(
                    raw.parse()
                        .context("POLL_MAX_ATTEMPTS must be a positive whole number")?,
                ),
                Err(_) => None,
            },
            port: env_or("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env(key: &str, default: &str) -> Result<u64> {
    env_or(key, default)
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds"))
}
