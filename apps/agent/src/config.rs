use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Agent configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    /// `None` means LLM calls wait as long as the provider takes.
    pub llm_timeout: Option<Duration>,
    pub output_dir: PathBuf,
    pub sources_file: Option<PathBuf>,
    pub models_file: Option<PathBuf>,
    pub feed_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_base_url: env_or("LLM_BASE_URL", "https://api.siliconflow.cn/v1"),
            llm_model: env_or("LLM_MODEL", "Qwen/Qwen2.5-7B-Instruct"),
            llm_timeout: optional_secs("LLM_TIMEOUT_SECS")?,
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "output")),
            sources_file: std::env::var("SOURCES_FILE").ok().map(PathBuf::from),
            models_file: std::env::var("MODELS_FILE").ok().map(PathBuf::from),
            feed_timeout: Duration::from_secs(
                env_or("FEED_TIMEOUT_SECS", "30")
                    .parse()
                    .context("FEED_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: env_or("PORT", "5001")
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

fn optional_secs(key: &str) -> Result<Option<Duration>> {
    match std::env::var(key) {
        Ok(raw) => {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("{key} must be a whole number of seconds"))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}
