use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::Secret;

use crate::completion::service::DEFAULT_ATTEMPT_TIMEOUT;
use crate::llm_client::ANTHROPIC_API_URL;
use crate::retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};
use crate::scoring::embeddings::OPENAI_EMBEDDINGS_URL;

const DEFAULT_EMBEDDINGS_CACHE_DIR: &str = ".fastembed_cache";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Secret<String>,
    /// Bearer token clients must present on `/api/v1/*`.
    pub api_key: Secret<String>,
    pub llm_api_url: String,
    /// Enables the HTTP embedder when set; otherwise embeddings are local.
    pub embeddings_api_key: Option<Secret<String>>,
    pub embeddings_url: String,
    /// Where the local embedding model is cached between runs.
    pub embeddings_cache_dir: PathBuf,
    pub retry: RetryPolicy,
    pub llm_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_retries = parse_env("MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        let base_delay_ms = parse_env("RETRY_BASE_DELAY_MS", DEFAULT_BASE_DELAY.as_millis() as u64)?;

        Ok(Config {
            anthropic_api_key: Secret::new(require_env("ANTHROPIC_API_KEY")?),
            api_key: Secret::new(require_env("API_KEY")?),
            llm_api_url: optional_env("LLM_API_URL").unwrap_or_else(|| ANTHROPIC_API_URL.to_string()),
            embeddings_api_key: optional_env("EMBEDDINGS_API_KEY").map(Secret::new),
            embeddings_url: optional_env("EMBEDDINGS_URL")
                .unwrap_or_else(|| OPENAI_EMBEDDINGS_URL.to_string()),
            embeddings_cache_dir: optional_env("EMBEDDINGS_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EMBEDDINGS_CACHE_DIR)),
            retry: RetryPolicy::new(max_retries, Duration::from_millis(base_delay_ms)),
            llm_timeout: Duration::from_secs(parse_env(
                "LLM_TIMEOUT_SECS",
                DEFAULT_ATTEMPT_TIMEOUT.as_secs(),
            )?),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
