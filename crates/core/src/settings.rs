//! Environment-backed configuration.
//!
//! [`Settings`] is read once at process start and passed by reference into
//! the adapters; nothing below the command layer touches the environment.

use tracing::debug;

use crate::http::ClientConfig;
use crate::model_config::AiModelConfiguration;
use crate::{CrawlerError, Result};

pub const FIRECRAWL_API_URL: &str = "FIRECRAWL_API_URL";
pub const FIRECRAWL_API_KEY: &str = "FIRECRAWL_API_KEY";
pub const DEFAULT_AI_MODEL: &str = "DEFAULT_AI_MODEL";
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const AI_API_BASE_URL: &str = "AI_API_BASE_URL";
pub const CRAWLER_TIMEOUT_SECS: &str = "CRAWLER_TIMEOUT_SECS";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the Firecrawl-compatible extraction service.
    pub firecrawl_api_url: String,
    /// May be empty for self-hosted deployments without auth.
    pub firecrawl_api_key: String,
    /// `provider/model` used when `--model` is omitted.
    pub default_ai_model: Option<String>,
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Overrides the completion endpoint base for every provider.
    pub ai_api_base: Option<String>,
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Loads settings from the process environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env file"),
            Err(e) => debug!(error = %e, "no .env file loaded"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let firecrawl_api_url = get(FIRECRAWL_API_URL).ok_or_else(|| {
            CrawlerError::configuration(format!("Missing required configuration: {} is not set", FIRECRAWL_API_URL))
                .with_detail("missing_env", FIRECRAWL_API_URL)
        })?;

        let request_timeout_secs = match get(CRAWLER_TIMEOUT_SECS) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                CrawlerError::configuration(format!("{} must be a whole number of seconds, got: {}", CRAWLER_TIMEOUT_SECS, raw))
                    .with_detail("invalid_env", CRAWLER_TIMEOUT_SECS)
            })?,
            None => ClientConfig::default().timeout,
        };

        Ok(Self {
            firecrawl_api_url,
            firecrawl_api_key: get(FIRECRAWL_API_KEY).unwrap_or_default(),
            default_ai_model: get(DEFAULT_AI_MODEL),
            google_api_key: get(GOOGLE_API_KEY),
            openai_api_key: get(OPENAI_API_KEY),
            anthropic_api_key: get(ANTHROPIC_API_KEY),
            ai_api_base: get(AI_API_BASE_URL),
            request_timeout_secs,
        })
    }

    /// The credential configured for a model's provider, if any.
    pub fn api_key_for(&self, model: &AiModelConfiguration) -> Option<&str> {
        match model.api_key_env_var? {
            GOOGLE_API_KEY => self.google_api_key.as_deref(),
            OPENAI_API_KEY => self.openai_api_key.as_deref(),
            ANTHROPIC_API_KEY => self.anthropic_api_key.as_deref(),
            _ => None,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig { timeout: self.request_timeout_secs, ..ClientConfig::default() }
    }
}
