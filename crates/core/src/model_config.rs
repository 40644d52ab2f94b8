//! Parsing of `provider/model-name` identifiers.
//!
//! An [`AiModelConfiguration`] records which provider serves a model, the
//! bare model name sent over the wire, the environment variable holding the
//! provider's credential, and whether the model runs locally.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::{CrawlerError, Result};

/// Providers served without a cloud API key.
pub const LOCAL_PROVIDERS: [&str; 2] = ["ollama", "vllm"];

/// Parsed AI model identifier.
///
/// # Example
///
/// ```rust
/// use crawler_core::AiModelConfiguration;
///
/// let config = AiModelConfiguration::parse("gemini/gemini-pro").unwrap();
/// assert_eq!(config.provider, "gemini");
/// assert_eq!(config.api_key_env_var, Some("GOOGLE_API_KEY"));
/// assert!(!config.is_local);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiModelConfiguration {
    /// Identifier as given, e.g. `gemini/gemini-pro`.
    pub full_name: String,
    pub provider: String,
    /// Model name without the provider prefix.
    pub model_name: String,
    /// Credential variable for known cloud providers; `None` for local and unknown ones.
    pub api_key_env_var: Option<&'static str>,
    pub is_local: bool,
}

impl AiModelConfiguration {
    /// Parses a `provider/model-name` string.
    ///
    /// Exactly one `/` with non-empty text on both sides is required; provider
    /// matching is case-sensitive.
    pub fn parse(model: &str) -> Result<Self> {
        let Some((provider, model_name)) = model.split_once('/') else {
            return Err(CrawlerError::validation(format!(
                "Model name must be in format 'provider/model-name', got: {}",
                model
            ))
            .with_detail("model", model));
        };

        if provider.is_empty() || model_name.is_empty() || model_name.contains('/') {
            return Err(CrawlerError::validation(format!(
                "Invalid model format. Expected 'provider/model-name', got: {}",
                model
            ))
            .with_detail("model", model));
        }

        Ok(Self {
            full_name: model.to_string(),
            provider: provider.to_string(),
            model_name: model_name.to_string(),
            api_key_env_var: api_key_env_var(provider),
            is_local: LOCAL_PROVIDERS.contains(&provider),
        })
    }
}

impl FromStr for AiModelConfiguration {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AiModelConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Credential variable for a provider.
fn api_key_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some("GOOGLE_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        _ => None,
    }
}
