//! Shared HTTP client setup for the extraction and completion adapters.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{CrawlerError, Result};

/// Transport settings for outbound requests.
///
/// The timeout belongs to the HTTP client; the pipeline itself never retries.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout: 120, user_agent: format!("crawler/{}", env!("CARGO_PKG_VERSION")) }
    }
}

impl ClientConfig {
    pub fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| CrawlerError::configuration(format!("Failed to build HTTP client: {}", e)))
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Understands `{"error": "..."}`, `{"error": {"message": "..."}}`,
/// `{"message": "..."}` and a list wrapping any of those; falls back to the
/// raw body text.
pub(crate) fn error_message_from_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => message_from_value(&value).unwrap_or_else(|| body.trim().to_string()),
        Err(_) => body.trim().to_string(),
    }
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.first().and_then(message_from_value),
        Value::Object(map) => match map.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(nested @ Value::Object(_)) => message_from_value(nested),
            _ => map.get("message").and_then(Value::as_str).map(str::to_string),
        },
        _ => None,
    }
}
