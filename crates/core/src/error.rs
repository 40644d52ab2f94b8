//! Error types for crawler operations.
//!
//! Every failure the pipeline can produce is a [`CrawlerError`]. Each variant
//! maps to one kind of the error taxonomy and carries a human-readable
//! message, an exit code, and optional structured details that the CLI
//! renders next to the message.
//!
//! # Example
//!
//! ```rust
//! use crawler_core::{CrawlerError, ErrorKind};
//!
//! let err = CrawlerError::rate_limit("Rate limit exceeded for gemini. Please try again later.")
//!     .with_detail("provider", "gemini");
//!
//! assert_eq!(err.kind(), ErrorKind::RateLimit);
//! assert_eq!(err.exit_code(), 3);
//! assert_eq!(err.details().get("provider").map(String::as_str), Some("gemini"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Structured context attached to an error, ordered by key for stable output.
pub type Details = BTreeMap<String, String>;

/// Exit code for generic, validation, extraction and output failures.
pub const EXIT_GENERAL: u8 = 1;
/// Exit code for configuration failures (missing env var, unsupported provider, unknown model).
pub const EXIT_CONFIGURATION: u8 = 2;
/// Exit code for throttling and AI service failures.
pub const EXIT_SERVICE: u8 = 3;

/// The taxonomy kind of a [`CrawlerError`], used by command handlers to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Validation,
    ExtractionFailed,
    RateLimit,
    AiService,
    TokenLimitExceeded,
    ModelNotFound,
    Output,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::ExtractionFailed => "extraction",
            ErrorKind::RateLimit => "rate limit",
            ErrorKind::AiService => "AI service",
            ErrorKind::TokenLimitExceeded => "token limit",
            ErrorKind::ModelNotFound => "model not found",
            ErrorKind::Output => "output",
        };
        f.write_str(name)
    }
}

/// Main error type for scraping and summarization.
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// Missing or invalid configuration.
    ///
    /// Returned for a missing required environment variable, a disallowed
    /// model provider, or a cloud provider without its API key.
    #[error("{message}")]
    Configuration { message: String, details: Details },

    /// Malformed user input such as a URL or a model string.
    #[error("{message}")]
    Validation { message: String, details: Details },

    /// The extraction provider failed for a reason other than throttling.
    #[error("{message}")]
    ExtractionFailed { message: String, details: Details },

    /// The extraction or completion provider signalled throttling.
    #[error("{message}")]
    RateLimit { message: String, details: Details },

    /// A completion provider failure not otherwise classified.
    ///
    /// Authentication failures use exit code 2, everything else 3.
    #[error("{message}")]
    AiService { message: String, code: u8, details: Details },

    /// The article does not fit in the model's context window.
    #[error("{message}")]
    TokenLimitExceeded { message: String, details: Details },

    /// The completion provider rejected the model identifier.
    #[error("{message}")]
    ModelNotFound { message: String, details: Details },

    /// Writing an output file failed.
    #[error("{message}")]
    Output {
        message: String,
        details: Details,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl CrawlerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CrawlerError::Configuration { message: message.into(), details: Details::new() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CrawlerError::Validation { message: message.into(), details: Details::new() }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        CrawlerError::ExtractionFailed { message: message.into(), details: Details::new() }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        CrawlerError::RateLimit { message: message.into(), details: Details::new() }
    }

    /// Generic AI service failure with the default exit code.
    pub fn ai_service(message: impl Into<String>) -> Self {
        CrawlerError::AiService { message: message.into(), code: EXIT_SERVICE, details: Details::new() }
    }

    /// AI service failure reported with a specific exit code.
    pub fn ai_service_with_code(message: impl Into<String>, code: u8) -> Self {
        CrawlerError::AiService { message: message.into(), code, details: Details::new() }
    }

    pub fn token_limit(message: impl Into<String>) -> Self {
        CrawlerError::TokenLimitExceeded { message: message.into(), details: Details::new() }
    }

    pub fn model_not_found(message: impl Into<String>) -> Self {
        CrawlerError::ModelNotFound { message: message.into(), details: Details::new() }
    }

    pub fn output(message: impl Into<String>, source: std::io::Error) -> Self {
        CrawlerError::Output { message: message.into(), details: Details::new(), source: Some(source) }
    }

    /// Attaches a key/value pair to the error's details.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details_mut().insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CrawlerError::Configuration { .. } => ErrorKind::Configuration,
            CrawlerError::Validation { .. } => ErrorKind::Validation,
            CrawlerError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            CrawlerError::RateLimit { .. } => ErrorKind::RateLimit,
            CrawlerError::AiService { .. } => ErrorKind::AiService,
            CrawlerError::TokenLimitExceeded { .. } => ErrorKind::TokenLimitExceeded,
            CrawlerError::ModelNotFound { .. } => ErrorKind::ModelNotFound,
            CrawlerError::Output { .. } => ErrorKind::Output,
        }
    }

    /// Process exit code associated with this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            CrawlerError::Configuration { .. } | CrawlerError::ModelNotFound { .. } => EXIT_CONFIGURATION,
            CrawlerError::Validation { .. } | CrawlerError::ExtractionFailed { .. } | CrawlerError::Output { .. } => {
                EXIT_GENERAL
            }
            CrawlerError::RateLimit { .. } | CrawlerError::TokenLimitExceeded { .. } => EXIT_SERVICE,
            CrawlerError::AiService { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CrawlerError::Configuration { message, .. }
            | CrawlerError::Validation { message, .. }
            | CrawlerError::ExtractionFailed { message, .. }
            | CrawlerError::RateLimit { message, .. }
            | CrawlerError::AiService { message, .. }
            | CrawlerError::TokenLimitExceeded { message, .. }
            | CrawlerError::ModelNotFound { message, .. }
            | CrawlerError::Output { message, .. } => message,
        }
    }

    pub fn details(&self) -> &Details {
        match self {
            CrawlerError::Configuration { details, .. }
            | CrawlerError::Validation { details, .. }
            | CrawlerError::ExtractionFailed { details, .. }
            | CrawlerError::RateLimit { details, .. }
            | CrawlerError::AiService { details, .. }
            | CrawlerError::TokenLimitExceeded { details, .. }
            | CrawlerError::ModelNotFound { details, .. }
            | CrawlerError::Output { details, .. } => details,
        }
    }

    fn details_mut(&mut self) -> &mut Details {
        match self {
            CrawlerError::Configuration { details, .. }
            | CrawlerError::Validation { details, .. }
            | CrawlerError::ExtractionFailed { details, .. }
            | CrawlerError::RateLimit { details, .. }
            | CrawlerError::AiService { details, .. }
            | CrawlerError::TokenLimitExceeded { details, .. }
            | CrawlerError::ModelNotFound { details, .. }
            | CrawlerError::Output { details, .. } => details,
        }
    }

    /// Renders the details as `key=value` pairs, or `None` when there are none.
    pub fn details_line(&self) -> Option<String> {
        let details = self.details();
        if details.is_empty() {
            return None;
        }

        Some(details.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(", "))
    }
}

/// Result type alias for CrawlerError.
pub type Result<T> = std::result::Result<T, CrawlerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_exit_codes_per_kind() {
        assert_eq!(CrawlerError::configuration("x").exit_code(), 2);
        assert_eq!(CrawlerError::validation("x").exit_code(), 1);
        assert_eq!(CrawlerError::extraction("x").exit_code(), 1);
        assert_eq!(CrawlerError::rate_limit("x").exit_code(), 3);
        assert_eq!(CrawlerError::ai_service("x").exit_code(), 3);
        assert_eq!(CrawlerError::token_limit("x").exit_code(), 3);
        assert_eq!(CrawlerError::model_not_found("x").exit_code(), 2);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(CrawlerError::output("x", io).exit_code(), 1);
    }

    #[test]
    fn test_ai_service_custom_code() {
        let err = CrawlerError::ai_service_with_code("Missing or invalid API key for gemini.", 2);
        assert_eq!(err.kind(), ErrorKind::AiService);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_error_display_is_message() {
        let err = CrawlerError::validation("Invalid URL: not a url");
        assert_eq!(err.to_string(), "Invalid URL: not a url");
        assert_eq!(err.message(), "Invalid URL: not a url");
    }

    #[test]
    fn test_details_line() {
        let err = CrawlerError::configuration("Missing API key")
            .with_detail("missing_env", "GOOGLE_API_KEY")
            .with_detail("provider", "gemini");
        assert_eq!(err.details_line().as_deref(), Some("missing_env=GOOGLE_API_KEY, provider=gemini"));
        assert!(CrawlerError::configuration("x").details_line().is_none());
    }

    #[test]
    fn test_output_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CrawlerError::output("Failed to write output file: denied", io);
        assert!(err.source().is_some());
        assert_eq!(err.kind(), ErrorKind::Output);
    }
}
