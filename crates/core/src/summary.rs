//! Summarization request and result types.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use time::OffsetDateTime;
use url::Url;

use crate::validators::validate_url;
use crate::{CrawlerError, Result};

/// How long the generated summary should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthMode {
    /// 1-2 sentences.
    Brief,
    /// 3-5 key points.
    #[default]
    Standard,
    /// Structured multi-section coverage.
    Detailed,
}

impl LengthMode {
    pub const ALL: [LengthMode; 3] = [LengthMode::Brief, LengthMode::Standard, LengthMode::Detailed];

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthMode::Brief => "brief",
            LengthMode::Standard => "standard",
            LengthMode::Detailed => "detailed",
        }
    }

    /// Soft ceiling on generated completion tokens.
    pub fn max_tokens(&self) -> u32 {
        match self {
            LengthMode::Brief => 100,
            LengthMode::Standard => 300,
            LengthMode::Detailed => 600,
        }
    }
}

impl fmt::Display for LengthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthMode {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "brief" => Ok(Self::Brief),
            "standard" => Ok(Self::Standard),
            "detailed" => Ok(Self::Detailed),
            _ => Err(CrawlerError::validation(format!(
                "Invalid summary length: {}. Must be one of: brief, standard, detailed",
                s
            ))),
        }
    }
}

/// Token accounting reported by the completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// An AI-generated summary and where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct AiSummary {
    pub summary_text: String,
    /// Copied from the article's detected language; usually unknown.
    pub output_language: Option<String>,
    pub length_mode: LengthMode,
    /// Full `provider/model` identifier.
    pub model_used: String,
    pub token_usage: Option<TokenUsage>,
    #[serde(with = "time::serde::rfc3339")]
    pub generation_timestamp: OffsetDateTime,
    pub source_url: String,
    pub source_title: String,
}

impl AiSummary {
    /// Creates a summary stamped with the current UTC time.
    pub fn new(
        summary_text: String,
        length_mode: LengthMode,
        model_used: String,
        source_url: String,
        source_title: String,
    ) -> Self {
        Self {
            summary_text,
            output_language: None,
            length_mode,
            model_used,
            token_usage: None,
            generation_timestamp: OffsetDateTime::now_utc(),
            source_url,
            source_title,
        }
    }
}

/// Parameters of the summarize command.
#[derive(Debug, Clone, Serialize)]
pub struct SummarizeRequest {
    pub url: Url,
    /// `provider/model` override; `None` means the configured default.
    pub model: Option<String>,
    pub length_mode: LengthMode,
    pub output_path: Option<String>,
    /// Also write the original markdown next to the summary.
    pub save_original: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl SummarizeRequest {
    pub fn new(url: &str, model: Option<String>, length_mode: LengthMode) -> Result<Self> {
        Ok(Self {
            url: validate_url(url)?,
            model,
            length_mode,
            output_path: None,
            save_original: false,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    pub fn with_output(mut self, output_path: Option<String>, save_original: bool) -> Self {
        self.output_path = output_path;
        self.save_original = save_original;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_length_mode_parse() {
        for mode in LengthMode::ALL {
            assert_eq!(mode.as_str().parse::<LengthMode>().unwrap(), mode);
        }
        let err = "short".parse::<LengthMode>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("brief, standard, detailed"));
    }

    #[test]
    fn test_length_mode_is_case_sensitive() {
        assert!("Brief".parse::<LengthMode>().is_err());
    }

    #[test]
    fn test_token_budgets() {
        assert_eq!(LengthMode::Brief.max_tokens(), 100);
        assert_eq!(LengthMode::Standard.max_tokens(), 300);
        assert_eq!(LengthMode::Detailed.max_tokens(), 600);
        assert_eq!(LengthMode::default(), LengthMode::Standard);
    }

    #[test]
    fn test_summary_defaults() {
        let before = OffsetDateTime::now_utc();
        let summary = AiSummary::new(
            "Short summary.".into(),
            LengthMode::Brief,
            "gemini/gemini-pro".into(),
            "https://example.com/a".into(),
            "A".into(),
        );
        assert!(summary.generation_timestamp >= before);
        assert!(summary.token_usage.is_none());
        assert!(summary.output_language.is_none());
    }

    #[test]
    fn test_summary_serialization() {
        let mut summary = AiSummary::new(
            "Text".into(),
            LengthMode::Detailed,
            "gemini/gemini-pro".into(),
            "https://example.com".into(),
            "Title".into(),
        );
        summary.token_usage = Some(TokenUsage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 });

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["length_mode"], "detailed");
        assert_eq!(json["token_usage"]["total_tokens"], 15);
        assert!(json["generation_timestamp"].is_string());
    }

    #[test]
    fn test_summarize_request() {
        let request = SummarizeRequest::new("https://example.com/article", None, LengthMode::Standard)
            .unwrap()
            .with_output(Some("out/".into()), true);
        assert!(request.save_original);
        assert_eq!(request.output_path.as_deref(), Some("out/"));

        assert!(SummarizeRequest::new("example.com", None, LengthMode::Brief).is_err());
    }
}
