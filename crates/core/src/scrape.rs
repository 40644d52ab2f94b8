//! Scrape request and response types.
//!
//! [`ScrapeRequest`] is built by the scrape command and consumed once by the
//! extraction adapter, which answers with a [`ScrapeResponse`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use time::OffsetDateTime;
use url::Url;

use crate::validators::validate_url;
use crate::{CrawlerError, Result};

/// Output format for scraped content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown produced by the extraction provider.
    #[default]
    Markdown,
    /// Cleaned HTML produced by the extraction provider.
    Html,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
        }
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            _ => Err(CrawlerError::validation(format!("Invalid format: {}. Valid options: markdown, html", s))),
        }
    }
}

/// Parameters for scraping a single page.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRequest {
    /// Page to scrape; always http or https.
    pub url: Url,
    pub format: OutputFormat,
    /// Output file or directory; `None` means stdout.
    pub output_path: Option<String>,
}

impl ScrapeRequest {
    /// Builds a request, rejecting URLs that are not absolute http(s) URLs.
    pub fn new(url: &str, format: OutputFormat, output_path: Option<String>) -> Result<Self> {
        let url = validate_url(url)?;
        Ok(Self { url, format, output_path })
    }
}

/// Page metadata reported by the extraction provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    /// URL the provider reports as the source, or the requested URL.
    pub source_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scraped_at: OffsetDateTime,
}

impl ScrapeMetadata {
    /// Metadata with only the mandatory fields, stamped with the current time.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            title: None,
            description: None,
            keywords: None,
            source_url: source_url.into(),
            scraped_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Result of a scrape.
///
/// A failed response always carries an error message and a successful one
/// never does; [`ScrapeResponse::new`] enforces both.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResponse {
    content: String,
    format: OutputFormat,
    metadata: ScrapeMetadata,
    success: bool,
    error_message: Option<String>,
}

impl ScrapeResponse {
    pub fn new(
        content: String,
        format: OutputFormat,
        metadata: ScrapeMetadata,
        success: bool,
        error_message: Option<String>,
    ) -> Result<Self> {
        match (success, &error_message) {
            (false, None) => Err(CrawlerError::validation("error_message required when success=false")),
            (true, Some(_)) => Err(CrawlerError::validation("error_message must be absent when success=true")),
            _ => Ok(Self { content, format, metadata, success, error_message }),
        }
    }

    /// Successful response; cannot violate the error-message invariant.
    pub fn succeeded(content: String, format: OutputFormat, metadata: ScrapeMetadata) -> Self {
        Self { content, format, metadata, success: true, error_message: None }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn metadata(&self) -> &ScrapeMetadata {
        &self.metadata
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}
