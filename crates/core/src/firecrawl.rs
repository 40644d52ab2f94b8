//! Extraction adapter for Firecrawl-compatible scrape APIs.
//!
//! The provider is reached through the [`ExtractionProvider`] trait so the
//! translation logic in [`Extractor`] works against any backend. Responses
//! arrive either as a wrapped, typed document or as a flat key/value object;
//! [`ScrapePayload`] picks the matching [`FieldAccess`] variant once, at the
//! boundary, and the rest of the pipeline only sees [`ScrapeResponse`].

use std::fmt;
use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::article::ArticleContent;
use crate::http::{ClientConfig, error_message_from_body};
use crate::scrape::{OutputFormat, ScrapeMetadata, ScrapeRequest, ScrapeResponse};
use crate::settings::Settings;
use crate::{CrawlerError, ErrorKind, Result};

/// Key used when no Firecrawl API key is configured; self-hosted instances ignore it.
pub const PLACEHOLDER_API_KEY: &str = "dummy-key-for-self-hosted";

/// Every scrape asks for both representations.
pub const REQUESTED_FORMATS: [&str; 2] = ["markdown", "html"];

/// A failed call to the extraction provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// HTTP status when the provider answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// True for HTTP 429 or any message mentioning a rate limit.
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429) || self.message.contains("429") || self.message.to_lowercase().contains("rate limit")
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Read access to named fields of a provider response.
pub trait FieldAccess {
    /// Top-level content field such as `markdown` or `html`.
    fn field(&self, name: &str) -> Option<String>;

    /// Field of the nested `metadata` object, e.g. `title` or `sourceURL`.
    fn metadata_field(&self, name: &str) -> Option<String>;
}

/// Typed document returned inside `{"success": true, "data": {...}}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScrapeDocument {
    pub markdown: Option<String>,
    pub html: Option<String>,
    pub metadata: Option<DocumentMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    #[serde(rename = "sourceURL")]
    pub source_url: Option<String>,
}

impl FieldAccess for ScrapeDocument {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "markdown" => self.markdown.clone(),
            "html" => self.html.clone(),
            _ => None,
        }
    }

    fn metadata_field(&self, name: &str) -> Option<String> {
        let meta = self.metadata.as_ref()?;
        match name {
            "title" => meta.title.clone(),
            "description" => meta.description.clone(),
            "keywords" => meta.keywords.clone(),
            "sourceURL" => meta.source_url.clone(),
            _ => None,
        }
    }
}

impl FieldAccess for Map<String, Value> {
    fn field(&self, name: &str) -> Option<String> {
        self.get(name).and_then(value_to_string)
    }

    fn metadata_field(&self, name: &str) -> Option<String> {
        self.get("metadata")?.as_object()?.get(name).and_then(value_to_string)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_string).collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// A successful provider response in whichever shape it arrived.
#[derive(Debug, Clone)]
pub enum ScrapePayload {
    /// Structured document deserialised from the `data` envelope.
    Document(ScrapeDocument),
    /// Generic key/value object.
    Map(Map<String, Value>),
}

impl ScrapePayload {
    /// Classifies a decoded response body.
    ///
    /// A `data` object is tried as a typed document first and kept as a map
    /// if it does not fit; a body without `data` is used as a flat map. An
    /// explicit `"success": false` is a provider failure.
    pub fn from_json(body: Value) -> std::result::Result<Self, ProviderFailure> {
        let Value::Object(mut map) = body else {
            return Err(ProviderFailure::new(None, "unexpected response shape: expected a JSON object"));
        };

        if map.get("success") == Some(&Value::Bool(false)) {
            let message = map
                .get("error")
                .and_then(value_to_string)
                .unwrap_or_else(|| "provider reported an unsuccessful scrape".to_string());
            return Err(ProviderFailure::new(None, message));
        }

        match map.remove("data") {
            Some(Value::Object(data)) => {
                match serde_json::from_value::<ScrapeDocument>(Value::Object(data.clone())) {
                    Ok(doc) => Ok(ScrapePayload::Document(doc)),
                    Err(e) => {
                        debug!(error = %e, "scrape document did not match the typed shape, using map access");
                        Ok(ScrapePayload::Map(data))
                    }
                }
            }
            Some(other) => {
                map.insert("data".to_string(), other);
                Ok(ScrapePayload::Map(map))
            }
            None => Ok(ScrapePayload::Map(map)),
        }
    }

    fn access(&self) -> &dyn FieldAccess {
        match self {
            ScrapePayload::Document(doc) => doc,
            ScrapePayload::Map(map) => map,
        }
    }

    pub fn field(&self, name: &str) -> Option<String> {
        self.access().field(name)
    }

    pub fn metadata_field(&self, name: &str) -> Option<String> {
        self.access().metadata_field(name)
    }
}

/// The external content-extraction capability.
pub trait ExtractionProvider {
    /// Scrapes `url`, asking for the given representations.
    fn extract(
        &self,
        url: &str,
        formats: &[&str],
    ) -> impl Future<Output = std::result::Result<ScrapePayload, ProviderFailure>> + Send;
}

#[derive(Serialize)]
struct ScrapeBody<'a> {
    url: &'a str,
    formats: &'a [&'a str],
}

/// HTTP client for a Firecrawl-compatible `/v1/scrape` endpoint.
#[derive(Debug, Clone)]
pub struct FirecrawlClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl FirecrawlClient {
    /// Creates a client. An empty `api_key` is replaced by [`PLACEHOLDER_API_KEY`].
    pub fn new(api_url: impl Into<String>, api_key: &str, config: &ClientConfig) -> Result<Self> {
        let api_key = if api_key.is_empty() { PLACEHOLDER_API_KEY } else { api_key };
        Ok(Self { client: config.build_client()?, api_url: api_url.into(), api_key: api_key.to_string() })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.firecrawl_api_url, &settings.firecrawl_api_key, &settings.client_config())
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/scrape", self.api_url.trim_end_matches('/'))
    }
}

impl ExtractionProvider for FirecrawlClient {
    async fn extract(&self, url: &str, formats: &[&str]) -> std::result::Result<ScrapePayload, ProviderFailure> {
        let endpoint = self.endpoint();
        debug!(%endpoint, url, ?formats, "sending scrape request");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&ScrapeBody { url, formats })
            .send()
            .await
            .map_err(|e| ProviderFailure::new(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ProviderFailure::new(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderFailure::new(Some(status.as_u16()), error_message_from_body(&body)));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderFailure::new(Some(status.as_u16()), format!("invalid JSON in scrape response: {}", e)))?;

        ScrapePayload::from_json(value)
    }
}

/// Translates between scrape requests and the extraction provider.
#[derive(Debug, Clone)]
pub struct Extractor<P> {
    provider: P,
}

impl Extractor<FirecrawlClient> {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(FirecrawlClient::from_settings(settings)?))
    }
}

impl<P: ExtractionProvider> Extractor<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Scrapes the requested page and returns content in the requested format.
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeResponse> {
        let url = request.url.as_str();

        let payload = self.provider.extract(url, &REQUESTED_FORMATS).await.map_err(|failure| {
            let err = classify_failure(&failure).with_detail("url", url);
            if err.kind() == ErrorKind::RateLimit {
                warn!(url, %failure, "extraction provider rate limited the request");
            }
            err
        })?;

        let content = payload.field(request.format.as_str()).unwrap_or_default();
        let metadata = ScrapeMetadata {
            title: payload.metadata_field("title"),
            description: payload.metadata_field("description"),
            keywords: payload.metadata_field("keywords"),
            source_url: payload.metadata_field("sourceURL").unwrap_or_else(|| url.to_string()),
            scraped_at: OffsetDateTime::now_utc(),
        };

        info!(url, format = %request.format, bytes = content.len(), "page scraped");
        Ok(ScrapeResponse::succeeded(content, request.format, metadata))
    }

    /// Scrapes `url` as markdown and packages it for summarization.
    pub async fn scrape_to_article_content(&self, url: &str) -> Result<ArticleContent> {
        let request = ScrapeRequest::new(url, OutputFormat::Markdown, None)?;
        let response = self.scrape(&request).await?;
        Ok(ArticleContent::from_scrape_response(request.url, &response))
    }
}

/// Maps a provider failure onto the error taxonomy.
pub fn classify_failure(failure: &ProviderFailure) -> CrawlerError {
    let err = if failure.is_rate_limited() {
        CrawlerError::rate_limit("Firecrawl API rate limit exceeded")
    } else {
        CrawlerError::extraction(format!("Failed to scrape URL: {}", failure))
    };

    match failure.status {
        Some(status) => err.with_detail("status", status.to_string()),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticProvider(std::result::Result<Value, ProviderFailure>);

    impl ExtractionProvider for StaticProvider {
        async fn extract(&self, _url: &str, formats: &[&str]) -> std::result::Result<ScrapePayload, ProviderFailure> {
            assert_eq!(formats, REQUESTED_FORMATS);
            ScrapePayload::from_json(self.0.clone()?)
        }
    }

    fn run<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(fut)
    }

    fn request(format: OutputFormat) -> ScrapeRequest {
        ScrapeRequest::new("https://example.com/post", format, None).unwrap()
    }

    #[test]
    fn test_payload_from_wrapped_document() {
        let payload = ScrapePayload::from_json(json!({
            "success": true,
            "data": {"markdown": "# Hi", "html": "<h1>Hi</h1>", "metadata": {"title": "Hi", "sourceURL": "https://x"}}
        }))
        .unwrap();

        assert!(matches!(payload, ScrapePayload::Document(_)));
        assert_eq!(payload.field("markdown").as_deref(), Some("# Hi"));
        assert_eq!(payload.metadata_field("sourceURL").as_deref(), Some("https://x"));
    }

    #[test]
    fn test_payload_falls_back_to_map() {
        let payload = ScrapePayload::from_json(json!({
            "data": {"markdown": "# Hi", "metadata": {"keywords": ["rust", "cli"], "statusCode": 200}}
        }))
        .unwrap();

        assert!(matches!(payload, ScrapePayload::Map(_)));
        assert_eq!(payload.field("markdown").as_deref(), Some("# Hi"));
        assert_eq!(payload.metadata_field("keywords").as_deref(), Some("rust, cli"));
        assert_eq!(payload.metadata_field("statusCode").as_deref(), Some("200"));
    }

    #[test]
    fn test_payload_flat_map() {
        let payload = ScrapePayload::from_json(json!({"markdown": "body", "metadata": {"title": "T"}})).unwrap();
        assert!(matches!(payload, ScrapePayload::Map(_)));
        assert_eq!(payload.metadata_field("title").as_deref(), Some("T"));
        assert!(payload.field("html").is_none());
    }

    #[test]
    fn test_payload_unsuccessful() {
        let failure = ScrapePayload::from_json(json!({"success": false, "error": "All scraping engines failed"}))
            .unwrap_err();
        assert_eq!(failure.message, "All scraping engines failed");
        assert!(ScrapePayload::from_json(json!("nope")).is_err());
    }

    #[test]
    fn test_scrape_selects_format() {
        let body = json!({"markdown": "# Title", "html": "<h1>Title</h1>"});
        let extractor = Extractor::new(StaticProvider(Ok(body)));

        let md = run(extractor.scrape(&request(OutputFormat::Markdown))).unwrap();
        assert_eq!(md.content(), "# Title");
        assert_eq!(md.format(), OutputFormat::Markdown);

        let html = run(extractor.scrape(&request(OutputFormat::Html))).unwrap();
        assert_eq!(html.content(), "<h1>Title</h1>");
    }

    #[test]
    fn test_scrape_metadata_defaults() {
        let extractor = Extractor::new(StaticProvider(Ok(json!({"markdown": "text"}))));
        let resp = run(extractor.scrape(&request(OutputFormat::Markdown))).unwrap();

        let meta = resp.metadata();
        assert!(meta.title.is_none());
        assert!(meta.description.is_none());
        assert!(meta.keywords.is_none());
        assert_eq!(meta.source_url, "https://example.com/post");
    }

    #[test]
    fn test_scrape_missing_content_is_empty() {
        let extractor = Extractor::new(StaticProvider(Ok(json!({"metadata": {}}))));
        let resp = run(extractor.scrape(&request(OutputFormat::Html))).unwrap();
        assert_eq!(resp.content(), "");
        assert!(resp.success());
    }

    #[test]
    fn test_rate_limit_classification() {
        let cases = [
            ProviderFailure::new(Some(429), "Too Many Requests"),
            ProviderFailure::new(None, "Request failed with status 429"),
            ProviderFailure::new(Some(500), "Rate Limit reached for team"),
        ];
        for failure in cases {
            let err = classify_failure(&failure);
            assert_eq!(err.kind(), ErrorKind::RateLimit, "{}", failure);
            assert_eq!(err.exit_code(), 3);
        }
    }

    #[test]
    fn test_generic_failure_classification() {
        let err = classify_failure(&ProviderFailure::new(Some(500), "Internal Server Error"));
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
        assert_eq!(err.exit_code(), 1);
        assert!(err.message().contains("Internal Server Error"));
        assert_eq!(err.details().get("status").map(String::as_str), Some("500"));
    }

    #[test]
    fn test_scrape_failure_carries_url() {
        let extractor = Extractor::new(StaticProvider(Err(ProviderFailure::new(None, "connection refused"))));
        let err = run(extractor.scrape(&request(OutputFormat::Markdown))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
        assert_eq!(err.details().get("url").map(String::as_str), Some("https://example.com/post"));
    }

    #[test]
    fn test_scrape_to_article_content() {
        let body = json!({
            "success": true,
            "data": {
                "markdown": "# Example Domain\n\nThis is a test.",
                "metadata": {"title": "Example Domain", "description": "An example", "sourceURL": "https://example.com"}
            }
        });
        let extractor = Extractor::new(StaticProvider(Ok(body)));
        let article = run(extractor.scrape_to_article_content("https://example.com")).unwrap();

        assert_eq!(article.title, "Example Domain");
        assert_eq!(article.word_count, 7);
        assert!(article.is_minimal());
        assert!(article.detected_language.is_none());
        let extra = article.metadata.unwrap();
        assert_eq!(extra.get("source_url").map(String::as_str), Some("https://example.com"));
        assert_eq!(extra.get("description").map(String::as_str), Some("An example"));
    }

    #[test]
    fn test_scrape_to_article_rejects_bad_url() {
        let extractor = Extractor::new(StaticProvider(Ok(json!({}))));
        let err = run(extractor.scrape_to_article_content("example.com")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_placeholder_key() {
        let client = FirecrawlClient::new("http://localhost:3002/", "", &ClientConfig::default()).unwrap();
        assert_eq!(client.api_key, PLACEHOLDER_API_KEY);
        assert_eq!(client.endpoint(), "http://localhost:3002/v1/scrape");

        let client = FirecrawlClient::new("http://localhost:3002", "fc-123", &ClientConfig::default()).unwrap();
        assert_eq!(client.api_key, "fc-123");
    }
}
