//! Article content handed to the summarizer.
//!
//! This module defines [`ArticleContent`], the markdown body of a scraped page
//! together with its title, word count and the provider metadata worth
//! keeping.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;
use url::Url;

use crate::scrape::ScrapeResponse;

/// Articles with fewer words than this are too short to summarize meaningfully.
pub const MINIMAL_WORD_COUNT: usize = 100;

/// A scraped article in markdown form.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleContent {
    /// Original article URL.
    pub url: Url,

    /// Title from the page metadata, or derived from the URL.
    pub title: String,

    /// Article body as markdown.
    pub markdown: String,

    /// ISO 639-1 language code when known. Left unset by the scraper.
    pub detected_language: Option<String>,

    /// Number of whitespace-delimited tokens in `markdown`.
    pub word_count: usize,

    #[serde(with = "time::serde::rfc3339")]
    pub crawl_timestamp: OffsetDateTime,

    /// Extra provider metadata (`source_url`, `description`, `keywords`).
    pub metadata: Option<BTreeMap<String, String>>,
}

impl ArticleContent {
    /// Creates an article, counting words and stamping the crawl time.
    pub fn new(url: Url, title: impl Into<String>, markdown: impl Into<String>) -> Self {
        let markdown = markdown.into();
        let word_count = count_words(&markdown);

        Self {
            url,
            title: title.into(),
            markdown,
            detected_language: None,
            word_count,
            crawl_timestamp: OffsetDateTime::now_utc(),
            metadata: None,
        }
    }

    /// Builds an article from a markdown scrape of `url`.
    ///
    /// The title falls back to the URL's last path segment when the provider
    /// reported none. The crawl time is the provider's scrape time.
    pub fn from_scrape_response(url: Url, response: &ScrapeResponse) -> Self {
        let meta = response.metadata();
        let title = meta.title.clone().unwrap_or_else(|| title_from_url(url.as_str()));

        let mut extra = BTreeMap::new();
        extra.insert("source_url".to_string(), meta.source_url.clone());
        if let Some(description) = &meta.description {
            extra.insert("description".to_string(), description.clone());
        }
        if let Some(keywords) = &meta.keywords {
            extra.insert("keywords".to_string(), keywords.clone());
        }

        let mut article = Self::new(url, title, response.content());
        article.crawl_timestamp = meta.scraped_at;
        article.metadata = Some(extra);
        article
    }

    /// True when the article is too short to summarize meaningfully.
    pub fn is_minimal(&self) -> bool {
        self.word_count < MINIMAL_WORD_COUNT
    }
}

/// Counts whitespace-delimited tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn title_from_url(url: &str) -> String {
    url.split('/').filter(|s| !s.is_empty()).next_back().unwrap_or(url).to_string()
}
