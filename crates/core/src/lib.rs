pub mod article;
pub mod completion;
pub mod error;
pub mod firecrawl;
pub mod http;
pub mod model_config;
pub mod output;
pub mod prompts;
pub mod scrape;
pub mod settings;
pub mod summary;
pub mod validators;

pub use article::{ArticleContent, MINIMAL_WORD_COUNT, count_words};
pub use completion::{
    ChatCompletionsClient, ChatMessage, Completion, CompletionFailure, CompletionProvider, CompletionRequest,
    Summarizer, default_api_base,
};
pub use error::{CrawlerError, Details, ErrorKind, Result};
pub use firecrawl::{ExtractionProvider, Extractor, FirecrawlClient, ProviderFailure, ScrapePayload};
pub use http::ClientConfig;
pub use model_config::AiModelConfiguration;
pub use output::{OutputFile, SummaryTargets, print_to_console, resolve_scrape_target, resolve_summary_targets, save};
pub use prompts::system_prompt;
pub use scrape::{OutputFormat, ScrapeMetadata, ScrapeRequest, ScrapeResponse};
pub use settings::Settings;
pub use summary::{AiSummary, LengthMode, SummarizeRequest, TokenUsage};
pub use validators::{classify_output_path, derive_filename_from_url, validate_url};
