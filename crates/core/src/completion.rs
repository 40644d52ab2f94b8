//! Completion adapter for LLM summarization.
//!
//! [`Summarizer`] turns an [`ArticleContent`] into a chat completion request
//! (system prompt chosen by [`LengthMode`], article markdown as the user
//! message), sends it through a [`CompletionProvider`], and maps provider
//! failures onto the error taxonomy. [`ChatCompletionsClient`] is the HTTP
//! provider speaking the OpenAI-compatible `/chat/completions` protocol that
//! Gemini, OpenAI, Anthropic, Ollama and vLLM all expose.

use std::fmt;
use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::article::ArticleContent;
use crate::http::error_message_from_body;
use crate::model_config::AiModelConfiguration;
use crate::prompts::system_prompt;
use crate::settings::{AI_API_BASE_URL, Settings};
use crate::summary::{AiSummary, LengthMode, TokenUsage};
use crate::{CrawlerError, Result};

/// Sampling temperature for summaries; low to favour factual output.
pub const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Phrases providers use when the input exceeds the context window.
const CONTEXT_WINDOW_MARKERS: [&str; 7] = [
    "context length",
    "context_length",
    "context window",
    "maximum context",
    "too long",
    "input token count",
    "token limit",
];

/// Provider messages that reject the credential on a plain 400.
const INVALID_KEY_MARKERS: [&str; 4] = ["api key not valid", "api_key_invalid", "invalid api key", "unauthenticated"];

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// A single completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model name as the provider knows it, without the `provider/` prefix.
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Generated text plus token accounting when the provider reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Failure signals surfaced by a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionFailure {
    /// Missing, invalid or expired credential.
    Authentication(String),
    RateLimit(String),
    /// Input does not fit the model's context window.
    ContextWindowExceeded(String),
    BadRequest(String),
    Timeout(String),
    Connection(String),
    Other { kind: String, message: String },
}

impl CompletionFailure {
    /// Classifies an HTTP error status and the provider's message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => CompletionFailure::Authentication(message),
            429 => CompletionFailure::RateLimit(message),
            408 | 504 => CompletionFailure::Timeout(message),
            400 | 404 | 413 | 422 => {
                let lower = message.to_lowercase();
                if INVALID_KEY_MARKERS.iter().any(|m| lower.contains(m)) {
                    CompletionFailure::Authentication(message)
                } else if CONTEXT_WINDOW_MARKERS.iter().any(|m| lower.contains(m)) {
                    CompletionFailure::ContextWindowExceeded(message)
                } else {
                    CompletionFailure::BadRequest(message)
                }
            }
            _ => CompletionFailure::Other { kind: format!("HTTP {}", status), message },
        }
    }

    fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionFailure::Timeout(err.to_string())
        } else if err.is_connect() {
            CompletionFailure::Connection(err.to_string())
        } else {
            CompletionFailure::Other { kind: "transport".to_string(), message: err.to_string() }
        }
    }
}

impl fmt::Display for CompletionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionFailure::Authentication(m) => write!(f, "authentication failed: {}", m),
            CompletionFailure::RateLimit(m) => write!(f, "rate limited: {}", m),
            CompletionFailure::ContextWindowExceeded(m) => write!(f, "context window exceeded: {}", m),
            CompletionFailure::BadRequest(m) => write!(f, "bad request: {}", m),
            CompletionFailure::Timeout(m) => write!(f, "timed out: {}", m),
            CompletionFailure::Connection(m) => write!(f, "connection failed: {}", m),
            CompletionFailure::Other { kind, message } => write!(f, "{}: {}", kind, message),
        }
    }
}

/// The external LLM completion capability.
pub trait CompletionProvider {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = std::result::Result<Completion, CompletionFailure>> + Send;
}

/// Default OpenAI-compatible endpoint base for a provider.
pub fn default_api_base(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
        "openai" => Some("https://api.openai.com/v1"),
        "anthropic" => Some("https://api.anthropic.com/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        _ => None,
    }
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone, Debug)]
pub struct ChatCompletionsClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(client: Client, api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self { client, api_base: api_base.into(), api_key }
    }

    /// Client bound to the endpoint and credential for `model`'s provider.
    ///
    /// `AI_API_BASE_URL` wins over the provider default; providers without a
    /// default need it set.
    pub fn for_model(settings: &Settings, model: &AiModelConfiguration) -> Result<Self> {
        let api_base = match settings.ai_api_base.as_deref() {
            Some(base) => base.to_string(),
            None => default_api_base(&model.provider).map(str::to_string).ok_or_else(|| {
                CrawlerError::configuration(format!(
                    "No completion endpoint known for provider '{}'. Set {} to an OpenAI-compatible base URL.",
                    model.provider, AI_API_BASE_URL
                ))
                .with_detail("provider", model.provider.as_str())
            })?,
        };

        let client = settings.client_config().build_client()?;
        Ok(Self::new(client, api_base, settings.api_key_for(model).map(str::to_string)))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

impl CompletionProvider for ChatCompletionsClient {
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<Completion, CompletionFailure> {
        let endpoint = self.endpoint();
        debug!(%endpoint, model = %request.model, max_tokens = request.max_tokens, "sending completion request");

        let mut builder = self.client.post(&endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| CompletionFailure::from_transport(&e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| CompletionFailure::from_transport(&e))?;

        if !status.is_success() {
            return Err(CompletionFailure::from_status(status.as_u16(), error_message_from_body(&body)));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionFailure::Other { kind: "decode".to_string(), message: e.to_string() })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| CompletionFailure::Other {
            kind: "decode".to_string(),
            message: "completion response contained no choices".to_string(),
        })?;

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

/// Generates summaries through a completion provider.
#[derive(Debug, Clone)]
pub struct Summarizer<P> {
    provider: P,
}

impl Summarizer<ChatCompletionsClient> {
    pub fn for_model(settings: &Settings, model: &AiModelConfiguration) -> Result<Self> {
        Ok(Self::new(ChatCompletionsClient::for_model(settings, model)?))
    }
}

impl<P: CompletionProvider> Summarizer<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Builds the completion call for an article.
    pub fn build_request(article: &ArticleContent, model: &AiModelConfiguration, mode: LengthMode) -> CompletionRequest {
        CompletionRequest {
            model: model.model_name.clone(),
            messages: vec![ChatMessage::system(system_prompt(mode)), ChatMessage::user(article.markdown.as_str())],
            temperature: SUMMARY_TEMPERATURE,
            max_tokens: mode.max_tokens(),
        }
    }

    /// Summarizes `article` with `model` at the requested length.
    pub async fn summarize(
        &self,
        article: &ArticleContent,
        model: &AiModelConfiguration,
        mode: LengthMode,
    ) -> Result<AiSummary> {
        let request = Self::build_request(article, model, mode);
        info!(model = %model.full_name, length = %mode, article_words = article.word_count, "calling AI service");

        let completion =
            self.provider.complete(&request).await.map_err(|failure| classify_failure(&failure, model, article))?;

        if let Some(usage) = &completion.usage {
            info!(model = %model.full_name, total_tokens = usage.total_tokens, "AI summary generated");
        }

        let mut summary = AiSummary::new(
            completion.text,
            mode,
            model.full_name.clone(),
            article.url.to_string(),
            article.title.clone(),
        );
        summary.output_language = article.detected_language.clone();
        summary.token_usage = completion.usage;
        Ok(summary)
    }
}

/// Maps a completion failure onto the error taxonomy.
pub fn classify_failure(
    failure: &CompletionFailure,
    model: &AiModelConfiguration,
    article: &ArticleContent,
) -> CrawlerError {
    let provider = model.provider.as_str();
    let full_name = model.full_name.as_str();

    match failure {
        CompletionFailure::Authentication(_) => {
            error!(%failure, provider, "authentication error");
            let env_var = model.api_key_env_var.unwrap_or("the provider's API key");
            CrawlerError::ai_service_with_code(
                format!("Missing or invalid API key for {}. Please set {} in your .env file.", provider, env_var),
                crate::error::EXIT_CONFIGURATION,
            )
            .with_detail("provider", provider)
            .with_detail("model", full_name)
        }
        CompletionFailure::RateLimit(_) => {
            warn!(%failure, provider, "rate limit exceeded");
            CrawlerError::rate_limit(format!("Rate limit exceeded for {}. Please try again later.", provider))
                .with_detail("provider", provider)
                .with_detail("model", full_name)
        }
        CompletionFailure::ContextWindowExceeded(_) => {
            warn!(%failure, model = full_name, "context window exceeded");
            CrawlerError::token_limit(format!(
                "Article is too long for {} context window. Try using 'brief' summary mode or a model with larger context.",
                full_name
            ))
            .with_detail("model", full_name)
            .with_detail("article_word_count", article.word_count.to_string())
        }
        CompletionFailure::BadRequest(message) => {
            error!(%failure, model = full_name, "bad request error");
            let lower = message.to_lowercase();
            if lower.contains("model") || lower.contains("not found") {
                CrawlerError::model_not_found(format!("Model '{}' not found or not supported.", full_name))
                    .with_detail("model", full_name)
                    .with_detail("provider", provider)
            } else {
                CrawlerError::ai_service(format!("Invalid request to AI service: {}", message))
                    .with_detail("model", full_name)
            }
        }
        CompletionFailure::Timeout(message) | CompletionFailure::Connection(message) => {
            error!(%failure, provider, "network error");
            CrawlerError::ai_service(format!("Network error connecting to {}. Please check your connection.", provider))
                .with_detail("provider", provider)
                .with_detail("error", message.as_str())
        }
        CompletionFailure::Other { kind, message } => {
            error!(%failure, model = full_name, "unexpected error in AI service");
            CrawlerError::ai_service(format!("Unexpected error during summarization: {}", message))
                .with_detail("model", full_name)
                .with_detail("error_type", kind.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::prompts::{BRIEF_PROMPT, DETAILED_PROMPT, STANDARD_PROMPT};
    use std::sync::Mutex;
    use url::Url;

    struct RecordingProvider {
        result: std::result::Result<Completion, CompletionFailure>,
        seen: Mutex<Option<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn new(result: std::result::Result<Completion, CompletionFailure>) -> Self {
            Self { result, seen: Mutex::new(None) }
        }
    }

    impl CompletionProvider for RecordingProvider {
        async fn complete(&self, request: &CompletionRequest) -> std::result::Result<Completion, CompletionFailure> {
            *self.seen.lock().unwrap() = Some(request.clone());
            self.result.clone()
        }
    }

    fn run<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(fut)
    }

    fn article() -> ArticleContent {
        ArticleContent::new(Url::parse("https://example.com/article").unwrap(), "Example", "# Example\n\nBody text here.")
    }

    fn gemini() -> AiModelConfiguration {
        AiModelConfiguration::parse("gemini/gemini-1.5-flash").unwrap()
    }

    fn ok_completion() -> Completion {
        Completion {
            text: "A short summary.".to_string(),
            usage: Some(TokenUsage { prompt_tokens: 120, completion_tokens: 20, total_tokens: 140 }),
        }
    }

    #[test]
    fn test_build_request_per_mode() {
        let art = article();
        let cases = [
            (LengthMode::Brief, BRIEF_PROMPT, 100),
            (LengthMode::Standard, STANDARD_PROMPT, 300),
            (LengthMode::Detailed, DETAILED_PROMPT, 600),
        ];

        for (mode, prompt, budget) in cases {
            let req = Summarizer::<RecordingProvider>::build_request(&art, &gemini(), mode);
            assert_eq!(req.model, "gemini-1.5-flash");
            assert_eq!(req.messages.len(), 2);
            assert_eq!(req.messages[0], ChatMessage::system(prompt));
            assert_eq!(req.messages[1], ChatMessage::user(art.markdown.as_str()));
            assert_eq!(req.temperature, SUMMARY_TEMPERATURE);
            assert_eq!(req.max_tokens, budget);
        }
    }

    #[test]
    fn test_summarize_success() {
        let mut art = article();
        art.detected_language = Some("en".to_string());
        let summarizer = Summarizer::new(RecordingProvider::new(Ok(ok_completion())));

        let summary = run(summarizer.summarize(&art, &gemini(), LengthMode::Brief)).unwrap();

        assert_eq!(summary.summary_text, "A short summary.");
        assert_eq!(summary.model_used, "gemini/gemini-1.5-flash");
        assert_eq!(summary.length_mode, LengthMode::Brief);
        assert_eq!(summary.output_language.as_deref(), Some("en"));
        assert_eq!(summary.source_url, "https://example.com/article");
        assert_eq!(summary.source_title, "Example");
        assert_eq!(summary.token_usage.unwrap().total_tokens, 140);

        let seen = summarizer.provider.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.max_tokens, 100);
    }

    #[test]
    fn test_summarize_without_usage() {
        let completion = Completion { text: "Summary".into(), usage: None };
        let summarizer = Summarizer::new(RecordingProvider::new(Ok(completion)));
        let summary = run(summarizer.summarize(&article(), &gemini(), LengthMode::Standard)).unwrap();
        assert!(summary.token_usage.is_none());
        assert!(summary.output_language.is_none());
    }

    #[test]
    fn test_authentication_failure() {
        let err = classify_failure(&CompletionFailure::Authentication("bad key".into()), &gemini(), &article());
        assert_eq!(err.kind(), ErrorKind::AiService);
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("GOOGLE_API_KEY"));
        assert!(err.message().contains("gemini"));
    }

    #[test]
    fn test_rate_limit_failure() {
        let summarizer = Summarizer::new(RecordingProvider::new(Err(CompletionFailure::RateLimit("slow down".into()))));
        let err = run(summarizer.summarize(&article(), &gemini(), LengthMode::Standard)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("gemini"));
    }

    #[test]
    fn test_context_window_failure() {
        let err = classify_failure(&CompletionFailure::ContextWindowExceeded("too big".into()), &gemini(), &article());
        assert_eq!(err.kind(), ErrorKind::TokenLimitExceeded);
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("brief"));
        assert_eq!(err.details().get("article_word_count").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_bad_request_model_not_found() {
        for msg in ["models/gemini-9 is not found for API version v1beta", "Unknown model", "Not Found"] {
            let err = classify_failure(&CompletionFailure::BadRequest(msg.into()), &gemini(), &article());
            assert_eq!(err.kind(), ErrorKind::ModelNotFound, "{}", msg);
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn test_bad_request_generic() {
        let err =
            classify_failure(&CompletionFailure::BadRequest("temperature out of range".into()), &gemini(), &article());
        assert_eq!(err.kind(), ErrorKind::AiService);
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("temperature out of range"));
    }

    #[test]
    fn test_network_failures() {
        for failure in [CompletionFailure::Timeout("t".into()), CompletionFailure::Connection("c".into())] {
            let err = classify_failure(&failure, &gemini(), &article());
            assert_eq!(err.kind(), ErrorKind::AiService);
            assert_eq!(err.exit_code(), 3);
            assert!(err.message().contains("Network error connecting to gemini"));
        }
    }

    #[test]
    fn test_other_failure_keeps_type() {
        let failure = CompletionFailure::Other { kind: "HTTP 500".into(), message: "internal".into() };
        let err = classify_failure(&failure, &gemini(), &article());
        assert_eq!(err.kind(), ErrorKind::AiService);
        assert!(err.message().contains("internal"));
        assert_eq!(err.details().get("error_type").map(String::as_str), Some("HTTP 500"));
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(CompletionFailure::from_status(401, "x".into()), CompletionFailure::Authentication(_)));
        assert!(matches!(CompletionFailure::from_status(403, "x".into()), CompletionFailure::Authentication(_)));
        assert!(matches!(CompletionFailure::from_status(429, "x".into()), CompletionFailure::RateLimit(_)));
        assert!(matches!(CompletionFailure::from_status(504, "x".into()), CompletionFailure::Timeout(_)));
        assert!(matches!(
            CompletionFailure::from_status(400, "The input token count (2000000) exceeds the maximum".into()),
            CompletionFailure::ContextWindowExceeded(_)
        ));
        assert!(matches!(
            CompletionFailure::from_status(400, "This model's maximum context length is 8192 tokens".into()),
            CompletionFailure::ContextWindowExceeded(_)
        ));
        assert!(matches!(CompletionFailure::from_status(404, "model not found".into()), CompletionFailure::BadRequest(_)));
        assert!(matches!(CompletionFailure::from_status(503, "x".into()), CompletionFailure::Other { .. }));
    }

    #[test]
    fn test_from_status_invalid_key_on_bad_request() {
        for msg in [
            "API key not valid. Please pass a valid API key.",
            "Request failed: API_KEY_INVALID",
            "Invalid API key provided",
            "Request had invalid authentication credentials: UNAUTHENTICATED",
        ] {
            assert!(
                matches!(CompletionFailure::from_status(400, msg.into()), CompletionFailure::Authentication(_)),
                "{}",
                msg
            );
        }
    }

    #[test]
    fn test_default_api_base() {
        assert!(default_api_base("gemini").unwrap().contains("generativelanguage.googleapis.com"));
        assert_eq!(default_api_base("ollama"), Some("http://localhost:11434/v1"));
        assert!(default_api_base("mistral").is_none());
    }

    #[test]
    fn test_for_model_requires_endpoint_for_unknown_provider() {
        let settings = Settings::from_lookup(|k| (k == "FIRECRAWL_API_URL").then(|| "http://fc".to_string())).unwrap();
        let model = AiModelConfiguration::parse("mistral/mistral-large").unwrap();
        let err = ChatCompletionsClient::for_model(&settings, &model).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().contains(AI_API_BASE_URL));

        let client = ChatCompletionsClient::for_model(&settings, &gemini()).unwrap();
        assert!(client.endpoint().ends_with("/v1beta/openai/chat/completions"));
    }
}
