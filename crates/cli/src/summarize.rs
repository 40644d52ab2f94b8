use clap::Args;
use crawler_core::settings::DEFAULT_AI_MODEL;
use crawler_core::{
    AiModelConfiguration, CrawlerError, Extractor, LengthMode, Settings, SummarizeRequest, Summarizer,
    resolve_summary_targets, save,
};
use owo_colors::OwoColorize;

use crate::echo;

/// The only provider the summarize command accepts for now.
const SUPPORTED_PROVIDER: &str = "gemini";

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Article URL to summarize
    #[arg(long, value_name = "URL")]
    pub url: String,

    /// AI model as provider/model-name (default: DEFAULT_AI_MODEL)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Summary length: brief, standard, detailed
    #[arg(long, default_value = "standard", value_name = "LENGTH")]
    pub summary: String,

    /// Output file or directory (default: stdout)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Save the original markdown alongside the summary
    #[arg(long)]
    pub save_original: bool,
}

pub async fn run(args: SummarizeArgs, verbose: bool) -> anyhow::Result<()> {
    let length_mode: LengthMode = args.summary.parse()?;
    let request =
        SummarizeRequest::new(&args.url, args.model, length_mode)?.with_output(args.output, args.save_original);

    let settings = Settings::from_env()?;
    let model = select_model(&request, &settings)?;

    echo::print_info(&format!("Summarizing: {}", request.url));
    echo::print_info(&format!("Using model: {}", model));

    if verbose {
        echo::print_step(1, 3, "Scraping article");
    }
    let extractor = Extractor::from_settings(&settings)?;
    let article = extractor.scrape_to_article_content(request.url.as_str()).await?;

    echo::print_info(&format!("Crawled article: {} ({} words)", article.title, article.word_count));
    if article.is_minimal() {
        echo::print_warning(&format!(
            "Warning: Article is very short ({} words). Summary may not be meaningful.",
            article.word_count
        ));
    }

    if verbose {
        echo::print_step(2, 3, &format!("Generating {} summary", request.length_mode));
    }
    let summarizer = Summarizer::for_model(&settings, &model)?;
    let summary = summarizer.summarize(&article, &model, request.length_mode).await?;

    if verbose {
        echo::print_step(3, 3, "Writing output");
    }
    match &request.output_path {
        Some(output) => {
            let targets = resolve_summary_targets(output, &article.title, request.save_original);
            if let Some(original) = &targets.original {
                let file = save(&article.markdown, original)?;
                echo::print_success(&format!(
                    "Original saved to: {} ({})",
                    file.file_path.display(),
                    echo::format_size(file.file_size).dimmed()
                ));
            }
            let file = save(&summary.summary_text, &targets.summary)?;
            echo::print_success(&format!(
                "Summary saved to: {} ({})",
                file.file_path.display(),
                echo::format_size(file.file_size).dimmed()
            ));
        }
        None => echo::print_summary(&summary.summary_text),
    }

    if let Some(usage) = &summary.token_usage {
        echo::print_info(&format!(
            "Tokens used: {} (prompt: {}, completion: {})",
            usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
        ));
    }

    Ok(())
}

/// Picks the model for a run and checks it against what this command allows.
fn select_model(request: &SummarizeRequest, settings: &Settings) -> crawler_core::Result<AiModelConfiguration> {
    let selected = request.model.as_deref().or(settings.default_ai_model.as_deref()).ok_or_else(|| {
        CrawlerError::configuration(format!(
            "No AI model specified. Either provide --model or set {} in your .env file.",
            DEFAULT_AI_MODEL
        ))
        .with_detail("missing_env", DEFAULT_AI_MODEL)
    })?;

    let model = AiModelConfiguration::parse(selected)?;

    if model.provider != SUPPORTED_PROVIDER {
        return Err(CrawlerError::configuration(format!(
            "Only Gemini models are supported in this version. Support for {} is not available yet.",
            model.provider
        ))
        .with_detail("provider", model.provider.as_str()));
    }

    let missing_key = !model.is_local && settings.api_key_for(&model).is_none();
    if let Some(env_var) = model.api_key_env_var.filter(|_| missing_key) {
        return Err(CrawlerError::configuration(format!("Missing API key: {} not set in .env file.", env_var))
            .with_detail("missing_env", env_var));
    }

    Ok(model)
}
