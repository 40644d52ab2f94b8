use clap::Args;
use crawler_core::output::write_to_file;
use crawler_core::{Extractor, OutputFormat, ScrapeRequest, Settings, print_to_console, resolve_scrape_target};
use owo_colors::OwoColorize;

use crate::echo;

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// URL to scrape
    #[arg(long, value_name = "URL")]
    pub url: String,

    /// Output as markdown (default)
    #[arg(long, conflicts_with = "html")]
    pub markdown: bool,

    /// Output as HTML
    #[arg(long)]
    pub html: bool,

    /// Output file, or a directory ending in '/' (default: stdout)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,
}

impl ScrapeArgs {
    fn format(&self) -> OutputFormat {
        match (self.markdown, self.html) {
            (false, true) => OutputFormat::Html,
            _ => OutputFormat::Markdown,
        }
    }
}

pub async fn run(args: ScrapeArgs, verbose: bool) -> anyhow::Result<()> {
    let request = ScrapeRequest::new(&args.url, args.format(), args.output.clone())?;
    let settings = Settings::from_env()?;

    if verbose {
        echo::print_step(1, 2, &format!("Scraping {}", request.url.as_str().bright_white().underline()));
    }

    let extractor = Extractor::from_settings(&settings)?;
    let response = extractor.scrape(&request).await?;

    if verbose {
        let title = response.metadata().title.as_deref().unwrap_or("(untitled)");
        eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(response.content().len() as u64).bright_white());
        eprintln!();
        echo::print_step(2, 2, &format!("Writing {} output", request.format));
    }

    match &request.output_path {
        Some(output) => {
            let path = resolve_scrape_target(output, &args.url, request.format);
            write_to_file(response.content(), &path)?;
            echo::print_success(&format!("Content saved to: {}", path.display()));
        }
        None => print_to_console(response.content())?,
    }

    echo::print_success(&format!("Scraped: {}", args.url));
    Ok(())
}
