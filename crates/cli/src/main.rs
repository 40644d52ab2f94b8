use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crawler_core::{CrawlerError, ErrorKind};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::Subscriber;

mod echo;
mod scrape;
mod summarize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scrape web pages through Firecrawl and summarize articles with AI
#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(author = "Crawler Contributors")]
#[command(version)]
#[command(about = "Scrape web pages and summarize articles with AI", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a single web page to markdown or HTML
    Scrape(scrape::ScrapeArgs),
    /// Scrape an article and summarize it with an AI model
    Summarize(summarize::SummarizeArgs),
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "warn,crawler=debug,crawler_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {}", e);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    match cli.command {
        Command::Scrape(args) => scrape::run(args, cli.verbose).await,
        Command::Summarize(args) => summarize::run(args, cli.verbose).await,
    }
}

/// Prints a failure and picks the exit code; errors outside the taxonomy exit 1.
fn report(err: &anyhow::Error) -> ExitCode {
    let Some(crawler_err) = err.downcast_ref::<CrawlerError>() else {
        echo::print_error(&format!("Error: {:#}", err));
        return ExitCode::FAILURE;
    };

    let label = match crawler_err.kind() {
        ErrorKind::Configuration => "Configuration Error",
        ErrorKind::AiService | ErrorKind::TokenLimitExceeded | ErrorKind::ModelNotFound => "AI Service Error",
        _ => "Error",
    };
    echo::print_error(&format!("{}: {}", label, crawler_err.message()));
    if let Some(details) = crawler_err.details_line() {
        eprintln!("Details: {}", details);
    }

    ExitCode::from(crawler_err.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}
