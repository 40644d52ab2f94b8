use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let output_arg = || clap::arg!(-o --output <PATH> "Output file or directory (default: stdout)").value_name("PATH");

    let mut cmd = clap::Command::new("crawler")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Crawler Contributors")
        .about("Scrape web pages and summarize articles with AI")
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(
            clap::Command::new("scrape")
                .about("Scrape a single web page to markdown or HTML")
                .arg(clap::arg!(--url <URL> "URL to scrape").required(true))
                .arg(clap::arg!(--markdown "Output as markdown (default)").conflicts_with("html"))
                .arg(clap::arg!(--html "Output as HTML"))
                .arg(output_arg()),
        )
        .subcommand(
            clap::Command::new("summarize")
                .about("Scrape an article and summarize it with an AI model")
                .arg(clap::arg!(--url <URL> "Article URL to summarize").required(true))
                .arg(clap::arg!(--model <MODEL> "AI model as provider/model-name (default: DEFAULT_AI_MODEL)"))
                .arg(clap::arg!(--summary <LENGTH> "Summary length: brief, standard, detailed").default_value("standard"))
                .arg(output_arg())
                .arg(
                    clap::Arg::new("save_original")
                        .long("save-original")
                        .help("Save the original markdown alongside the summary")
                        .action(clap::ArgAction::SetTrue),
                ),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "crawler", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "crawler", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "crawler", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "crawler", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
