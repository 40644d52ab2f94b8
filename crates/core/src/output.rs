//! Output resolution and writing.
//!
//! Decides where scraped or summarized content goes (console, a given file,
//! or a name derived inside a directory) and performs the write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::scrape::OutputFormat;
use crate::validators::{classify_output_path, derive_filename_from_url};
use crate::{CrawlerError, Result};

/// Longest base name derived from an article title.
pub const TITLE_BASE_LEN: usize = 50;

/// A file written by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub file_path: PathBuf,
    /// Bytes on disk after the write.
    pub file_size: u64,
    pub format: String,
}

impl OutputFile {
    /// Extension without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        self.file_path.extension().and_then(|e| e.to_str())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_path.file_name().and_then(|n| n.to_str())
    }
}

/// Writes `content` to `path` as UTF-8, creating parent directories and
/// overwriting any existing file.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }
    fs::write(path, content).map_err(|e| write_error(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote output file");
    Ok(())
}

/// Writes `content` and a trailing newline to stdout.
pub fn print_to_console(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", content)
        .and_then(|_| stdout.flush())
        .map_err(|e| CrawlerError::output(format!("Failed to write to stdout: {}", e), e))
}

/// Writes `content` to `path` and describes the result.
pub fn save(content: &str, path: &Path) -> Result<OutputFile> {
    write_to_file(content, path)?;
    let file_size = fs::metadata(path).map_err(|e| write_error(path, e))?.len();

    Ok(OutputFile { file_path: path.to_path_buf(), file_size, format: "markdown".to_string() })
}

fn write_error(path: &Path, err: io::Error) -> CrawlerError {
    CrawlerError::output(format!("Failed to write output file: {}", err), err)
        .with_detail("path", path.display().to_string())
}

/// Target file for a scrape written to `output`.
///
/// A directory target (trailing separator) gets a file name derived from
/// the source URL; anything else is used as-is.
pub fn resolve_scrape_target(output: &str, url: &str, format: OutputFormat) -> PathBuf {
    if classify_output_path(output) {
        Path::new(output).join(derive_filename_from_url(url, format))
    } else {
        PathBuf::from(output)
    }
}

/// Whether a summarize target names a directory: a trailing separator or an
/// existing directory on disk.
pub fn is_directory_target(output: &str) -> bool {
    classify_output_path(output) || Path::new(output).is_dir()
}

/// File base name for an article title: lowercased, spaces and path-reserved
/// characters to `-`, at most [`TITLE_BASE_LEN`] characters.
pub fn title_base_name(title: &str) -> String {
    let base: String = title
        .to_lowercase()
        .chars()
        .map(|c| if is_reserved_in_name(c) { '-' } else { c })
        .take(TITLE_BASE_LEN)
        .collect();

    if base.is_empty() { "article".to_string() } else { base }
}

fn is_reserved_in_name(c: char) -> bool {
    matches!(c, ' ' | '/' | '\\' | '?' | '#' | ':' | '*' | '"' | '<' | '>' | '|')
}

/// Where a summarize run writes its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTargets {
    pub summary: PathBuf,
    /// Present only when the original markdown is saved as well.
    pub original: Option<PathBuf>,
}

/// Resolves summary (and optionally original) paths for `output`.
///
/// Directory targets derive both names from the article title: `{base}.md`
/// for the original and `{base}-summary.md` for the summary. A file target
/// receives the summary itself, and the original goes to the same path with
/// `-summary` inserted before the extension.
pub fn resolve_summary_targets(output: &str, title: &str, save_original: bool) -> SummaryTargets {
    if is_directory_target(output) {
        let dir = Path::new(output);
        let base = title_base_name(title);
        SummaryTargets {
            summary: dir.join(format!("{}-summary.md", base)),
            original: save_original.then(|| dir.join(format!("{}.md", base))),
        }
    } else {
        let path = PathBuf::from(output);
        let original = save_original.then(|| with_summary_suffix(&path));
        SummaryTargets { summary: path, original }
    }
}

fn with_summary_suffix(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-summary.{}", stem, ext.to_string_lossy()),
        None => format!("{}-summary", stem),
    };
    path.with_file_name(name)
}
