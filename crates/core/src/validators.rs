//! Input validation and filename derivation.
//!
//! Pure helpers used by the command handlers before any network call:
//! URL checks, output path classification, and deriving a file name for a
//! scraped page when the user points `--output` at a directory.

use regex::Regex;
use url::Url;

use crate::scrape::OutputFormat;
use crate::{CrawlerError, Result};

/// Maximum length of a derived file name, excluding the extension.
pub const MAX_FILENAME_LEN: usize = 200;

/// Validates that `url` is an absolute http(s) URL with a host.
///
/// Returns the parsed URL on success.
///
/// # Example
///
/// ```rust
/// use crawler_core::validate_url;
///
/// assert!(validate_url("https://example.com/article").is_ok());
/// assert!(validate_url("ftp://example.com").is_err());
/// ```
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|_| CrawlerError::validation(format!("Invalid URL: {}", url)).with_detail("url", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CrawlerError::validation(format!("URL must use http:// or https:// protocol: {}", url))
            .with_detail("url", url));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(CrawlerError::validation(format!("Invalid URL format: {}", url)).with_detail("url", url)),
    }
}

/// Returns `true` when `path` names a directory, i.e. ends with `/` or `\`.
///
/// Never fails; the empty string is a file path.
pub fn classify_output_path(path: &str) -> bool {
    path.ends_with('/') || path.ends_with('\\')
}

/// Derives a file name for a scraped page from its URL.
///
/// Uses the last non-empty path segment, or the host with dots replaced by
/// hyphens when the path is empty. Characters that are unsafe in file names
/// become `-`, runs of `-` collapse, and the name is capped at
/// [`MAX_FILENAME_LEN`] characters before the extension is appended.
///
/// # Example
///
/// ```rust
/// use crawler_core::{OutputFormat, derive_filename_from_url};
///
/// assert_eq!(derive_filename_from_url("https://docs.example.com/a/b-name", OutputFormat::Markdown), "b-name.md");
/// assert_eq!(derive_filename_from_url("https://example.com/", OutputFormat::Html), "example-com.html");
/// ```
pub fn derive_filename_from_url(url: &str, format: OutputFormat) -> String {
    let base = match Url::parse(url) {
        Ok(parsed) => last_path_segment(&parsed).unwrap_or_else(|| netloc(&parsed).replace('.', "-")),
        Err(_) => url.split('/').filter(|s| !s.is_empty()).next_back().unwrap_or_default().to_string(),
    };

    let unsafe_chars = Regex::new(r#"[/\\?#:*"<>|]"#).unwrap();
    let hyphen_runs = Regex::new(r"-+").unwrap();

    let sanitized = unsafe_chars.replace_all(&base, "-");
    let collapsed = hyphen_runs.replace_all(&sanitized, "-");
    let trimmed: String = collapsed.trim_matches('-').chars().take(MAX_FILENAME_LEN).collect();

    format!("{}.{}", trimmed, format.extension())
}

fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?.filter(|s| !s.is_empty()).next_back().map(str::to_string)
}

/// Host plus explicit port, mirroring the authority part of the URL.
fn netloc(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
