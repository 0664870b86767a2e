//! URL parsing and validation utilities
//!
//! Extracts archive file names from URLs and validates URL schemes.

use std::path::PathBuf;

/// Allowed URL schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlScheme {
    Http,
    Https,
    File,
}

impl UrlScheme {
    /// Get the scheme prefix string
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Http => "http://",
            Self::Https => "https://",
            Self::File => "file://",
        }
    }
}

/// Schemes a formula may fetch from
pub const FETCH_SCHEMES: &[UrlScheme] = &[UrlScheme::Https, UrlScheme::Http, UrlScheme::File];

/// Archive extensions recognised when stripping file names, longest first
const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".tar.gz", ".tar.xz", ".tar.bz2", ".tar.zst", ".tgz", ".txz", ".tbz2", ".zip", ".whl",
    ".tar",
];

/// Validate that a URL uses one of the allowed schemes.
pub fn validate_url_scheme(url: &str, allowed: &[UrlScheme]) -> Result<(), String> {
    let url_lower = url.to_lowercase();

    if allowed.iter().any(|scheme| url_lower.starts_with(scheme.prefix())) {
        return Ok(());
    }

    let allowed_str: Vec<_> = allowed.iter().map(|s| s.prefix()).collect();
    Err(format!("URL must use one of: {:?}\n  got: {}", allowed_str, url))
}

/// Local path for a `file://` URL, `None` for anything else.
pub fn file_url_path(url: &str) -> Option<PathBuf> {
    url.strip_prefix("file://").map(PathBuf::from)
}

/// Extract filename from a URL.
///
/// Handles query strings and fragments, returns "download" as fallback.
///
/// # Example
/// ```ignore
/// assert_eq!(extract_filename("https://example.com/foo-1.0.tar.gz"), "foo-1.0.tar.gz");
/// assert_eq!(extract_filename("https://example.com/file?v=1"), "file");
/// ```
pub fn extract_filename(url: &str) -> String {
    // Strip query string and fragment
    let clean_url = url.split('?').next().unwrap_or(url);
    let clean_url = clean_url.split('#').next().unwrap_or(clean_url);

    let path_part = clean_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(clean_url);

    // A bare host has no file name
    if !path_part.contains('/') {
        return "download".to_string();
    }

    path_part
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(sanitize_filename)
        .unwrap_or_else(|| "download".to_string())
}

/// Strip a known archive extension from a file name.
pub fn strip_archive_extension(filename: &str) -> &str {
    let lower = filename.to_ascii_lowercase();
    ARCHIVE_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| &filename[..filename.len() - ext.len()])
        .unwrap_or(filename)
}

/// Sanitize a filename for safe filesystem use.
///
/// Replaces problematic characters and handles special names.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() || name == "." || name == ".." {
        return "download".to_string();
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Trim leading/trailing whitespace and dots
    let trimmed = sanitized.trim().trim_matches('.');

    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_filename_simple() {
        assert_eq!(
            extract_filename("https://example.com/foo-1.0.tar.gz"),
            "foo-1.0.tar.gz"
        );
    }

    #[test]
    fn test_extract_filename_with_query_and_fragment() {
        assert_eq!(
            extract_filename("https://example.com/file.tar.gz?token=abc"),
            "file.tar.gz"
        );
        assert_eq!(
            extract_filename("https://example.com/file.tar.gz#section"),
            "file.tar.gz"
        );
    }

    #[test]
    fn test_extract_filename_fallback() {
        assert_eq!(extract_filename("https://example.com/"), "download");
        assert_eq!(extract_filename("https://example.com"), "download");
    }

    #[test]
    fn test_extract_filename_file_url() {
        assert_eq!(extract_filename("file:///tmp/src/demo-1.0.tar.gz"), "demo-1.0.tar.gz");
    }

    #[test]
    fn test_strip_archive_extension() {
        assert_eq!(strip_archive_extension("posting-1.11.0.tar.gz"), "posting-1.11.0");
        assert_eq!(strip_archive_extension("demo.ZIP"), "demo");
        assert_eq!(strip_archive_extension("README"), "README");
    }

    #[test]
    fn test_file_url_path() {
        assert_eq!(file_url_path("file:///tmp/a.tar.gz"), Some(PathBuf::from("/tmp/a.tar.gz")));
        assert_eq!(file_url_path("https://example.com/a.tar.gz"), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("foo\\bar"), "foo_bar");
        assert_eq!(sanitize_filename("file:name"), "file_name");
        assert_eq!(sanitize_filename(".."), "download");
        assert_eq!(sanitize_filename(""), "download");
        assert_eq!(sanitize_filename("  test  "), "test");
    }

    #[test]
    fn test_validate_url_scheme() {
        assert!(validate_url_scheme("https://example.com", FETCH_SCHEMES).is_ok());
        assert!(validate_url_scheme("HTTP://example.com", FETCH_SCHEMES).is_ok());
        assert!(validate_url_scheme("file:///tmp/x", FETCH_SCHEMES).is_ok());
        assert!(validate_url_scheme("ftp://example.com", FETCH_SCHEMES).is_err());
        assert!(validate_url_scheme("https://example.com", &[UrlScheme::File]).is_err());
    }
}
