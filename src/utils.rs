//! Utility functions for log formatting, HTML cleanup, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - String clipping for log output
//! - HTML tag stripping for feed summaries
//! - File system validation for the posted-links ledger

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped characters appended. Cuts always land on a char boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Remove HTML tags from a feed summary and trim it.
///
/// Entities are already decoded by the XML parser; only markup is removed.
pub fn strip_html(s: &str) -> String {
    HTML_TAG.replace_all(s, "").trim().to_string()
}

/// First `max` characters of `s`.
pub fn take_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Ensure the directory holding `file` exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file
/// next to where the ledger will live.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(file = %file.display()))]
pub async fn ensure_writable_parent(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).await?;
    let probe_path = dir.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!(dir = %dir.display(), "Ledger directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 chars)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_safe() {
        let s = "📱".repeat(10);
        assert_eq!(truncate_for_log(&s, 3), "📱📱📱…(+7 chars)");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Apple <b>raises</b> prices</p> "),
            "Apple raises prices"
        );
        assert_eq!(strip_html("no markup"), "no markup");
    }

    #[test]
    fn test_take_chars() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("hi", 10), "hi");
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = tmp.path().join("state").join("posted_links.txt");
        ensure_writable_parent(&ledger).await.unwrap();
        assert!(tmp.path().join("state").is_dir());
    }
}
