//! Data models shared across the pipeline.
//!
//! - [`Article`]: a normalized feed entry, read-only once collected
//! - [`PostReceipt`]: what the posting backend hands back on success
//! - [`RunSummary`]: per-run counters logged at the end

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article as produced by the feed collector.
///
/// Identity is the `link`: the ledger stores links, and two articles with the
/// same link are the same story.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Headline, trimmed.
    pub title: String,
    /// Absolute URL of the article (Google News redirects already unwrapped).
    pub link: String,
    /// Summary with HTML stripped, at most 300 characters.
    pub summary: String,
    /// Display name of the feed this came from.
    pub source: String,
    /// Publication time in UTC, when the feed provided one.
    pub published: Option<DateTime<Utc>>,
}

/// Successful publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostReceipt {
    /// Platform id of the new post, when the API returned one.
    pub id: Option<String>,
}

/// Outcome counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Articles that reached the generation step.
    pub attempted: usize,
    /// Articles published (or previewed, in dry-run mode).
    pub posted: usize,
    /// Articles given up on: generation, validation or posting failed.
    pub skipped: usize,
    /// The posting backend answered 429 and the run stopped early.
    pub rate_limited: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_article_serialization() {
        let article = Article {
            title: "Pixel 11 leaks".to_string(),
            link: "https://www.androidpolice.com/pixel-11-leaks/".to_string(),
            summary: "Everything we know".to_string(),
            source: "Android Police".to_string(),
            published: Some(Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap()),
        };

        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("2026-10-16T08:00:00Z"));
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn test_run_summary_default() {
        let summary = RunSummary::default();
        assert_eq!(summary.posted, 0);
        assert!(!summary.rate_limited);
    }
}
