//! Turning raw feed entries into [`Article`]s.
//!
//! Handles summary cleanup, Google News redirect unwrapping, rejection of
//! links without a path, date parsing and the recency window.

use super::parser::FeedEntry;
use crate::models::Article;
use crate::utils::{strip_html, take_chars};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Summaries are cut to this many chars after HTML stripping.
pub const SUMMARY_MAX_CHARS: usize = 300;

const GOOGLE_NEWS_HOST: &str = "news.google.com";

static EMBEDDED_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap());

/// Normalize one entry. `None` means the entry is unusable and is dropped.
pub fn normalize_entry(entry: &FeedEntry, source_name: &str) -> Option<Article> {
    let title = entry.title.trim();
    let mut link = entry.link.trim().to_string();
    let summary = take_chars(&strip_html(&entry.summary), SUMMARY_MAX_CHARS);

    if title.is_empty() || link.is_empty() {
        return None;
    }

    if link.contains(GOOGLE_NEWS_HOST) {
        match unwrap_google_news(entry, title, &summary) {
            Some(real) => {
                debug!(from = %link, to = %real, "Unwrapped Google News link");
                link = real;
            }
            None => {
                debug!(title = %take_chars(title, 50), "Skipping Google News entry without a real article URL");
                return None;
            }
        }
    }

    if is_domain_only(&link) {
        debug!(%link, title = %take_chars(title, 50), "Rejecting domain-only URL");
        return None;
    }

    Some(Article {
        title: title.to_string(),
        link,
        summary,
        source: source_name.to_string(),
        published: entry.published.as_deref().and_then(parse_date),
    })
}

/// A usable replacement for a Google News redirect: `http(s)`, not Google
/// News itself, longer than 20 chars, and with a path after the scheme.
fn is_article_candidate(url: &str) -> bool {
    url.starts_with("http")
        && !url.contains(GOOGLE_NEWS_HOST)
        && url.len() > 20
        && url.get(8..).is_some_and(|rest| rest.contains('/'))
}

/// Look for the real article behind a Google News link.
///
/// Tries alternate links, then the `<source url>`, then any URL embedded in
/// the summary or title.
fn unwrap_google_news(entry: &FeedEntry, title: &str, summary: &str) -> Option<String> {
    let from_links = entry
        .alternate_links
        .iter()
        .map(|h| h.trim())
        .find(|h| is_article_candidate(h));
    let from_source = entry
        .source_url
        .as_deref()
        .map(str::trim)
        .filter(|u| is_article_candidate(u));
    let haystack = format!("{summary} {title}");
    let from_text = EMBEDDED_URL
        .find_iter(&haystack)
        .map(|m| m.as_str())
        .find(|u| is_article_candidate(u))
        .map(str::to_string);

    from_links
        .or(from_source)
        .map(str::to_string)
        .or(from_text)
        .filter(|u| u.split('/').count() >= 4)
}

/// `http` links that stop at the host (`https://site.com`, `https://site.com/`).
pub fn is_domain_only(link: &str) -> bool {
    if !link.starts_with("http") {
        return false;
    }
    let parts: Vec<&str> = link.split('/').collect();
    parts.len() <= 3 || (parts.len() == 4 && parts[3].is_empty())
}

/// RFC 2822 (RSS) or RFC 3339 (Atom), converted to UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Keep articles published within `hours` of `now`. Undated articles are kept.
pub fn filter_recent(articles: Vec<Article>, hours: u32, now: DateTime<Utc>) -> Vec<Article> {
    let cutoff = now - Duration::hours(i64::from(hours));
    let mut undated = 0usize;
    let mut too_old = 0usize;

    let kept: Vec<Article> = articles
        .into_iter()
        .filter(|a| match a.published {
            Some(published) if published >= cutoff => true,
            Some(_) => {
                too_old += 1;
                false
            }
            None => {
                undated += 1;
                true
            }
        })
        .collect();

    if undated > 0 {
        debug!(undated, "Including articles without publication dates");
    }
    if too_old > 0 {
        debug!(too_old, hours, "Excluded articles outside the recency window");
    }
    kept
}
