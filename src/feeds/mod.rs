//! Feed collection: fetch every source, normalize, and keep what is fresh.
//!
//! # Flow
//!
//! 1. **Fetch**: each [`FeedSource`] is downloaded in turn (20s timeout)
//! 2. **Parse**: RSS 2.0 or Atom via [`parser::parse_feed`]
//! 3. **Normalize**: [`normalize::normalize_entry`] cleans and validates each entry
//! 4. **Filter**: drop anything outside the recency window
//! 5. **Dedupe and shuffle**: one article per link, in random order
//!
//! A feed that fails to download or parse is logged and contributes nothing;
//! it never fails the collection.

pub mod normalize;
pub mod parser;
pub mod sources;

use crate::models::Article;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use rand::rng;
use rand::seq::SliceRandom;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub use sources::{FeedSource, default_sources};

/// Per-feed download timeout.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP client used for feed downloads.
pub fn feed_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(FEED_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Download and normalize one feed.
///
/// # Arguments
///
/// * `client` - HTTP client to use
/// * `source` - The feed to read
///
/// # Returns
///
/// Normalized articles, or an error if the download or parse failed.
#[instrument(level = "info", skip(client), fields(source = %source.name))]
pub async fn fetch_feed(client: &Client, source: &FeedSource) -> Result<Vec<Article>, Box<dyn Error>> {
    let body = client
        .get(&source.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let entries = parser::parse_feed(&body)?;
    let total = entries.len();
    let articles: Vec<Article> = entries
        .iter()
        .filter_map(|e| normalize::normalize_entry(e, &source.name))
        .collect();

    debug!(entries = total, kept = articles.len(), "Normalized feed entries");
    Ok(articles)
}

/// Collapse repeated links (first occurrence wins) and shuffle.
pub fn dedupe_and_shuffle(articles: Vec<Article>) -> Vec<Article> {
    let mut unique: Vec<Article> = articles
        .into_iter()
        .unique_by(|a| a.link.clone())
        .collect();
    unique.shuffle(&mut rng());
    unique
}

/// Fetch all `sources` sequentially and return fresh, unique, shuffled articles.
///
/// # Arguments
///
/// * `client` - HTTP client to use
/// * `sources` - Feeds to read, in order
/// * `hours` - Recency window
/// * `now` - Reference time for the recency window
#[instrument(level = "info", skip_all, fields(feeds = sources.len(), hours = hours))]
pub async fn collect(
    client: &Client,
    sources: &[FeedSource],
    hours: u32,
    now: DateTime<Utc>,
) -> Vec<Article> {
    let per_feed: Vec<Vec<Article>> = stream::iter(sources)
        .then(|source| async move {
            info!(source = %source.name, "Fetching feed");
            match fetch_feed(client, source).await {
                Ok(articles) => {
                    info!(source = %source.name, count = articles.len(), "Found articles");
                    articles
                }
                Err(e) => {
                    error!(source = %source.name, error = %e, "Feed fetch failed; skipping");
                    Vec::new()
                }
            }
        })
        .collect()
        .await;

    let all: Vec<Article> = per_feed.into_iter().flatten().collect();
    let fetched = all.len();
    info!(count = fetched, "Total articles fetched");

    let recent = normalize::filter_recent(all, hours, now);
    info!(count = recent.len(), hours, "Recent articles");
    if recent.is_empty() && fetched > 0 {
        warn!(hours, "No articles inside the recency window; consider raising RSS_HOURS");
    }

    dedupe_and_shuffle(recent)
}
