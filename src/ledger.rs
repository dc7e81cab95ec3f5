//! The posted-links ledger.
//!
//! A plain text file with one article link per line, appended after each
//! successful post and consulted before generation so the same story is
//! never posted twice. Cleanup keeps only the most recent lines.
//!
//! The bot assumes a single running instance; concurrent writers are not
//! coordinated.

use crate::models::Article;
use std::collections::HashSet;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

/// Handle to the ledger file.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_lines(&self) -> io::Result<Vec<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Every recorded link. A missing file is an empty ledger.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> io::Result<HashSet<String>> {
        let links: HashSet<String> = self.read_lines().await?.into_iter().collect();
        debug!(count = links.len(), "Loaded posted links");
        Ok(links)
    }

    /// Record `link` as posted.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn append(&self, link: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", link.trim()).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Keep only the last `capacity` links. Returns how many were dropped.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn cleanup(&self, capacity: usize) -> io::Result<usize> {
        let lines = self.read_lines().await?;
        if lines.len() <= capacity {
            return Ok(0);
        }

        let dropped = lines.len() - capacity;
        let mut kept = lines[dropped..].join("\n");
        kept.push('\n');
        fs::write(&self.path, kept).await?;
        info!(dropped, kept = capacity, "Trimmed posted-links ledger");
        Ok(dropped)
    }
}

/// Articles whose link is not in `seen`, order preserved.
pub fn filter_unseen(articles: Vec<Article>, seen: &HashSet<String>) -> Vec<Article> {
    let before = articles.len();
    let fresh: Vec<Article> = articles
        .into_iter()
        .filter(|a| !seen.contains(a.link.trim()))
        .collect();
    if fresh.len() < before {
        debug!(already_posted = before - fresh.len(), "Filtered out posted articles");
    }
    if fresh.is_empty() && before > 0 {
        warn!("Every candidate article has already been posted");
    }
    fresh
}
