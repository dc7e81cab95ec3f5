//! One bot run: from candidate articles to published posts.
//!
//! # Steps
//!
//! 1. Trim the ledger to its capacity
//! 2. Load posted links and drop articles already posted
//! 3. Take the first `posts_per_run` candidates
//! 4. For each: prompt, generate, compose, publish, record the link
//!
//! Every step of an article is awaited before the next article starts. A
//! failure skips that article; a rate limit ends the run.

use crate::config::PipelineConfig;
use crate::generator::Generator;
use crate::ledger::{Ledger, filter_unseen};
use crate::models::{Article, RunSummary};
use crate::prompts::build_prompt;
use crate::publisher::{PublishError, Publisher};
use crate::tweet::compose;
use crate::utils::{take_chars, truncate_for_log};
use std::collections::HashSet;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Posted,
    Skipped,
    RateLimited,
}

/// The posting pipeline, generic over its two external capabilities.
#[derive(Debug)]
pub struct Pipeline<G, P> {
    generator: G,
    publisher: P,
    ledger: Ledger,
    config: PipelineConfig,
}

impl<G, P> Pipeline<G, P>
where
    G: Generator,
    P: Publisher,
{
    pub fn new(generator: G, publisher: P, ledger: Ledger, config: PipelineConfig) -> Self {
        Self {
            generator,
            publisher,
            ledger,
            config,
        }
    }

    async fn seen_links(&self) -> HashSet<String> {
        if !self.config.dry_run {
            if let Err(e) = self.ledger.cleanup(self.config.ledger_capacity).await {
                error!(error = %e, path = %self.ledger.path().display(), "Ledger cleanup failed; continuing");
            }
        }
        match self.ledger.load().await {
            Ok(seen) => seen,
            Err(e) => {
                error!(error = %e, path = %self.ledger.path().display(), "Could not read ledger; treating as empty");
                HashSet::new()
            }
        }
    }

    /// Post up to `posts_per_run` of `articles`.
    ///
    /// # Arguments
    ///
    /// * `articles` - Candidates in preference order
    ///
    /// # Returns
    ///
    /// Counters for the run. Individual failures are logged, never returned.
    #[instrument(level = "info", skip_all, fields(candidates = articles.len()))]
    pub async fn run(&self, articles: Vec<Article>) -> RunSummary {
        let mut summary = RunSummary::default();

        let seen = self.seen_links().await;
        let queue: Vec<Article> = filter_unseen(articles, &seen)
            .into_iter()
            .take(self.config.posts_per_run)
            .collect();
        info!(queued = queue.len(), already_posted = seen.len(), "Articles queued");

        for (i, article) in queue.iter().enumerate() {
            if i > 0 && !self.config.inter_post_delay.is_zero() {
                debug!(delay = ?self.config.inter_post_delay, "Waiting before next post");
                sleep(self.config.inter_post_delay).await;
            }

            summary.attempted += 1;
            info!(
                n = i + 1,
                of = queue.len(),
                source = %article.source,
                title = %take_chars(&article.title, 60),
                "Processing article"
            );

            match self.process(article).await {
                Outcome::Posted => summary.posted += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::RateLimited => {
                    summary.rate_limited = true;
                    warn!(remaining = queue.len() - i - 1, "Stopping run after rate limit");
                    break;
                }
            }
        }

        info!(
            posted = summary.posted,
            attempted = summary.attempted,
            skipped = summary.skipped,
            rate_limited = summary.rate_limited,
            "Posted {}/{}",
            summary.posted,
            summary.attempted
        );
        summary
    }

    async fn process(&self, article: &Article) -> Outcome {
        let prompt = build_prompt(article);
        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, link = %article.link, "Generation failed; skipping article");
                return Outcome::Skipped;
            }
        };

        let post = match compose(&raw, Some(&article.link), self.config.max_post_length) {
            Ok(post) => post,
            Err(e) => {
                warn!(error = %e, link = %article.link, "Generated text unusable; skipping article");
                return Outcome::Skipped;
            }
        };
        debug!(chars = post.chars().count(), post = %truncate_for_log(&post, 120), "Composed post");

        match self.publisher.post(&post).await {
            Ok(receipt) => {
                if !self.config.dry_run {
                    if let Err(e) = self.ledger.append(&article.link).await {
                        error!(error = %e, link = %article.link, "Posted but could not record link");
                    }
                }
                info!(id = ?receipt.id, link = %article.link, "Article posted");
                Outcome::Posted
            }
            Err(e @ PublishError::RateLimited { .. }) => {
                error!(error = %e, "Posting rate limited");
                Outcome::RateLimited
            }
            Err(e) => {
                warn!(error = %e, link = %article.link, "Posting failed; skipping article");
                Outcome::Skipped
            }
        }
    }
}
