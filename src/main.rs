//! # Tech News Bot
//!
//! Reads fresh headlines from a fixed set of tech feeds, has a local LLM
//! (Ollama) write a short, opinionated post about one of them, cleans and
//! fits that post under the account's length limit, and publishes it to X
//! with the article link attached. Posted links are remembered so no story
//! goes out twice.
//!
//! ## Usage
//!
//! ```sh
//! technews_bot                        # premium tier, one post
//! technews_bot --max-post-length 280  # free tier
//! technews_bot --dry-run -n 3         # preview three posts, publish nothing
//! ```
//!
//! ## Architecture
//!
//! 1. **Pre-flight**: credentials, Ollama reachability and model, ledger directory
//! 2. **Collection**: fetch feeds, normalize, keep recent, dedupe, shuffle
//! 3. **Pipeline**: filter posted links, generate, compose, publish, record
//! 4. **Summary**: "Posted X/Y" and elapsed time

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod feeds;
mod generator;
mod ledger;
mod models;
mod oauth;
mod pipeline;
mod prompts;
mod publisher;
mod tweet;
mod utils;

use cli::Cli;
use config::{PipelineConfig, XCredentials};
use generator::OllamaGenerator;
use ledger::Ledger;
use oauth::OAuthSigner;
use pipeline::Pipeline;
use publisher::{DryRunPublisher, RetryPublisher, XClient};
use utils::ensure_writable_parent;

/// Extra attempts for a transient posting failure.
const POST_MAX_RETRIES: usize = 1;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env first so RUST_LOG and friends can live there
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("technews_bot starting up");
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }

    let args = Cli::parse();
    let config = PipelineConfig::from_cli(&args);
    info!(
        tier = config.tier_label(),
        max_post_length = config.max_post_length,
        posts_per_run = config.posts_per_run,
        recency_hours = config.recency_hours,
        dry_run = config.dry_run,
        "Configuration"
    );
    if config.is_free_tier() {
        info!("Free tier: links count as 23 characters");
    }

    // ---- Pre-flight ----
    let credentials = if config.dry_run {
        info!("Dry run: nothing will be posted and the ledger will not change");
        None
    } else {
        match XCredentials::from_cli(&args) {
            Ok(credentials) => Some(credentials),
            Err(missing) => {
                error!(
                    missing = %missing.join(", "),
                    "X API credentials not set; posting needs OAuth 1.0a user context, a bearer token is not enough"
                );
                return Err(format!("missing X API credentials: {}", missing.join(", ")).into());
            }
        }
    };

    let generator = OllamaGenerator::new(&args.ollama_url, &args.model, config.generation_timeout);
    preflight_ollama(&generator, &args.ollama_url).await?;

    let ledger = Ledger::new(config::ledger_path(&args));
    if !config.dry_run {
        if let Err(e) = ensure_writable_parent(ledger.path()).await {
            error!(
                path = %ledger.path().display(),
                error = %e,
                "Ledger directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Collect ----
    let client = feeds::feed_client()?;
    let sources = feeds::default_sources();
    let articles = feeds::collect(&client, &sources, config.recency_hours, Utc::now()).await;
    if articles.is_empty() {
        warn!(hours = config.recency_hours, "No recent articles found; nothing to post");
        return Ok(());
    }

    // ---- Generate and publish ----
    let summary = match credentials {
        Some(credentials) => {
            let client = XClient::new(
                &args.x_api_url,
                OAuthSigner::new(credentials),
                config.posting_timeout,
            )?;
            let publisher = RetryPublisher::new(client, POST_MAX_RETRIES, config.retry_delay);
            Pipeline::new(generator, publisher, ledger, config.clone())
                .run(articles)
                .await
        }
        None => {
            Pipeline::new(generator, DryRunPublisher, ledger, config.clone())
                .run(articles)
                .await
        }
    };

    if summary.rate_limited {
        warn!("Run ended early because of a rate limit");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        posted = summary.posted,
        attempted = summary.attempted,
        "Execution complete"
    );

    Ok(())
}

/// Refuse to start unless Ollama answers and has the configured model.
#[instrument(level = "info", skip(generator))]
async fn preflight_ollama(generator: &OllamaGenerator, url: &str) -> Result<(), Box<dyn Error>> {
    if !generator.check_connection().await {
        error!(%url, "Cannot reach Ollama; start it with `ollama serve`");
        return Err(format!("Ollama not reachable at {url}").into());
    }
    if !generator.has_model(generator.model()).await {
        error!(model = generator.model(), "Model not installed; run `ollama pull {}`", generator.model());
        return Err(format!("model {} not available", generator.model()).into());
    }
    info!(model = generator.model(), "Ollama ready");
    Ok(())
}
