//! Publishing posts to X.
//!
//! # Architecture
//!
//! - [`Publisher`]: the capability the pipeline depends on
//! - [`XClient`]: X API v2 `POST /2/tweets` with OAuth 1.0a signing
//! - [`RetryPublisher`]: decorator that retries transient failures
//! - [`DryRunPublisher`]: logs the post and pretends it went out
//!
//! # Failure classes
//!
//! | Response | Error | Retried |
//! |----------|-------|---------|
//! | 429 | [`PublishError::RateLimited`] | never; the run stops |
//! | 500, 502, 503, 504, timeout, transport | [`PublishError::Transient`] | yes |
//! | anything else | [`PublishError::Rejected`] | never |

use crate::models::PostReceipt;
use crate::oauth::OAuthSigner;
use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Wait suggested when a 429 carries no `Retry-After`.
const DEFAULT_RATE_LIMIT_HINT: &str = "15-20 minutes";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("rate limited by the posting API")]
    RateLimited {
        /// Seconds from `Retry-After`, when the API sent it.
        retry_after: Option<u64>,
    },
    #[error("transient posting failure: {0}")]
    Transient(String),
    #[error("post rejected with HTTP {status}: {detail}")]
    Rejected { status: u16, detail: String },
}

impl PublishError {
    /// Only transient failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PublishError::Transient(_))
    }

    /// Human hint for how long to wait after a rate limit.
    pub fn wait_hint(&self) -> Option<String> {
        match self {
            PublishError::RateLimited {
                retry_after: Some(secs),
            } => Some(format!("{} minutes", secs / 60)),
            PublishError::RateLimited { retry_after: None } => {
                Some(DEFAULT_RATE_LIMIT_HINT.to_string())
            }
            _ => None,
        }
    }
}

/// Something that can publish a finished post.
pub trait Publisher {
    /// Publish `text` as-is.
    ///
    /// # Arguments
    ///
    /// * `text` - The final post, link included
    ///
    /// # Returns
    ///
    /// A [`PostReceipt`] on success, or the classified failure.
    async fn post(&self, text: &str) -> Result<PostReceipt, PublishError>;
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    data: Option<CreatedPostData>,
}

#[derive(Debug, Deserialize)]
struct CreatedPostData {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    detail: Option<String>,
    title: Option<String>,
}

fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503 | 504)
}

/// `detail`, then `title` from an API problem body, else the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ApiProblem>(body)
        .ok()
        .and_then(|p| p.detail.or(p.title))
        .unwrap_or_else(|| truncate_for_log(body.trim(), 300))
}

/// X API v2 client.
pub struct XClient {
    client: Client,
    endpoint: String,
    signer: OAuthSigner,
}

impl fmt::Debug for XClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl XClient {
    /// # Arguments
    ///
    /// * `endpoint` - Full create-post URL, e.g. `https://api.x.com/2/tweets`
    /// * `signer` - OAuth signer holding the account credentials
    /// * `timeout` - Per-request timeout
    pub fn new(
        endpoint: impl Into<String>,
        signer: OAuthSigner,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
            signer,
        })
    }
}

impl Publisher for XClient {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    async fn post(&self, text: &str) -> Result<PostReceipt, PublishError> {
        let t0 = Instant::now();
        let auth = self
            .signer
            .authorization("POST", &self.endpoint)
            .map_err(|e| PublishError::Rejected {
                status: 0,
                detail: e.to_string(),
            })?;

        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timeout" } else { "transport" };
                PublishError::Transient(format!("{kind}: {e}"))
            })?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = resp.text().await.unwrap_or_default();
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if status == StatusCode::CREATED {
            let id = serde_json::from_str::<CreatedPost>(&body)
                .ok()
                .and_then(|c| c.data)
                .and_then(|d| d.id);
            info!(?id, elapsed_ms, "Post published");
            return Ok(PostReceipt { id });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let err = PublishError::RateLimited { retry_after };
            error!(
                wait = %err.wait_hint().unwrap_or_default(),
                "Rate limit exceeded; wait before running the bot again"
            );
            return Err(err);
        }

        let detail = error_detail(&body);
        if is_transient_status(status) {
            warn!(status = status.as_u16(), %detail, elapsed_ms, "Posting API unavailable");
            return Err(PublishError::Transient(format!("HTTP {}: {detail}", status.as_u16())));
        }

        error!(status = status.as_u16(), %detail, "Post rejected");
        Err(PublishError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

/// Retries transient failures of any [`Publisher`] after a fixed delay.
///
/// Rate limits and rejections are returned immediately.
pub struct RetryPublisher<P> {
    inner: P,
    max_retries: usize,
    delay: Duration,
}

impl<P> RetryPublisher<P>
where
    P: Publisher,
{
    /// # Arguments
    ///
    /// * `inner` - The publisher to wrap
    /// * `max_retries` - Extra attempts after the first (1 in production)
    /// * `delay` - Fixed wait before each retry
    pub fn new(inner: P, max_retries: usize, delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            delay,
        }
    }
}

impl<P> fmt::Debug for RetryPublisher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPublisher")
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .finish()
    }
}

impl<P> Publisher for RetryPublisher<P>
where
    P: Publisher,
{
    #[instrument(level = "info", skip_all)]
    async fn post(&self, text: &str) -> Result<PostReceipt, PublishError> {
        let mut attempt = 0usize;
        loop {
            match self.inner.post(text).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max = self.max_retries,
                        delay = ?self.delay,
                        error = %e,
                        "post() failed; retrying"
                    );
                    sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Logs the post instead of publishing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunPublisher;

impl Publisher for DryRunPublisher {
    async fn post(&self, text: &str) -> Result<PostReceipt, PublishError> {
        info!(chars = text.chars().count(), "[dry run] Would post:\n{text}");
        Ok(PostReceipt::default())
    }
}
