//! Run configuration resolved once from the CLI.
//!
//! Components receive what they need from [`PipelineConfig`] and
//! [`XCredentials`] at construction; nothing reads the environment later.

use crate::cli::Cli;
use crate::tweet::budget::FREE_TIER_MAX_LENGTH;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Post length cap in chars; at or below 280 the free-tier link rules apply.
    pub max_post_length: usize,
    pub generation_timeout: Duration,
    pub posting_timeout: Duration,
    /// Wait before the single retry of a transient posting failure.
    pub retry_delay: Duration,
    /// Pause between consecutive posts in one run.
    pub inter_post_delay: Duration,
    pub posts_per_run: usize,
    pub recency_hours: u32,
    /// Ledger lines kept by cleanup at the start of each run.
    pub ledger_capacity: usize,
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_post_length: 25_000,
            generation_timeout: Duration::from_secs(60),
            posting_timeout: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
            inter_post_delay: Duration::from_secs(60),
            posts_per_run: 1,
            recency_hours: 12,
            ledger_capacity: 1000,
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            max_post_length: cli.max_post_length,
            posts_per_run: cli.posts_per_run,
            recency_hours: cli.recency_hours,
            dry_run: cli.dry_run,
            ..Self::default()
        }
    }

    pub fn is_free_tier(&self) -> bool {
        self.max_post_length <= FREE_TIER_MAX_LENGTH
    }

    pub fn tier_label(&self) -> &'static str {
        if self.is_free_tier() { "Free" } else { "Premium" }
    }
}

/// OAuth 1.0a user-context credentials for the X API.
#[derive(Clone, PartialEq, Eq)]
pub struct XCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for XCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XCredentials")
            .field("api_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl XCredentials {
    /// All four values, or the names of the missing variables.
    pub fn from_cli(cli: &Cli) -> Result<Self, Vec<&'static str>> {
        let fields = [
            ("X_API_KEY", &cli.x_api_key),
            ("X_API_SECRET", &cli.x_api_secret),
            ("X_ACCESS_TOKEN", &cli.x_access_token),
            ("X_ACCESS_TOKEN_SECRET", &cli.x_access_token_secret),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, v)| v.as_deref().map_or(true, |s| s.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let value = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();
        Ok(Self {
            api_key: value(&cli.x_api_key),
            api_secret: value(&cli.x_api_secret),
            access_token: value(&cli.x_access_token),
            access_token_secret: value(&cli.x_access_token_secret),
        })
    }
}

/// Ledger file location from the CLI.
pub fn ledger_path(cli: &Cli) -> PathBuf {
    PathBuf::from(&cli.ledger_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_pipeline_config_from_cli() {
        let cli = Cli::parse_from(["technews_bot", "--max-post-length", "280", "-n", "2"]);
        let config = PipelineConfig::from_cli(&cli);
        assert_eq!(config.max_post_length, 280);
        assert_eq!(config.posts_per_run, 2);
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert!(config.is_free_tier());
        assert_eq!(config.tier_label(), "Free");
    }

    #[test]
    fn test_premium_tier_label() {
        let config = PipelineConfig::default();
        assert!(!config.is_free_tier());
        assert_eq!(config.tier_label(), "Premium");
    }

    #[test]
    fn test_credentials_report_missing_names() {
        let cli = Cli::parse_from(["technews_bot", "--x-api-key", "k", "--x-access-token", " "]);
        let missing = XCredentials::from_cli(&cli).unwrap_err();
        assert!(missing.contains(&"X_API_SECRET"));
        assert!(missing.contains(&"X_ACCESS_TOKEN"));
        assert!(!missing.contains(&"X_API_KEY"));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = XCredentials {
            api_key: "ck".into(),
            api_secret: "cs".into(),
            access_token: "at".into(),
            access_token_secret: "ats".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("cs"));
        assert!(!printed.contains("ats"));
    }
}
