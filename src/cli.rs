//! Command-line interface definitions for the tech news bot.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also come from an environment variable, and a `.env`
//! file in the working directory is loaded before parsing.

use clap::Parser;

/// Command-line arguments for the tech news bot.
///
/// Options cover the post length tier, the local Ollama backend, the
/// posted-links ledger and the X API credentials.
///
/// # Examples
///
/// ```sh
/// # Premium tier, everything else from .env
/// technews_bot
///
/// # Free tier, three posts, no network writes
/// technews_bot --max-post-length 280 --posts-per-run 3 --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Maximum post length in characters (280 = free tier, 25000 = premium)
    #[arg(long, env = "X_TWEET_MAX_LENGTH", default_value_t = 25_000)]
    pub max_post_length: usize,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Ollama model used for generation
    #[arg(short, long, env = "OLLAMA_MODEL", default_value = "gemma3:4b")]
    pub model: String,

    /// File recording links that were already posted
    #[arg(short, long, env = "POSTED_LINKS_FILE", default_value = "posted_links.txt")]
    pub ledger_path: String,

    /// How many articles to post per run
    #[arg(short = 'n', long, env = "POSTS_PER_RUN", default_value_t = 1)]
    pub posts_per_run: usize,

    /// Only consider articles published within this many hours
    #[arg(long, env = "RSS_HOURS", default_value_t = 12)]
    pub recency_hours: u32,

    /// X API endpoint for creating posts
    #[arg(long, env = "X_API_URL", default_value = "https://api.x.com/2/tweets")]
    pub x_api_url: String,

    /// X API consumer key
    #[arg(long, env = "X_API_KEY", hide_env_values = true)]
    pub x_api_key: Option<String>,

    /// X API consumer secret
    #[arg(long, env = "X_API_SECRET", hide_env_values = true)]
    pub x_api_secret: Option<String>,

    /// X API access token (user context)
    #[arg(long, env = "X_ACCESS_TOKEN", hide_env_values = true)]
    pub x_access_token: Option<String>,

    /// X API access token secret (user context)
    #[arg(long, env = "X_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub x_access_token_secret: Option<String>,

    /// Generate and log posts without publishing or recording them
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "technews_bot",
            "--max-post-length",
            "280",
            "--posts-per-run",
            "3",
            "--dry-run",
        ]);

        assert_eq!(cli.max_post_length, 280);
        assert_eq!(cli.posts_per_run, 3);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "technews_bot",
            "-m",
            "llama3.2:3b",
            "-l",
            "/tmp/state/posted.txt",
            "-n",
            "2",
        ]);

        assert_eq!(cli.model, "llama3.2:3b");
        assert_eq!(cli.ledger_path, "/tmp/state/posted.txt");
        assert_eq!(cli.posts_per_run, 2);
    }

    #[test]
    fn test_cli_credentials_flags() {
        let cli = Cli::parse_from([
            "technews_bot",
            "--x-api-key",
            "key",
            "--x-api-secret",
            "secret",
            "--x-access-token",
            "token",
            "--x-access-token-secret",
            "token-secret",
        ]);

        assert_eq!(cli.x_api_key.as_deref(), Some("key"));
        assert_eq!(cli.x_access_token_secret.as_deref(), Some("token-secret"));
    }
}
