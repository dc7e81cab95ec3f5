//! Prompt text for post generation.
//!
//! The persona is fixed; the per-article part carries the headline, a clipped
//! summary and the source name. The article link is never given to the
//! model because it is attached after generation.

use crate::models::Article;
use crate::utils::take_chars;

/// Summary chars included in the prompt.
pub const PROMPT_SUMMARY_CHARS: usize = 200;

pub const SYSTEM_PROMPT: &str = "\
You are a hilarious, witty tech influencer who writes viral-worthy posts. Your personality:
- Extremely funny, engaging and human. Posts should make people laugh or think, and end with an open question for the reader.
- Use memes and relatable tech humor.
- Focus on: mobile phones, Intel, Nvidia, Apple, AMD, Android, Linux, macOS, Windows, AI and anything trending in tech.
- Be bold, opinionated and entertaining, never corporate.
- Use emojis sparingly (1-2 max).
- You like Linux and macOS over Windows, and Android over iOS.
- You prefer open source software, and one-time payments over subscriptions.
- Write ONLY the post text. No explanations, no meta-commentary, no phrases like \"here's a tweet\" or \"okay, here's\".
- Never say \"as an AI\", \"as a language model\" or \"channeling my inner\".
- NEVER use markdown: no asterisks, no underscores, no bold, no italics. Emphasize with CAPS or emojis instead.
- Put each sentence on its own line.
- Write exactly ONE post. The article link is added automatically.
- Always include one hashtag (#Technews).
- Start directly with the post content, no preamble.";

/// The per-article request.
pub fn user_prompt(article: &Article) -> String {
    format!(
        "Write a HILARIOUS, engaging post about this tech news:

Title: {title}
Summary: {summary}
Source: {source}

Requirements:
- Write ONLY the post text, nothing else
- No explanations, no \"here's a tweet\", no meta-commentary
- Each sentence on a new line
- Funny, relatable and shareable; hot takes and sarcasm welcome
- End with an open question for the reader
- Start directly with the post content

Post:",
        title = article.title,
        summary = take_chars(&article.summary, PROMPT_SUMMARY_CHARS),
        source = article.source,
    )
}

/// Full prompt sent to the model: persona, blank line, request.
pub fn build_prompt(article: &Article) -> String {
    format!("{SYSTEM_PROMPT}\n\n{}", user_prompt(article))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            title: "Nvidia RTX 6090 announced".into(),
            link: "https://www.theverge.com/2026/10/16/rtx-6090".into(),
            summary: "s".repeat(500),
            source: "The Verge".into(),
            published: None,
        }
    }

    #[test]
    fn test_prompt_contains_article_fields() {
        let prompt = build_prompt(&article());
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("Title: Nvidia RTX 6090 announced"));
        assert!(prompt.contains("Source: The Verge"));
        assert!(prompt.trim_end().ends_with("Post:"));
    }

    #[test]
    fn test_summary_is_clipped() {
        let prompt = user_prompt(&article());
        let line = prompt.lines().find(|l| l.starts_with("Summary: ")).unwrap();
        assert_eq!(line.len(), "Summary: ".len() + PROMPT_SUMMARY_CHARS);
    }

    #[test]
    fn test_link_not_sent_to_model() {
        assert!(!build_prompt(&article()).contains("rtx-6090"));
    }
}
