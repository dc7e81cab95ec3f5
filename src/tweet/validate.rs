//! Last gate before a post goes out.
//!
//! The sanitizer fixes what it can; anything that still reads like model
//! narration or carries markdown is rejected here instead of published.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Phrases that give away generated text. Matched case-insensitively anywhere.
const FORBIDDEN_PHRASES: [&str; 12] = [
    "as an ai",
    "as a language model",
    "as an artificial intelligence",
    "in this article",
    "according to",
    "here's a tweet",
    "okay, here's",
    "channeling my inner",
    "designed to go viral",
    "here's what i think",
    "my take on",
    "let me tell you",
];

const NARRATION_OPENERS: [&str; 6] = ["okay,", "alright,", "so,", "well,", "here's", "let me"];
const NARRATION_FOLLOW_ONS: [&str; 4] = ["tweet", "here", "tell", "think"];

static MARKDOWN_EMPHASIS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\*\*[^*\n]+\*\*",
        r"\*[^*\n]+\*",
        r"__[^_\n]+__",
        r"(?m)(?:^|[^\w])_[^_\n]+_(?:[^\w]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Why a post was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    ForbiddenPhrase(&'static str),
    Markdown,
    NarrationOpener,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ForbiddenPhrase(p) => write!(f, "contains forbidden phrase {p:?}"),
            Rejection::Markdown => write!(f, "still contains markdown emphasis"),
            Rejection::NarrationOpener => write!(f, "opens with narration"),
        }
    }
}

/// `true` when nothing in [`rejection_reason`] objects to `text`.
pub fn is_acceptable(text: &str) -> bool {
    rejection_reason(text).is_none()
}

/// First reason `text` should not be published, if any.
///
/// The opener check only fires when one of the first three words is also a
/// narration word, so a plain "So, Nvidia did it again" still passes.
pub fn rejection_reason(text: &str) -> Option<Rejection> {
    let lower = text.to_lowercase();

    if let Some(phrase) = FORBIDDEN_PHRASES.iter().find(|p| lower.contains(*p)) {
        return Some(Rejection::ForbiddenPhrase(phrase));
    }

    if MARKDOWN_EMPHASIS.iter().any(|re| re.is_match(text)) {
        return Some(Rejection::Markdown);
    }

    let opening = lower.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    let narrated = NARRATION_OPENERS.iter().any(|o| opening.starts_with(o))
        && NARRATION_FOLLOW_ONS.iter().any(|w| opening.contains(w));
    if narrated {
        return Some(Rejection::NarrationOpener);
    }

    None
}
