//! Cleanup of raw model output into a postable string.
//!
//! Small models wrap the post in quotes, sprinkle markdown, and narrate
//! ("Okay, here's a tweet: ..."). Each artifact is handled by one [`Step`];
//! [`STEPS`] fixes the order they run in. Steps are plain `&str -> String`
//! functions with no I/O, so each one is tested on its own.
//!
//! Newlines are structure, not noise: no step joins lines or drops empty ones.

use once_cell::sync::Lazy;
use regex::Regex;

/// A named transformation in the sanitizer chain.
pub struct Step {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Sanitizer steps in execution order.
///
/// Quote recovery runs before lead-in stripping on purpose: the narration in
/// front of the quote is what tells us the quote is the real post.
pub const STEPS: &[Step] = &[
    Step { name: "unwrap_quotes", apply: unwrap_enclosing_quotes },
    Step { name: "strip_markdown", apply: strip_markdown },
    Step { name: "extract_quoted_post", apply: extract_quoted_post },
    Step { name: "strip_lead_in", apply: strip_lead_in },
    Step { name: "strip_meta_phrases", apply: strip_meta_phrases },
    Step { name: "normalize_lines", apply: normalize_lines },
    Step { name: "unwrap_quotes", apply: unwrap_enclosing_quotes },
    Step { name: "extract_quoted_post", apply: extract_quoted_post },
];

/// Upper bound on passes over [`STEPS`]; each pass peels one more layer.
const MAX_PASSES: usize = 4;

/// Run [`STEPS`] until the text stops changing, then trim it.
///
/// Unwrapping a quote can expose a lead-in that an earlier step already ran
/// past, so one pass is not enough. Internal newlines survive verbatim; only
/// leading and trailing whitespace is removed.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    for pass in 0..MAX_PASSES {
        let next = run_steps(&text).trim().to_string();
        if next == text {
            break;
        }
        tracing::trace!(pass, "sanitizer pass changed text");
        text = next;
    }
    text
}

fn run_steps(text: &str) -> String {
    STEPS.iter().fold(text.to_string(), |text, step| {
        let next = (step.apply)(&text);
        if next != text {
            tracing::trace!(step = step.name, "sanitizer step changed text");
        }
        next
    })
}

const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('\u{201C}', '\u{201D}'), ('\'', '\'')];

/// Narration prefixes, checked in order and stripped repeatedly.
/// Longer forms come before the short interjections they start with.
const LEAD_IN_PREFIXES: [&str; 10] = [
    "okay, here's a tweet:",
    "here's a tweet:",
    "here is a tweet:",
    "here's your tweet:",
    "tweet:",
    "okay, here's",
    "okay,",
    "alright,",
    "so,",
    "well,",
];

/// Words that mark the text before a quoted span as narration.
const COMMENTARY_MARKERS: [&str; 5] = ["tweet", "here", "okay", "channeling", "designed"];

/// Narration longer than this (in chars, colon included) may hide a quoted post.
const MIN_COMMENTARY_LEN: usize = 20;

static META_LEAD_INS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^.*?channeling my inner.*?:",
        r"(?i)^.*?designed to go viral.*?:",
        r"(?i)^.*?here['’]s what i think.*?:",
        r"(?i)^.*?my take.*?:",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static BOLD_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());
static BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+)__").unwrap());
static ITALIC_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
// `_` only counts as emphasis at a word edge, so snake_case survives. The
// closing edge is a `\b` so it is not consumed and adjacent spans both match.
static ITALIC_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|[^\w])_([^_\n]+)_\b").unwrap());
static LINE_START_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[*_]+[ \t]+").unwrap());
static STRAY_MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+[*_]+[ \t]+").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Remove one layer of quotes when they wrap the whole (trimmed) text.
pub fn unwrap_enclosing_quotes(text: &str) -> String {
    let trimmed = text.trim();
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.to_string();
        }
    }
    text.to_string()
}

/// Collapse `**x**`, `__x__`, `*x*` and `_x_` to `x`; drop isolated markers.
pub fn strip_markdown(text: &str) -> String {
    let out = BOLD_STARS.replace_all(text, "${1}");
    let out = BOLD_UNDERSCORES.replace_all(&out, "${1}");
    let out = ITALIC_STARS.replace_all(&out, "${1}");
    let out = ITALIC_UNDERSCORES.replace_all(&out, "${1}${2}");
    let out = LINE_START_MARKERS.replace_all(&out, "");
    STRAY_MARKERS.replace_all(&out, " ").into_owned()
}

/// Replace narrated output with the quoted post it contains.
///
/// Looks for the first colon followed (after optional spaces) by a quote. The
/// span runs to the first matching closing quote (see [`closing_quote`]). It
/// replaces the whole text only when the text before it is longer than
/// [`MIN_COMMENTARY_LEN`] chars and mentions one of [`COMMENTARY_MARKERS`].
pub fn extract_quoted_post(text: &str) -> String {
    for (colon, _) in text.match_indices(':') {
        let rest = text[colon + 1..].trim_start();
        let Some(open) = rest.chars().next() else {
            break;
        };
        let close = match open {
            '"' | '\'' => open,
            '\u{201C}' => '\u{201D}',
            _ => continue,
        };
        let body = &rest[open.len_utf8()..];
        let Some(end) = closing_quote(body, close) else {
            break;
        };
        let quoted = body[..end].trim();
        let lead_in = text[..=colon].trim().to_lowercase();
        let narrated = lead_in.chars().count() > MIN_COMMENTARY_LEN
            && COMMENTARY_MARKERS.iter().any(|m| lead_in.contains(m));
        if narrated && !quoted.is_empty() {
            return quoted.to_string();
        }
        break;
    }
    text.to_string()
}

/// Byte offset of the first `close` in `body` that ends a quoted span.
///
/// A `'` followed by a letter or digit is an apostrophe (`it's`), not a
/// closing quote.
fn closing_quote(body: &str, close: char) -> Option<usize> {
    body.char_indices()
        .find(|&(i, c)| {
            c == close
                && (close != '\''
                    || body[i + c.len_utf8()..]
                        .chars()
                        .next()
                        .is_none_or(|next| !next.is_alphanumeric()))
        })
        .map(|(i, _)| i)
}

/// Strip narration prefixes such as "Okay," or "Tweet:" from the start.
pub fn strip_lead_in(text: &str) -> String {
    let mut current = text.trim_start();
    while let Some(rest) = LEAD_IN_PREFIXES
        .iter()
        .find_map(|prefix| strip_prefix_ignore_case(current, prefix))
    {
        let rest = rest.trim_start();
        current = rest.strip_prefix(':').unwrap_or(rest).trim_start();
    }
    current.to_string()
}

/// Delete "...my take...:"-style narration up to its colon.
pub fn strip_meta_phrases(text: &str) -> String {
    META_LEAD_INS
        .iter()
        .fold(text.to_string(), |acc, re| re.replace(&acc, "").trim().to_string())
}

/// Per line: collapse whitespace, then re-apply lead-in and meta stripping.
/// Empty lines are kept.
pub fn normalize_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let line = WHITESPACE_RUN.replace_all(line, " ");
            let line = strip_lead_in(line.trim());
            strip_meta_phrases(&line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrated_quote_is_recovered() {
        let raw = r#"Okay, here's a tweet: "Android beats iOS again! 📱""#;
        assert_eq!(sanitize(raw), "Android beats iOS again! 📱");
    }

    #[test]
    fn test_bold_markdown_is_removed() {
        assert_eq!(sanitize("**AI is wild** right now."), "AI is wild right now.");
    }

    #[test]
    fn test_all_emphasis_forms_collapse() {
        let raw = "__Huge__ news: *Intel* is _finally_ shipping **real** chips";
        assert_eq!(sanitize(raw), "Huge news: Intel is finally shipping real chips");
    }

    #[test]
    fn test_snake_case_survives_markdown_strip() {
        assert_eq!(strip_markdown("set max_power_limit now"), "set max_power_limit now");
    }

    #[test]
    fn test_stray_markers_collapse_to_space() {
        assert_eq!(strip_markdown("Linux * wins _ again"), "Linux wins again");
    }

    #[test]
    fn test_enclosing_quotes_single_layer() {
        assert_eq!(unwrap_enclosing_quotes("  \"Hello world\"  "), "Hello world");
        assert_eq!(unwrap_enclosing_quotes("'Hello world'"), "Hello world");
        assert_eq!(unwrap_enclosing_quotes("“Curly too”"), "Curly too");
        assert_eq!(unwrap_enclosing_quotes("\"half quoted"), "\"half quoted");
    }

    #[test]
    fn test_lead_in_prefixes_stack() {
        assert_eq!(strip_lead_in("Okay, Tweet: Nvidia did it"), "Nvidia did it");
        assert_eq!(strip_lead_in("ALRIGHT, so, AMD is back"), "AMD is back");
        assert_eq!(strip_lead_in("Okay, : stray colon"), "stray colon");
    }

    #[test]
    fn test_lead_in_leaves_ordinary_openers() {
        assert_eq!(strip_lead_in("Here's why Linux wins"), "Here's why Linux wins");
        assert_eq!(strip_lead_in("Sony, stop."), "Sony, stop.");
    }

    #[test]
    fn test_meta_phrase_removed_up_to_colon() {
        let raw = "Channeling my inner Linus: Windows updates are a lifestyle";
        assert_eq!(sanitize(raw), "Windows updates are a lifestyle");
        assert_eq!(
            strip_meta_phrases("Here’s what I think: subscriptions are a scam"),
            "subscriptions are a scam"
        );
    }

    #[test]
    fn test_short_lead_in_keeps_quote() {
        let text = r#"Jobs said: "One more thing""#;
        assert_eq!(extract_quoted_post(text), text);
    }

    #[test]
    fn test_long_lead_in_without_markers_keeps_quote() {
        let text = r#"The CEO of a giant chip company said: "We are so back""#;
        assert_eq!(extract_quoted_post(text), text);
    }

    #[test]
    fn test_quote_with_apostrophes_is_recovered_whole() {
        let raw = "Here's a tweet designed for you: 'It's wild how Pixel's camera wins'";
        assert_eq!(
            extract_quoted_post(raw),
            "It's wild how Pixel's camera wins"
        );
    }

    #[test]
    fn test_quoted_post_ends_at_first_closing_quote() {
        let raw = r#"Okay, here's a tweet for you: "Pixel wins again." Hope that helps, "boss"!"#;
        assert_eq!(sanitize(raw), "Pixel wins again.");

        let raw = r#"Okay, here's a tweet designed for you: "Apple" vs "Samsung", who wins?"#;
        let out = sanitize(raw);
        assert_eq!(out, "Apple");
        assert_eq!(out.matches('"').count() % 2, 0);
    }

    #[test]
    fn test_single_quoted_post_stops_before_trailing_commentary() {
        let raw = "Here's a tweet designed for you: 'Pixel's camera wins.' Enjoy, it's 'spicy'";
        assert_eq!(extract_quoted_post(raw), "Pixel's camera wins.");
    }

    #[test]
    fn test_adjacent_underscore_spans_collapse() {
        assert_eq!(sanitize("Linux is _fast_ _and_ free"), "Linux is fast and free");
        assert_eq!(strip_markdown("_one_ _two_ _three_"), "one two three");
        assert_eq!(strip_markdown("_done_."), "done.");
    }

    #[test]
    fn test_lead_in_exposed_by_unwrapping_is_stripped() {
        let raw = r#"Tweet: "Okay, Nvidia did it again. Who is buying?""#;
        let once = sanitize(raw);
        assert_eq!(once, "Nvidia did it again. Who is buying?");
        assert_eq!(sanitize(&once), once);
        assert!(crate::tweet::validate::is_acceptable(&once));
    }

    #[test]
    fn test_line_structure_is_preserved() {
        let raw = "Okay, Apple raised prices again.\n\nWell,   nobody is shocked.\nWho is still buying?";
        assert_eq!(
            sanitize(raw),
            "Apple raised prices again.\n\nnobody is shocked.\nWho is still buying?"
        );
    }

    #[test]
    fn test_per_line_commentary_is_stripped() {
        let raw = "Tweet: GPUs cost a kidney now.\nMy take on it: rent one instead 😂";
        assert_eq!(sanitize(raw), "GPUs cost a kidney now.\nrent one instead 😂");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "Android beats iOS again! 📱",
            "AI is wild right now.",
            "Linux on the desktop?\n\nMaybe next year. #Technews",
            "Nvidia's new GPU costs more than my rent 😭\nWould you buy it?",
            r#"Tweet: "Okay, Nvidia did it again. Who is buying?""#,
            r#"Okay, here's a tweet designed for you: "Apple" vs "Samsung", who wins?"#,
            "Linux is _fast_ _and_ free",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_step_order_is_explicit() {
        let names: Vec<_> = STEPS.iter().map(|s| s.name).collect();
        let extract = names.iter().position(|n| *n == "extract_quoted_post").unwrap();
        let lead_in = names.iter().position(|n| *n == "strip_lead_in").unwrap();
        assert!(extract < lead_in);
        assert_eq!(names.first(), Some(&"unwrap_quotes"));
    }

    #[test]
    fn test_empty_input_stays_empty() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   \n  "), "");
    }
}
