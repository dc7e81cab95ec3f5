//! Sentence-level line breaks for posts that arrive as one flat paragraph.
//!
//! The model is told to put every sentence on its own line but frequently
//! ignores it. A wall of text reads badly on the timeline, so when a post has
//! no newline at all we split it into paragraphs at sentence boundaries.

use once_cell::sync::Lazy;
use regex::Regex;

/// `. ` / `! ` / `? ` followed directly by a capitalized word.
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?])\s+([A-Z])").unwrap());

/// Sentence end, then an emoji run or a hashtag, then a capitalized word.
/// The break goes after the trailing token so it stays on its sentence.
/// An emoji run may carry skin tones, variation selectors and ZWJ joins.
static TRAILING_TOKEN_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([.!?])\s+((?:\p{Extended_Pictographic}[\x{1F3FB}-\x{1F3FF}]?\x{FE0F}?\x{200D}?)+|#\w+)\s+([A-Z])",
    )
    .unwrap()
});

/// Insert paragraph breaks between sentences when `text` has no newline.
///
/// Text that already contains a newline is returned unchanged, which makes the
/// function safe to call more than once.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(ensure_breaks("Big news. Huge."), "Big news.\n\nHuge.");
/// assert_eq!(ensure_breaks("Wild! 🤯 Nobody saw it"), "Wild! 🤯\n\nNobody saw it");
/// ```
pub fn ensure_breaks(text: &str) -> String {
    if text.contains('\n') {
        return text.to_string();
    }
    let spaced = SENTENCE_BOUNDARY.replace_all(text, "${1}\n\n${2}");
    let spaced = TRAILING_TOKEN_BOUNDARY.replace_all(&spaced, "${1} ${2}\n\n${3}");
    spaced.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaks_between_sentences() {
        let out = ensure_breaks("Nvidia did it again. Gamers are crying. Who is buying?");
        assert_eq!(
            out,
            "Nvidia did it again.\n\nGamers are crying.\n\nWho is buying?"
        );
    }

    #[test]
    fn test_break_after_trailing_emoji() {
        let out = ensure_breaks("Android wins again! 😂 Apple fans stay mad.");
        assert_eq!(out, "Android wins again! 😂\n\nApple fans stay mad.");
    }

    #[test]
    fn test_break_after_joined_emoji_sequence() {
        let out = ensure_breaks("Copilot writes the code now. 👨‍💻 Devs just review it.");
        assert_eq!(out, "Copilot writes the code now. 👨‍💻\n\nDevs just review it.");
        let out = ensure_breaks("Pride month merch drops! 🏳️‍🌈 Apple is first again.");
        assert_eq!(out, "Pride month merch drops! 🏳️‍🌈\n\nApple is first again.");
    }

    #[test]
    fn test_break_after_trailing_hashtag() {
        let out = ensure_breaks("Linux just works. #Technews What are you running?");
        assert_eq!(out, "Linux just works. #Technews\n\nWhat are you running?");
    }

    #[test]
    fn test_lowercase_continuation_is_left_alone() {
        let text = "Version 2.0 ships today. then again, maybe not";
        assert_eq!(ensure_breaks(text), text);
    }

    #[test]
    fn test_existing_newlines_are_untouched() {
        let text = "First line. Still first.\nSecond line.";
        assert_eq!(ensure_breaks(text), text);
    }

    #[test]
    fn test_two_sentences_always_gain_a_newline() {
        let samples = [
            "One. Two. Three.",
            "Wow! Really? Yes.",
            "AMD is back? Intel is nervous. Discuss!",
        ];
        for sample in samples {
            assert!(ensure_breaks(sample).contains('\n'), "no break in {sample:?}");
        }
    }
}
