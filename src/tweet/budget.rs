//! Character budgeting: fit a post and its article link under the platform cap.
//!
//! Lengths are counted in chars, not bytes, so emoji and accented text are
//! budgeted the way a reader counts them.

use super::breaks::ensure_breaks;
use tracing::warn;

/// Appended when a cut lands mid-paragraph.
pub const ELLIPSIS: &str = "...";

/// Caps at or below this are the free tier, where links are auto-shortened.
pub const FREE_TIER_MAX_LENGTH: usize = 280;

/// Length the platform charges for any link on the free tier.
pub const SHORTENED_LINK_LENGTH: usize = 23;

/// Upper bound on the space reserved for a link on premium tiers.
pub const MAX_LINK_RESERVATION: usize = 100;

/// Bodies longer than this get their sentence breaks restored after a cut.
const BREAK_RESTORE_MIN_LENGTH: usize = 50;

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut `text` down to at most `max_length` chars.
///
/// Prefers, in order: a newline past half of the budget (returned without an
/// ellipsis, trailing whitespace trimmed), a space past 80% of the budget,
/// then a hard cut. The last two get [`ELLIPSIS`] appended.
///
/// Budgets smaller than the ellipsis itself fall back to a plain prefix.
pub fn truncate(text: &str, max_length: usize) -> String {
    if char_len(text) <= max_length {
        return text.to_string();
    }
    if max_length < ELLIPSIS.len() {
        return text.chars().take(max_length).collect();
    }

    let window: String = text.chars().take(max_length - ELLIPSIS.len()).collect();

    if let Some(cut) = window.rfind('\n') {
        if char_len(&window[..cut]) as f64 > max_length as f64 * 0.5 {
            return window[..cut].trim_end().to_string();
        }
    }

    let mut kept = window.as_str();
    if let Some(cut) = window.rfind(' ') {
        if char_len(&window[..cut]) as f64 > max_length as f64 * 0.8 {
            kept = &window[..cut];
        }
    }
    format!("{kept}{ELLIPSIS}")
}

/// Space set aside for the link and what is left for the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkBudget {
    pub reserved: usize,
    pub max_body: usize,
}

impl LinkBudget {
    /// Free tier charges a flat [`SHORTENED_LINK_LENGTH`]; premium charges the
    /// real length, capped at [`MAX_LINK_RESERVATION`]. One extra char goes
    /// to the separating space.
    pub fn for_link(link: &str, max_total: usize) -> Self {
        let reserved = if max_total <= FREE_TIER_MAX_LENGTH {
            SHORTENED_LINK_LENGTH
        } else {
            char_len(link).min(MAX_LINK_RESERVATION)
        };
        Self {
            reserved,
            max_body: max_total.saturating_sub(reserved + 1),
        }
    }
}

/// Truncate a body to `budget` without losing its paragraph breaks.
///
/// If the cut left a substantial body with no newline, breaks are restored;
/// should that push it back over budget it is cut once more.
pub fn fit_body(body: &str, budget: usize) -> String {
    let cut = truncate(body, budget);
    if cut.contains('\n') || char_len(&cut) <= BREAK_RESTORE_MIN_LENGTH {
        return cut;
    }
    let spaced = ensure_breaks(&cut);
    if char_len(&spaced) <= budget {
        spaced
    } else {
        truncate(&spaced, budget)
    }
}

/// Build `body + " " + link` within `max_total` chars.
///
/// The first pass budgets the link with [`LinkBudget`]. When the real link is
/// longer than that estimate, a single second pass re-fits the body against
/// the link's actual length. If even that cannot fit (a link longer than the
/// cap), the overflow is accepted and the post is the bare link.
pub fn assemble(body: &str, link: &str, max_total: usize) -> String {
    let budget = LinkBudget::for_link(link, max_total);
    let fitted = fit_body(body, budget.max_body);
    let post = join_link(&fitted, link);

    let total = char_len(&post);
    if total <= max_total {
        return post;
    }

    warn!(
        total,
        max_total,
        link_len = char_len(link),
        "Post over budget after link reservation; refitting body"
    );
    let remaining = max_total.saturating_sub(char_len(link) + 1);
    let refitted = fit_body(&fitted, remaining);
    join_link(&refitted, link)
}

fn join_link(body: &str, link: &str) -> String {
    if body.trim().is_empty() {
        link.to_string()
    } else {
        format!("{body} {link}")
    }
}
