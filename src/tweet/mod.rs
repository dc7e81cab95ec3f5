//! Post composition: raw model text in, publishable post out.
//!
//! # Stages
//!
//! | Stage | Module | Role |
//! |-------|--------|------|
//! | Sanitize | [`sanitize`] | Strip quotes, markdown and narration |
//! | Line breaks | [`breaks`] | Split flat text into paragraphs |
//! | Validate | [`validate`] | Refuse text that still looks generated |
//! | Budget | [`budget`] | Fit body and link under the length cap |
//!
//! Every stage is a pure string function. [`compose`] chains them.

pub mod breaks;
pub mod budget;
pub mod sanitize;
pub mod validate;

use crate::utils::truncate_for_log;
use thiserror::Error;
use tracing::debug;

pub use breaks::ensure_breaks;
pub use budget::{assemble, fit_body};
pub use sanitize::sanitize;
pub use validate::{Rejection, rejection_reason};

/// Why generated text could not become a post.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("generated text was empty after sanitizing")]
    Empty,
    #[error("generated text rejected: {reason} ({preview})")]
    Rejected { reason: Rejection, preview: String },
}

/// Turn raw generated text into the final post.
///
/// With a link, the result is `body + " " + link` fitted to `max_total`;
/// without one, the body alone is fitted.
pub fn compose(raw: &str, link: Option<&str>, max_total: usize) -> Result<String, ComposeError> {
    let mut body = sanitize(raw);
    if body.is_empty() {
        return Err(ComposeError::Empty);
    }

    if !body.contains('\n') {
        debug!("No line breaks in generated text; adding them between sentences");
        body = ensure_breaks(&body);
    }

    if let Some(reason) = rejection_reason(&body) {
        return Err(ComposeError::Rejected {
            reason,
            preview: truncate_for_log(&body, 50),
        });
    }

    let post = match link.filter(|l| !l.is_empty()) {
        Some(link) => assemble(&body, link, max_total),
        None => fit_body(&body, max_total),
    };
    Ok(post)
}
