//! Disambiguation selection.
//!
//! After a multi-result elicitation the user answers with either part of a
//! title or a 1-based number. Resolution order is fixed: case-insensitive
//! substring match against candidate titles first, then index parsing.
//! When neither matches, that is a typed failure, never a silent fallback
//! to the first candidate.

use palaver_protocol::{PalaverError, PalaverResult};

/// Resolve a user's selection string against a candidate list.
///
/// # Errors
///
/// `AmbiguousSelection` when the input matches no title substring and is
/// not a valid 1-based index.
pub fn resolve_selection<'a>(input: &str, candidates: &'a [String]) -> PalaverResult<&'a str> {
    let input = input.trim();
    if input.is_empty() {
        return Err(selection_error(input, candidates.len()));
    }

    // Title match first (partial, case-insensitive).
    let needle = input.to_lowercase();
    if let Some(title) = candidates
        .iter()
        .find(|title| title.to_lowercase().contains(&needle))
    {
        return Ok(title);
    }

    // Fall back to 1-based number selection.
    if let Ok(index) = input.parse::<usize>() {
        if (1..=candidates.len()).contains(&index) {
            return Ok(&candidates[index - 1]);
        }
    }

    Err(selection_error(input, candidates.len()))
}

fn selection_error(input: &str, count: usize) -> PalaverError {
    PalaverError::ambiguous_selection(format!(
        "invalid selection '{input}': enter a title name or a number 1-{count}"
    ))
}
