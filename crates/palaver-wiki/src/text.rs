//! Text shaping helpers for article output.

/// Marker appended to truncated article content.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";

/// Keep the first `count` sentences of `text`, re-joined and terminated
/// with a period.
#[must_use]
pub fn limit_sentences(text: &str, count: usize) -> String {
    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(count)
        .collect();

    let mut result = sentences.join(". ");
    if !result.is_empty() && !result.ends_with('.') {
        result.push('.');
    }
    result
}

/// Truncate `content` to at most `max_chars` characters of body text,
/// preferring a sentence or paragraph boundary when one falls past 80% of
/// the limit. Content within the limit is returned unchanged; truncated
/// content carries [`TRUNCATION_MARKER`].
#[must_use]
pub fn truncate_at_boundary(content: &str, max_chars: usize) -> String {
    // Byte offset of the max_chars-th character; None means it fits as is.
    let cut = match content.char_indices().nth(max_chars) {
        Some((offset, _)) => offset,
        None => return content.to_string(),
    };
    let truncated = &content[..cut];

    let last_period = truncated.rfind('.');
    let last_newline = truncated.rfind('\n');
    let break_point = last_period.max(last_newline);

    match break_point {
        // Only break early when the boundary is reasonably close to the
        // limit, otherwise too much content would be lost.
        Some(boundary) if boundary as f64 > cut as f64 * 0.8 => {
            format!("{}{}", &content[..=boundary], TRUNCATION_MARKER)
        }
        _ => format!("{truncated}...{TRUNCATION_MARKER}"),
    }
}
