//! String utilities for safe text handling

/// Marker appended to any text cut down to fit a budget.
pub const ELLIPSIS: &str = "...";

/// Maximum preview length for text in logs
pub const MAX_PREVIEW_LEN: usize = 100;

/// Truncates `text` so that it never exceeds `budget` characters, marker included.
///
/// Text that already fits is returned unchanged. Longer text is cut on a
/// character boundary and ends in [`ELLIPSIS`], so the result is exactly
/// `budget` characters long. Budgets smaller than the marker fall back to a
/// hard cut.
///
/// # Example
/// ```
/// use foodbot::utils::string::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Jollof Rice", 24), "Jollof Rice");
/// assert_eq!(truncate_with_ellipsis("Extra Spicy Chicken Suya Platter", 20), "Extra Spicy Chick...");
/// ```
pub fn truncate_with_ellipsis(text: &str, budget: usize) -> String {
    // nth() avoids counting the whole string when it is long
    if text.chars().nth(budget).is_none() {
        return text.to_string();
    }

    let marker_len = ELLIPSIS.chars().count();
    if budget <= marker_len {
        return text.chars().take(budget).collect();
    }

    let mut out: String = text.chars().take(budget - marker_len).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Creates a safe UTF-8 preview of a string for log lines.
pub fn safe_preview(text: &str, max_chars: usize) -> String {
    let preview: String = text.chars().take(max_chars).collect();
    if text.chars().nth(max_chars).is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Collapses runs of whitespace and lowercases, the canonical form used for matching.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
