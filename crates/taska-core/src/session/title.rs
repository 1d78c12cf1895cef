//! Session title derivation.

use taska_types::session::ChatCategory;

/// Maximum title length in characters (not bytes).
pub const TITLE_MAX_CHARS: usize = 20;

/// Derive an index title from the first user message of a session.
///
/// Takes the first [`TITLE_MAX_CHARS`] characters of the trimmed query.
/// Character-based truncation keeps multi-byte text (Japanese queries
/// are the common case) intact instead of splitting a code point.
/// A blank query falls back to the category's default title.
pub fn derive_title(query: &str, category: ChatCategory) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return category.default_title().to_string();
    }
    trimmed.chars().take(TITLE_MAX_CHARS).collect()
}
