//! Storage key layout.
//!
//! Every blob the system writes lives under a per-user prefix, so user
//! isolation reduces to key construction. All key builders go through
//! here; nothing else in the codebase formats storage keys by hand.
//!
//! Layout:
//!
//! ```text
//! users/{user_id}/chat/sessions/{session_id}.json
//! users/{user_id}/chat/index.json
//! users/{user_id}/uploads/{session_id}/{timestamp_ms}_{filename}
//! ```

use taska_types::identity::UserId;
use taska_types::session::SessionId;

/// Key of the session record document for one conversation.
pub fn session_record(user_id: &UserId, session_id: &SessionId) -> String {
    format!(
        "users/{}/chat/sessions/{}.json",
        user_id.as_str(),
        session_id.as_str()
    )
}

/// Key of the per-user session index document.
pub fn session_index(user_id: &UserId) -> String {
    format!("users/{}/chat/index.json", user_id.as_str())
}

/// Key of an uploaded attachment, namespaced by session and prefixed
/// with the upload timestamp so repeated uploads of the same filename
/// within a session never collide.
pub fn upload(
    user_id: &UserId,
    session_id: &SessionId,
    timestamp_ms: i64,
    filename: &str,
) -> String {
    format!(
        "users/{}/uploads/{}/{}_{}",
        user_id.as_str(),
        session_id.as_str(),
        timestamp_ms,
        sanitize_filename(filename)
    )
}

/// Reduce a client-supplied filename to a single safe path segment.
///
/// Strips any directory components, then replaces characters outside
/// `[A-Za-z0-9._-]` (multi-byte ones included) with `_`. An empty or
/// all-dots result falls back to `"file"` so the key always has a
/// final segment.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned
    }
}
