//! Shared utility functions for repositories

/// Escape special characters in ILIKE patterns to prevent pattern injection.
///
/// ILIKE uses `%` for any sequence and `_` for single character wildcards.
/// If user input contains these characters, they must be escaped to match
/// literally.
pub fn escape_ilike(pattern: &str) -> String {
    pattern
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_")
}

// ============================================================================
// SQL Column Constants
//
// These constants define the SELECT column lists for each entity type,
// reducing duplication and ensuring consistency across queries.
// ============================================================================

/// SQL columns for loop queries
pub const LOOP_COLUMNS: &str = r#"
    id, slug, title, description, bpm, musical_key, duration_secs, genre,
    original_file, preview_file, file_hash, waveform, status, user_id,
    download_count, listen_count, average_rating, rating_count,
    created_at, updated_at
"#;

/// SQL columns for loop queries with the `l` table alias (for joins)
pub const LOOP_COLUMNS_L: &str = r#"
    l.id, l.slug, l.title, l.description, l.bpm, l.musical_key,
    l.duration_secs, l.genre, l.original_file, l.preview_file, l.file_hash,
    l.waveform, l.status, l.user_id, l.download_count, l.listen_count,
    l.average_rating, l.rating_count, l.created_at, l.updated_at
"#;

/// SQL columns for notification queries
pub const NOTIFICATION_COLUMNS: &str = r#"
    id, user_id, type, title, message, payload, is_read, created_at
"#;

/// SQL columns for user queries
pub const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, avatar_url, created_at
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_ilike() {
        assert_eq!(escape_ilike("100%"), r"100\%");
        assert_eq!(escape_ilike("a_b"), r"a\_b");
        assert_eq!(escape_ilike(r"back\slash"), r"back\\slash");
        assert_eq!(escape_ilike("plain"), "plain");
    }
}
