//! Builds `LIKE` patterns for literal substring matching.

/// Escape character declared in every `LIKE ... ESCAPE` clause.
pub const LIKE_ESCAPE: char = '\\';

/// Wrap `needle` as `%needle%`, escaping any `LIKE` metacharacters it holds.
///
/// SQLite's `LIKE` is case-insensitive for ASCII, so the resulting pattern
/// matches stored queries containing `needle` regardless of ASCII case.
pub fn substring_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if ch == '%' || ch == '_' || ch == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_term() {
        assert_eq!(substring_pattern("shoes"), "%shoes%");
    }

    #[test]
    fn test_metacharacters_escaped() {
        assert_eq!(substring_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(substring_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn test_empty_term_matches_everything() {
        assert_eq!(substring_pattern(""), "%%");
    }
}
