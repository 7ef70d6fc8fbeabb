//! Size limiting for captured payloads.

use crate::config::BodyLogMode;

/// Appended to payloads cut down in `TRUNCATED` mode.
pub const TRUNCATION_MARKER: &str = "...";

/// Apply the body log mode to a payload.
///
/// Lengths are counted in characters, not bytes. A payload within
/// `max_length` is always returned unchanged.
pub fn apply(payload: &str, max_length: usize, mode: BodyLogMode) -> String {
    let length = payload.chars().count();
    if length <= max_length {
        return payload.to_string();
    }

    match mode {
        BodyLogMode::Full => payload.to_string(),
        BodyLogMode::Truncated => {
            let cut = payload
                .char_indices()
                .nth(max_length)
                .map(|(idx, _)| idx)
                .unwrap_or(payload.len());
            format!("{}{}", &payload[..cut], TRUNCATION_MARKER)
        }
        BodyLogMode::Skip => blob_marker(length),
    }
}

/// The `<BLOB:n>` marker logged in place of a skipped payload.
pub fn blob_marker(length: usize) -> String {
    format!("<BLOB:{}>", length)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [BodyLogMode; 3] = [BodyLogMode::Full, BodyLogMode::Truncated, BodyLogMode::Skip];

    #[test]
    fn test_within_limit_is_unchanged_for_every_mode() {
        for mode in MODES {
            assert_eq!(apply("hello", 5, mode), "hello");
            assert_eq!(apply("hello", 100, mode), "hello");
            assert_eq!(apply("", 0, mode), "");
        }
    }

    #[test]
    fn test_full_keeps_oversized_payload() {
        let payload = "x".repeat(500);
        assert_eq!(apply(&payload, 10, BodyLogMode::Full), payload);
    }

    #[test]
    fn test_skip_reports_original_length() {
        let payload = "a".repeat(1000);
        assert_eq!(apply(&payload, 100, BodyLogMode::Skip), "<BLOB:1000>");
    }

    #[test]
    fn test_truncated_is_prefix_with_marker() {
        let payload: String = ('a'..='z').cycle().take(300).collect();
        let out = apply(&payload, 100, BodyLogMode::Truncated);

        let kept = out.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(kept.chars().count(), 100);
        assert!(payload.starts_with(kept));
    }

    #[test]
    fn test_zero_limit_exceeds_for_non_empty_payload() {
        assert_eq!(apply("abc", 0, BodyLogMode::Skip), "<BLOB:3>");
        assert_eq!(apply("abc", 0, BodyLogMode::Truncated), TRUNCATION_MARKER);
        assert_eq!(apply("abc", 0, BodyLogMode::Full), "abc");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let payload = "ééééé";
        assert_eq!(apply(payload, 5, BodyLogMode::Skip), payload);
        assert_eq!(apply(payload, 2, BodyLogMode::Truncated), "éé...");
        assert_eq!(apply(payload, 2, BodyLogMode::Skip), "<BLOB:5>");
    }
}
