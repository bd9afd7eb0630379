//! Text normalization for embeddable content.
//!
//! Raw ticket descriptions and wiki bodies arrive with markup and
//! punctuation that carry no semantic signal for sentence embeddings.
//! [`normalize_text`] reduces them to plain lowercase-agnostic word
//! sequences: tags and non-word characters become spaces, runs of
//! whitespace collapse to one space, and the result is trimmed.
//!
//! The function is total (never fails on malformed markup) and
//! idempotent: normalizing already-normalized text is a no-op.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip markup and non-semantic characters from `input`.
///
/// Applied in order: markup tags (`<...>`) become a space, every character
/// that is neither a word character nor whitespace becomes a space,
/// consecutive whitespace collapses to a single space, and the result is
/// trimmed. Empty input yields an empty string.
pub fn normalize_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let stripped = TAG_RE.replace_all(input, " ");
    let cleaned = NON_WORD_RE.replace_all(&stripped, " ");
    let collapsed = WHITESPACE_RE.replace_all(&cleaned, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(normalize_text("  \t\n  "), "");
    }

    #[test]
    fn test_strips_markup_tags() {
        assert_eq!(
            normalize_text("<p>payment gateway</p> <br/>timeout"),
            "payment gateway timeout"
        );
    }

    #[test]
    fn test_unclosed_tag_is_best_effort() {
        // A dangling '<' is not a tag; it is dropped as a non-word char.
        assert_eq!(normalize_text("a < b"), "a b");
    }

    #[test]
    fn test_replaces_punctuation() {
        assert_eq!(
            normalize_text("Status: Open! (high-priority)"),
            "Status Open high priority"
        );
    }

    #[test]
    fn test_keeps_underscores_and_digits() {
        assert_eq!(normalize_text("retry_count = 3"), "retry_count 3");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize_text("a\n\n  b\t\tc"), "a b c");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<div>Login fails with *500*</div>",
            "plain already clean text",
            "Status: Done\n\nPriority: High",
        ];
        for input in inputs {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "not idempotent for {input:?}");
        }
    }
}
