use std::sync::LazyLock;

use regex::Regex;

/// Result of looking for one `old` snippet in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The text with the first occurrence replaced.
    Applied(String),
    NotFound,
}

/// Replace the first exact occurrence of `old` in `code` with `new`.
///
/// TODO: add a second stage that matches on `normalize_whitespace` output
/// and maps the hit back to original offsets, so snippets that differ from
/// the file only in indentation still apply.
pub fn replace_first(code: &str, old: &str, new: &str) -> MatchOutcome {
    if old.is_empty() || !code.contains(old) {
        return MatchOutcome::NotFound;
    }
    MatchOutcome::Applied(code.replacen(old, new, 1))
}

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));
static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("invalid between-tags pattern"));

/// Collapse whitespace runs to one space and drop whitespace between tags.
/// Used for mismatch diagnostics.
pub fn normalize_whitespace(code: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(code, " ");
    BETWEEN_TAGS.replace_all(&collapsed, "><").trim().to_owned()
}

/// At most `max` characters of `text`, never splitting a character.
pub fn prefix(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_only_first_occurrence() {
        let code = "<p>a</p>\n<p>a</p>\n";
        assert_eq!(
            replace_first(code, "<p>a</p>", "<p>b</p>"),
            MatchOutcome::Applied("<p>b</p>\n<p>a</p>\n".into())
        );
    }

    #[test]
    fn test_empty_replacement_deletes() {
        assert_eq!(
            replace_first("keep drop keep", " drop", ""),
            MatchOutcome::Applied("keep keep".into())
        );
    }

    #[test]
    fn test_whitespace_differences_do_not_match() {
        assert_eq!(
            replace_first("<div>\n  <b/>\n</div>", "<div><b/></div>", "x"),
            MatchOutcome::NotFound
        );
        assert_eq!(replace_first("abc", "", "x"), MatchOutcome::NotFound);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  <div>\n    <b>x   y</b>\n  </div>\n"),
            "<div><b>x y</b></div>"
        );
        assert_eq!(normalize_whitespace("a\t\tb"), "a b");
    }

    #[test]
    fn test_prefix_respects_char_boundaries() {
        assert_eq!(prefix("héllo", 2), "hé");
        assert_eq!(prefix("ab", 80), "ab");
    }
}
