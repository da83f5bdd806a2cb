//! Greedy line wrapping against the estimated text width.
//!
//! # Break rule
//! Both wrappers keep an accumulator for the current line. Before appending a
//! token they measure the accumulator *with* the token; when that exceeds the
//! bound the accumulator is committed as a line and cleared, and the token is
//! appended to the fresh line anyway. A token wider than the bound therefore
//! never breaks against itself and ends up on a line of its own that overflows.
//! When the very first token overflows, the committed line is empty.
//!
//! The final accumulator is always committed, so the result is never empty:
//! empty input yields a single `""` line.

use crate::layout::font_metrics::measure;

/// Wraps `text` at whitespace so each line fits `max_width` at `font_size`.
///
/// Used for titles and excerpts.
pub fn wrap_words(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = format!("{current} {word}");
        if measure(&candidate, font_size) > max_width {
            lines.push(current.trim().to_string());
            current.clear();
        }
        current.push(' ');
        current.push_str(word);
    }
    lines.push(current.trim().to_string());

    lines
}

/// Wraps `text` at any character boundary. Used for URLs, which have no spaces to break on.
pub fn wrap_chars(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if measure(&current, font_size) > max_width {
            current.pop();
            lines.push(current.trim().to_string());
            current.clear();
            current.push(ch);
        }
    }
    lines.push(current.trim().to_string());

    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // At size 10 each char is 6pt wide, so a 61pt bound fits 10 chars but not 11.
    const SIZE: f32 = 10.0;
    const WIDTH: f32 = 61.0;

    // ── wrap_words ──────────────────────────────────────────────────────────

    #[test]
    fn test_wrap_words_empty_input_yields_one_empty_line() {
        assert_eq!(wrap_words("", WIDTH, SIZE), vec![String::new()]);
    }

    #[test]
    fn test_wrap_words_short_text_single_line() {
        assert_eq!(wrap_words("Hi there", WIDTH, SIZE), vec!["Hi there"]);
    }

    #[test]
    fn test_wrap_words_breaks_at_word_boundary() {
        // " aaaa bbbb" is 10 chars and fits; " aaaa bbbb cccc" does not.
        let lines = wrap_words("aaaa bbbb cccc", WIDTH, SIZE);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_wrap_words_collapses_runs_of_whitespace() {
        let lines = wrap_words("  aaaa \n bbbb\t", WIDTH, SIZE);
        assert_eq!(lines, vec!["aaaa bbbb"]);
    }

    #[test]
    fn test_wrap_words_overlong_first_word_pushes_empty_line() {
        // The break commits the (empty) accumulator, then appends the long word.
        let lines = wrap_words("abcdefghijklmnop", WIDTH, SIZE);
        assert_eq!(lines, vec!["", "abcdefghijklmnop"]);
    }

    #[test]
    fn test_wrap_words_overlong_word_is_not_split() {
        // The long word lands on its own line and overflows the bound.
        let lines = wrap_words("ab abcdefghijklmnop cd", WIDTH, SIZE);
        assert_eq!(lines, vec!["ab", "abcdefghijklmnop", "cd"]);
        assert!(measure(&lines[1], SIZE) > WIDTH);
    }

    #[test]
    fn test_wrap_words_lines_fit_when_every_word_fits() {
        let text = "the quick brown fox jumps over the lazy dog and keeps on running far away";
        for width in [45.0_f32, 60.0, 90.0, 150.0] {
            for line in wrap_words(text, width, SIZE) {
                assert!(
                    measure(&line, SIZE) <= width,
                    "line {line:?} exceeds {width}"
                );
            }
        }
    }

    #[test]
    fn test_wrap_words_preserves_word_order() {
        let text = "one two three four five six seven eight nine ten";
        let joined = wrap_words(text, 45.0, SIZE).join(" ");
        assert_eq!(joined, text);
    }

    #[test]
    fn test_wrap_words_lines_are_trimmed() {
        for line in wrap_words("alpha beta gamma delta", 40.0, SIZE) {
            assert_eq!(line, line.trim());
        }
    }

    // ── wrap_chars ──────────────────────────────────────────────────────────

    #[test]
    fn test_wrap_chars_empty_input_yields_one_empty_line() {
        assert_eq!(wrap_chars("", WIDTH, SIZE), vec![String::new()]);
    }

    #[test]
    fn test_wrap_chars_splits_url_anywhere() {
        let lines = wrap_chars("https://example.com/a/b", WIDTH, SIZE);
        assert_eq!(lines, vec!["https://ex", "ample.com/", "a/b"]);
    }

    #[test]
    fn test_wrap_chars_every_line_fits() {
        let url = "Know more here : https://stackoverflow.blog/2024/03/05/a-very-long-slug";
        for line in wrap_chars(url, 220.0, SIZE) {
            assert!(measure(&line, SIZE) <= 220.0, "line {line:?} too wide");
        }
    }

    #[test]
    fn test_wrap_chars_trims_spaces_at_breaks() {
        // The break falls right after a space, which is trimmed from the line.
        let lines = wrap_chars("abcdefghi jklm", WIDTH, SIZE);
        assert_eq!(lines, vec!["abcdefghi", "jklm"]);
    }

    #[test]
    fn test_wrap_chars_bound_smaller_than_one_char() {
        let lines = wrap_chars("ab", 1.0, SIZE);
        assert_eq!(lines, vec!["", "a", "b"]);
    }
}
