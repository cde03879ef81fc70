//! Text Flow Engine: greedy word-fill wrapping and ellipsis truncation.
//!
//! Both functions are pure with respect to the [`TextMeasure`] they are given.

use crate::layout::font_metrics::TextMeasure;

pub const ELLIPSIS: &str = "...";

/// Greedy word-fill wrap.
///
/// Each whitespace-delimited word is tentatively appended to the current line with a
/// single space and kept only if the measured line still fits `max_width`; otherwise
/// the line is flushed and the word starts the next one. A word wider than
/// `max_width` on its own is placed alone, unsplit. Empty input yields no lines.
pub fn wrap<M>(text: &str, max_width: f32, measure: &M) -> Vec<String>
where
    M: TextMeasure + ?Sized,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.width(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Returns `text` unchanged if it fits, otherwise keeps the longest prefix for which
/// `prefix + "..."` fits. If not even the ellipsis fits, the ellipsis alone is returned.
///
/// A longer prefix never measures narrower, so the cut point is found by bisecting
/// char boundaries: O(log n) measurements instead of one per dropped character.
pub fn truncate<M>(text: &str, max_width: f32, measure: &M) -> String
where
    M: TextMeasure + ?Sized,
{
    if measure.width(text) <= max_width {
        return text.to_string();
    }

    // starts[k] is the byte length of the first k chars, for k < char count.
    let starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let candidate = |chars: usize| format!("{}{ELLIPSIS}", text[..starts[chars]].trim_end());

    // Every prefix shorter than `lo` chars fits; none of `hi` chars or more does.
    let (mut lo, mut hi) = (0, starts.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if measure.width(&candidate(mid)) <= max_width {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    match lo {
        0 => ELLIPSIS.to_string(),
        fitted => candidate(fitted - 1),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::layout::font_metrics::{FontFace, FontMeasure};

    /// Every character is exactly one unit wide.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn width(&self, text: &str) -> f32 {
            text.chars().count() as f32
        }
    }

    /// Monospace that also counts how often it is asked.
    #[derive(Default)]
    struct CountingMonospace {
        calls: Cell<usize>,
    }

    impl TextMeasure for CountingMonospace {
        fn width(&self, text: &str) -> f32 {
            self.calls.set(self.calls.get() + 1);
            Monospace.width(text)
        }
    }

    #[test]
    fn test_wrap_empty_text_has_no_lines() {
        assert!(wrap("", 10.0, &Monospace).is_empty());
        assert!(wrap("   \n\t ", 10.0, &Monospace).is_empty());
    }

    #[test]
    fn test_wrap_fills_lines_greedily() {
        let lines = wrap("aaa bbb ccc dd", 7.0, &Monospace);
        assert_eq!(lines, vec!["aaa bbb", "ccc dd"]);
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        let lines = wrap("a    b\n\nc", 100.0, &Monospace);
        assert_eq!(lines, vec!["a b c"]);
    }

    #[test]
    fn test_wrap_never_exceeds_width_for_short_words() {
        let text = "the quick brown fox jumps over the lazy dog again and again";
        for width in 5..30 {
            let width = width as f32;
            for line in wrap(text, width, &Monospace) {
                assert!(
                    Monospace.width(&line) <= width,
                    "line {line:?} exceeds {width}"
                );
            }
        }
    }

    #[test]
    fn test_wrap_places_overlong_word_alone_unsplit() {
        let lines = wrap("hi supercalifragilistic yo", 6.0, &Monospace);
        assert_eq!(lines, vec!["hi", "supercalifragilistic", "yo"]);
    }

    #[test]
    fn test_wrap_preserves_word_order() {
        let text = "one two three four five six seven";
        let joined = wrap(text, 9.0, &Monospace).join(" ");
        assert_eq!(joined, text);
    }

    #[test]
    fn test_truncate_returns_fitting_text_unchanged() {
        assert_eq!(truncate("hello", 5.0, &Monospace), "hello");
        assert_eq!(truncate("hello", 50.0, &Monospace), "hello");
    }

    #[test]
    fn test_truncate_appends_ellipsis_within_width() {
        let out = truncate("linkedin.com/in/someone", 10.0, &Monospace);
        assert!(out.ends_with(ELLIPSIS), "{out:?}");
        assert!(Monospace.width(&out) <= 10.0, "{out:?}");
        assert_eq!(out, "linkedi...");
    }

    #[test]
    fn test_truncate_with_real_metrics() {
        let measure = FontMeasure::new(FontFace::Regular, 8.0);
        let text = "https://github.com/a-very-long-user-name/with-a-long-repository";
        let out = truncate(text, 120.0, &measure);
        assert!(out.ends_with(ELLIPSIS));
        assert!(measure.width(&out) <= 120.0);
    }

    #[test]
    fn test_truncate_degenerate_width_returns_ellipsis() {
        assert_eq!(truncate("abcdef", 1.0, &Monospace), ELLIPSIS);
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let once = truncate("a long line of text", 8.0, &Monospace);
        let twice = truncate(&once, 8.0, &Monospace);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_truncate_trims_whitespace_before_ellipsis() {
        assert_eq!(truncate("abc   defgh", 8.0, &Monospace), "abc...");
    }

    #[test]
    fn test_truncate_keeps_multibyte_boundaries() {
        assert_eq!(truncate("Тошкент шаҳри", 6.0, &Monospace), "Тош...");
    }

    #[test]
    fn test_truncate_huge_token_measures_logarithmically() {
        let token = "a".repeat(100_000);
        let measure = CountingMonospace::default();

        let out = truncate(&token, 40.0, &measure);

        assert_eq!(out, format!("{}{ELLIPSIS}", "a".repeat(37)));
        assert!(
            measure.calls.get() <= 20,
            "{} measurements for a 100k-char token",
            measure.calls.get()
        );
    }
}
