//! Text utilities for TUI rendering.

use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncates a string with ellipsis if it exceeds max_width (unicode-aware).
///
/// Uses unicode width for accurate terminal column calculation, handling
/// wide characters (CJK, emoji) correctly.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return "\u{2026}".to_string();
    }
    let mut truncated = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let next_width = width + ch.width().unwrap_or(0);
        if next_width + 1 > max_width {
            break;
        }
        truncated.push(ch);
        width = next_width;
    }
    truncated.push('\u{2026}');
    truncated
}

/// Strips escape characters and control whitespace from server-provided text.
///
/// Action codes and detail values come from the monitored hosts and may carry
/// terminal escapes, tabs or newlines that would corrupt the layout.
pub fn sanitize_for_display(s: &str) -> Cow<'_, str> {
    if s.chars().any(|c| c == '\x1b' || c == '\t' || c == '\n' || c == '\r') {
        Cow::Owned(
            s.replace('\x1b', "")
                .replace('\t', "    ")
                .replace(['\n', '\r'], " "),
        )
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_with_ellipsis_short() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_with_ellipsis_truncated() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello w\u{2026}");
        assert_eq!(truncate_with_ellipsis("hello", 1), "\u{2026}");
    }

    #[test]
    fn test_truncate_with_ellipsis_wide_cjk() {
        // "中文" is 4 columns wide.
        assert_eq!(truncate_with_ellipsis("中文test", 6), "中文t\u{2026}");
    }

    #[test]
    fn test_sanitize_for_display() {
        assert_eq!(
            sanitize_for_display("\x1b[31mrm -rf /\x1b[0m\tnow\nplease"),
            "[31mrm -rf /[0m    now please"
        );
        assert!(matches!(sanitize_for_display("clean"), Cow::Borrowed(_)));
    }
}
