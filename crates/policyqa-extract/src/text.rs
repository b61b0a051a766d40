//! Markup stripping, entity decoding and comparison normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>|</div\s*>|</li\s*>").unwrap());

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Markup fragment to plain text: line breaks become spaces, tags are
/// stripped, entities decoded, whitespace collapsed.
///
/// The fragment goes through an HTML5 parser, so every named and numeric
/// character reference is decoded and unknown ones stay literal.
pub fn decode_markup_text(html: &str) -> String {
    let spaced = LINE_BREAK_RE.replace_all(html, " ");
    let fragment = Html::parse_fragment(&spaced);
    let pieces: Vec<&str> = fragment.root_element().text().collect();
    collapse_whitespace(&pieces.join(" "))
}

/// Lowercase, drop whitespace and punctuation. Used for every
/// case/space/punctuation-insensitive substring comparison.
pub fn normalize_compact(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_markup_text() {
        let html = "<td>배우자<br/>사망&nbsp;시 <b>5일</b> &amp; 유급</td>";
        assert_eq!(decode_markup_text(html), "배우자 사망 시 5일 & 유급");
    }

    #[test]
    fn test_numeric_entities_and_unknown_names() {
        assert_eq!(decode_markup_text("&#54633;&#x41;"), "합A");
        assert_eq!(decode_markup_text("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_named_entities_beyond_basic_set() {
        assert_eq!(decode_markup_text("5&times;2"), "5×2");
        assert_eq!(decode_markup_text("1&sim;3일"), "1∼3일");
        assert_eq!(decode_markup_text("&copy; 인사팀"), "© 인사팀");
        assert_eq!(decode_markup_text("&bull; 항목"), "• 항목");
        assert_eq!(decode_markup_text("&laquo;별표&raquo;"), "«별표»");
    }

    #[test]
    fn test_escaped_markup_stays_literal() {
        assert_eq!(decode_markup_text("&lt;b&gt;"), "<b>");
    }

    #[test]
    fn test_normalize_compact() {
        assert_eq!(normalize_compact(" 휴가 일수(일) "), "휴가일수일");
        assert_eq!(normalize_compact("Type-A"), "typea");
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("가나다라", 2), "가나...");
        assert_eq!(truncate_chars("가나", 5), "가나");
    }
}
