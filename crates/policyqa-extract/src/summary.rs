//! Short auxiliary summary over the evidence window.

use crate::text::{collapse_whitespace, truncate_chars};
use crate::types::Evidence;

/// Returned when the window holds no evidence at all.
pub const NOT_FOUND_SUMMARY: &str = "관련 규정을 찾지 못했습니다.";

const PARAGRAPH_MAX_CHARS: usize = 300;

pub fn build_summary(intent_label: &str, evidence: &[Evidence]) -> String {
    if evidence.is_empty() {
        return NOT_FOUND_SUMMARY.to_string();
    }

    let header = format!("**[{}]**", intent_label);
    let paragraph = evidence
        .iter()
        .filter_map(Evidence::paragraph_text)
        .map(collapse_whitespace)
        .find(|t| !t.is_empty())
        .map(|t| truncate_chars(&t, PARAGRAPH_MAX_CHARS));
    let has_table = evidence.iter().any(Evidence::is_table);

    match (paragraph, has_table) {
        (Some(p), true) => format!("{}\n{}\n\n아래 표를 참고하세요.", header, p),
        (Some(p), false) => format!("{}\n{}", header, p),
        (None, true) => format!("{}\n관련 표를 아래에 첨부했습니다.", header),
        (None, false) => format!("{}\n관련 근거를 찾았습니다. 원문을 확인해 주세요.", header),
    }
}
