//! Sectioned free-text documents (effective date, target, standard, procedure).

use once_cell::sync::Lazy;
use policyqa_core::ExtractConfig;
use regex::Regex;

use super::StructuredTable;
use crate::types::Evidence;

const HEADING_KEYWORDS: &str = r"시행\s*일자?|적용\s*일자?|적용\s*대상|지급\s*대상|대상|지급\s*기준|적용\s*기준|세부\s*기준|기준|사용\s*절차|신청\s*절차|처리\s*절차|절차";

/// Article numbers, enumerators and bullet glyphs preceding a heading.
static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:제\s*\d+\s*조\s*|\d+\s*[.)]\s*|\(\d+\)\s*|[①-⑳]\s*|[□■○●◆◇▶▷※•·\-*]\s*)+")
        .unwrap()
});

/// A heading is the keyword alone, bracketed, or followed by a colon and inline content.
static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:[\[<【〈「(]\s*({kw})\s*[\]>】〉」)]\s*[:：]?|({kw})\s*(?:[:：]|$))\s*(.*)$",
        kw = HEADING_KEYWORDS
    ))
    .unwrap()
});

static STEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:\d+\s*[.)]|\(\d+\)|[①-⑳]|[-•·▶]|단계|step)").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    EffectiveDate,
    Target,
    Standard,
    Procedure,
}

impl Section {
    const ALL: [Section; 4] = [
        Section::EffectiveDate,
        Section::Target,
        Section::Standard,
        Section::Procedure,
    ];

    fn title(&self) -> &'static str {
        match self {
            Section::EffectiveDate => "시행일",
            Section::Target => "대상",
            Section::Standard => "기준",
            Section::Procedure => "사용 절차",
        }
    }

    fn from_keyword(keyword: &str) -> Section {
        if keyword.contains("시행") || keyword.ends_with('일') || keyword.ends_with("일자") {
            Section::EffectiveDate
        } else if keyword.contains("대상") {
            Section::Target
        } else if keyword.contains("절차") {
            Section::Procedure
        } else {
            Section::Standard
        }
    }
}

fn parse_heading(line: &str) -> Option<(Section, Option<String>)> {
    let stripped = MARKER_RE.replace(line.trim(), "");
    let caps = HEADING_RE.captures(stripped.trim())?;
    let keyword = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let inline = caps
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    Some((Section::from_keyword(keyword), inline))
}

/// Render a sectioned document when the paragraph evidence carries all four
/// headings. Returns the markdown and the section titles in document order.
pub(super) fn extract_sections(
    evidence: &[Evidence],
    cfg: &ExtractConfig,
) -> Option<(String, Vec<String>)> {
    let mut found: Vec<(Section, Vec<String>)> = Vec::new();
    let mut current: Option<usize> = None;

    let lines = evidence
        .iter()
        .filter_map(Evidence::paragraph_text)
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|l| !l.is_empty());

    for line in lines {
        if let Some((section, inline)) = parse_heading(line) {
            let slot = match found.iter().position(|(s, _)| *s == section) {
                Some(i) => i,
                None => {
                    found.push((section, Vec::new()));
                    found.len() - 1
                }
            };
            if let Some(inline) = inline {
                found[slot].1.push(inline);
            }
            current = Some(slot);
        } else if let Some(slot) = current {
            found[slot].1.push(line.to_string());
        }
    }

    if !Section::ALL
        .iter()
        .all(|s| found.iter().any(|(f, _)| f == s))
    {
        return None;
    }

    let mut out = String::from("## 기준\n");
    for section in Section::ALL {
        out.push_str(&format!("\n### {}\n", section.title()));
        let rendered = match section {
            Section::Standard => evidence
                .iter()
                .filter_map(Evidence::table_html)
                .find_map(|html| StructuredTable::parse(html, cfg))
                .map(|table| markdown_table(&table))
                .unwrap_or_else(|| bullets(section_lines(&found, section))),
            Section::Procedure => procedure_steps(section_lines(&found, section)),
            _ => bullets(section_lines(&found, section)),
        };
        out.push_str(&rendered);
        out.push('\n');
    }

    let headings = found.iter().map(|(s, _)| s.title().to_string()).collect();
    Some((out.trim_end().to_string(), headings))
}

fn section_lines(found: &[(Section, Vec<String>)], section: Section) -> &[String] {
    found
        .iter()
        .find(|(s, _)| *s == section)
        .map(|(_, lines)| lines.as_slice())
        .unwrap_or_default()
}

fn bullets(lines: &[String]) -> String {
    if lines.is_empty() {
        return "- 원문을 확인해 주세요.".to_string();
    }
    lines
        .iter()
        .map(|l| format!("- {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Enumerated step lines verbatim; every line as a bullet when none look like steps.
fn procedure_steps(lines: &[String]) -> String {
    let steps: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|l| STEP_RE.is_match(l))
        .collect();
    if steps.is_empty() {
        bullets(lines)
    } else {
        steps.join("\n")
    }
}

fn markdown_table(table: &StructuredTable) -> String {
    let row_line = |cells: &[String]| -> String {
        let cells: Vec<String> = cells
            .iter()
            .map(|c| c.trim().replace('|', "\\|"))
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = vec![
        row_line(&table.header.cells),
        format!("|{}", " --- |".repeat(table.header.cells.len())),
    ];
    lines.extend(table.body().into_iter().map(row_line));
    lines.join("\n")
}
