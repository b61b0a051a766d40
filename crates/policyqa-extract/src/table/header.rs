//! Header row detection and semantic column mapping.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use policyqa_core::ExtractConfig;
use regex::Regex;
use serde::Serialize;

use crate::text::normalize_compact;

/// Substrings that mark a header row (category, type, content, day count,
/// period, attachment, note, standard, target, validity).
const HEADER_KEYWORDS: &[&str] = &[
    "구분", "유형", "내용", "일수", "기간", "첨부", "비고", "기준", "대상", "유효",
];

/// Semantic role of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Category,
    Type,
    Content,
    Days,
    Validity,
    Attachments,
    Note,
}

impl Role {
    /// Evaluation order for column mapping.
    pub const ALL: [Role; 7] = [
        Role::Category,
        Role::Type,
        Role::Content,
        Role::Days,
        Role::Validity,
        Role::Attachments,
        Role::Note,
    ];

    /// Header name tried verbatim when no pattern claimed the role.
    pub fn header_name(&self) -> &'static str {
        match self {
            Role::Category => "구분",
            Role::Type => "유형",
            Role::Content => "내용",
            Role::Days => "기간",
            Role::Validity => "사용기한",
            Role::Attachments => "첨부서류",
            Role::Note => "비고",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Role::Category => &CATEGORY_RE,
            Role::Type => &TYPE_RE,
            Role::Content => &CONTENT_RE,
            Role::Days => &DAYS_RE,
            Role::Validity => &VALIDITY_RE,
            Role::Attachments => &ATTACHMENTS_RE,
            Role::Note => &NOTE_RE,
        }
    }
}

// Patterns run against normalized header cells (no spaces or punctuation).
static CATEGORY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"구분|분류|항목").unwrap());
static TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"유형|종류|경조사?").unwrap());
static CONTENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"내용|대상|사유").unwrap());
static DAYS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"일수|휴가일|^기간|부여일|시간").unwrap());
static VALIDITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"유효|사용기한|사용기간|기한").unwrap());
static ATTACHMENTS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"첨부|서류|증빙").unwrap());
static NOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"비고|참고|메모").unwrap());

/// The detected header row of a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRow {
    pub index: usize,
    pub cells: Vec<String>,
    pub score: i64,
}

/// Locate the header among the first rows. Only rows with at least one
/// header keyword qualify; short cells alone never make a header. `None`
/// means the table is not treated as structured.
pub fn find_header_row(grid: &[Vec<String>], cfg: &ExtractConfig) -> Option<HeaderRow> {
    let mut best: Option<HeaderRow> = None;

    for (index, row) in grid.iter().take(cfg.header_scan_rows).enumerate() {
        let Some(score) = header_score(row, cfg) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(HeaderRow {
                index,
                cells: row.clone(),
                score,
            });
        }
    }

    best.filter(|h| h.score >= cfg.header_min_score)
}

/// `None` when the row carries no header keyword.
fn header_score(row: &[String], cfg: &ExtractConfig) -> Option<i64> {
    let joined = normalize_compact(&row.join(""));
    let keyword_hits = HEADER_KEYWORDS
        .iter()
        .filter(|k| joined.contains(*k))
        .count() as i64;
    if keyword_hits == 0 {
        return None;
    }

    let short_cells = row
        .iter()
        .filter(|cell| {
            let len = cell.trim().chars().count();
            (1..=cfg.short_cell_max_len).contains(&len)
        })
        .count() as i64;

    Some(keyword_hits * cfg.header_keyword_weight + short_cells.min(cfg.short_cell_bonus_cap))
}

/// Role → column index. A role is present only when a header pattern fired.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMap(BTreeMap<Role, usize>);

impl ColumnMap {
    pub fn get(&self, role: Role) -> Option<usize> {
        self.0.get(&role).copied()
    }

    /// Trimmed, non-empty cell of `row` for `role`.
    pub fn cell<'a>(&self, row: &'a [String], role: Role) -> Option<&'a str> {
        self.get(role).and_then(|i| non_empty(row, i))
    }

    /// Column for `role`, falling back to a header cell named exactly like the role.
    pub fn resolve(&self, header: &[String], role: Role) -> Option<usize> {
        self.get(role).or_else(|| {
            let wanted = normalize_compact(role.header_name());
            header.iter().position(|h| normalize_compact(h) == wanted)
        })
    }
}

/// Assign each role the first header column matching its pattern.
/// Once assigned, a role is never reassigned.
pub fn build_column_map(header: &[String]) -> ColumnMap {
    let mut map = BTreeMap::new();
    for role in Role::ALL {
        let found = header
            .iter()
            .position(|cell| role.pattern().is_match(&normalize_compact(cell)));
        if let Some(index) = found {
            map.entry(role).or_insert(index);
        }
    }
    ColumnMap(map)
}

/// Rows after the header that carry at least one non-empty cell.
pub fn body_rows<'a>(grid: &'a [Vec<String>], header: &HeaderRow) -> Vec<&'a [String]> {
    grid.iter()
        .skip(header.index + 1)
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| row.as_slice())
        .collect()
}

/// Trimmed cell text, treating blanks and dash placeholders as absent.
pub(crate) fn non_empty(row: &[String], index: usize) -> Option<&str> {
    row.get(index)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty() && !c.chars().all(|ch| matches!(ch, '-' | '–' | '—')))
}
