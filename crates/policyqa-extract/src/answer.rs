//! Answer synthesis: evidence + question kind → literal markdown.
//!
//! Paths are tried in order and the first one producing output wins:
//! sectioned document (criteria only), then each table block in evidence
//! order, then [`FALLBACK_ANSWER`].

mod sections;

use policyqa_core::ExtractConfig;
use tracing::debug;

use crate::table::header::non_empty;
use crate::table::{
    body_rows, build_column_map, extract_days_value, find_header_row, parse_grid,
    pick_best_row, ColumnMap, Grid, HeaderRow, Role,
};
use crate::types::{Evidence, ExtractQuery, ExtractResult, ExtractTrace, QuestionKind};

/// Returned whenever no path produces an answer.
pub const FALLBACK_ANSWER: &str =
    "죄송합니다. 제공된 규정 문서에서 질문에 해당하는 내용을 찾지 못했습니다.";

/// A table block whose header was detected.
pub(crate) struct StructuredTable {
    pub grid: Grid,
    pub header: HeaderRow,
    pub columns: ColumnMap,
}

impl StructuredTable {
    /// `None` when the markup yields no grid or no header row.
    pub fn parse(table_html: &str, cfg: &ExtractConfig) -> Option<Self> {
        let grid = parse_grid(table_html);
        if grid.is_empty() {
            return None;
        }
        let header = find_header_row(&grid, cfg)?;
        let columns = build_column_map(&header.cells);
        Some(Self {
            grid,
            header,
            columns,
        })
    }

    pub fn body(&self) -> Vec<&[String]> {
        body_rows(&self.grid, &self.header)
    }

    /// Header text of a column, or the role's canonical name.
    fn label(&self, column: usize, role: Role) -> String {
        non_empty(&self.header.cells, column)
            .unwrap_or(role.header_name())
            .to_string()
    }
}

/// Synthesize the answer for `query` from the evidence window.
pub fn extract(query: &ExtractQuery, evidence: &[Evidence], cfg: &ExtractConfig) -> ExtractResult {
    if query.kind == QuestionKind::Criteria {
        if let Some((answer, headings)) = sections::extract_sections(evidence, cfg) {
            debug!(?headings, "answer from sectioned document");
            return success(query.kind, answer, ExtractTrace::Sections { headings });
        }
    }

    if query.kind != QuestionKind::Unknown {
        for (evidence_index, item) in evidence.iter().enumerate() {
            let Some(html) = item.table_html() else {
                continue;
            };
            let Some(table) = StructuredTable::parse(html, cfg) else {
                debug!(evidence_index, "table skipped: no grid or header");
                continue;
            };

            let rendered = match query.kind {
                QuestionKind::List => render_list(&table, evidence_index),
                QuestionKind::Days => render_days(&table, query, cfg, evidence_index),
                QuestionKind::Criteria => render_criteria(&table, query, cfg, evidence_index),
                QuestionKind::Unknown => None,
            };
            if let Some((answer, trace)) = rendered {
                debug!(evidence_index, kind = %query.kind, "answer from table");
                return success(query.kind, answer, trace);
            }
        }
    }

    debug!(kind = %query.kind, "no extraction path matched");
    ExtractResult {
        ok: false,
        kind: query.kind,
        answer: FALLBACK_ANSWER.to_string(),
        trace: None,
    }
}

fn success(kind: QuestionKind, answer: String, trace: ExtractTrace) -> ExtractResult {
    ExtractResult {
        ok: true,
        kind,
        answer,
        trace: Some(trace),
    }
}

/// One bullet per body row: `type · content — days`.
fn render_list(table: &StructuredTable, evidence_index: usize) -> Option<(String, ExtractTrace)> {
    // The category column stands in for the type only when no type column exists.
    let label_role = if table.columns.get(Role::Type).is_some() {
        Role::Type
    } else {
        Role::Category
    };

    let mut lines: Vec<String> = Vec::new();
    for row in table.body() {
        let label = table.columns.cell(row, label_role);
        let content = table
            .columns
            .cell(row, Role::Content)
            .filter(|c| Some(*c) != label);
        if label.is_none() && content.is_none() {
            continue;
        }

        let head = [label, content].into_iter().flatten().collect::<Vec<_>>().join(" · ");
        let line = match table.columns.cell(row, Role::Days) {
            Some(days) => format!("- {} — {}", head, days),
            None => format!("- {}", head),
        };
        if lines.last() != Some(&line) {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        return None;
    }
    let rows = lines.len();
    Some((lines.join("\n"), ExtractTrace::TableRows { evidence_index, rows }))
}

fn render_days(
    table: &StructuredTable,
    query: &ExtractQuery,
    cfg: &ExtractConfig,
    evidence_index: usize,
) -> Option<(String, ExtractTrace)> {
    let body = table.body();
    let best = pick_best_row(&body, &query.tokens, &query.event_tags, cfg)?;
    let value = days_value(table, best.cells)?;

    let mut answer = format!("**{}**", value);
    let context = row_context(table, best.cells);
    if !context.is_empty() {
        answer.push_str(&format!(" ({})", context));
    }
    if let Some(column) = table.columns.get(Role::Validity) {
        if let Some(validity) = non_empty(best.cells, column) {
            answer.push_str(&format!(
                "\n- {}: {}",
                table.label(column, Role::Validity),
                validity
            ));
        }
    }

    Some((
        answer,
        ExtractTrace::TableRow {
            evidence_index,
            row: best.cells.to_vec(),
            score: best.score,
        },
    ))
}

/// Day value of the days column only. Other columns (deadlines, notes) may
/// also carry day counts that are not the granted period.
fn days_value(table: &StructuredTable, row: &[String]) -> Option<String> {
    let column = table.columns.resolve(&table.header.cells, Role::Days)?;
    non_empty(row, column).and_then(extract_days_value)
}

/// `type · content` of a row, falling back to the category.
fn row_context(table: &StructuredTable, row: &[String]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for role in [Role::Type, Role::Content] {
        if let Some(cell) = table.columns.cell(row, role) {
            if !parts.contains(&cell) {
                parts.push(cell);
            }
        }
    }
    if parts.is_empty() {
        if let Some(category) = table.columns.cell(row, Role::Category) {
            parts.push(category);
        }
    }
    parts.join(" · ")
}

fn render_criteria(
    table: &StructuredTable,
    query: &ExtractQuery,
    cfg: &ExtractConfig,
    evidence_index: usize,
) -> Option<(String, ExtractTrace)> {
    let body = table.body();
    let best = pick_best_row(&body, &query.tokens, &query.event_tags, cfg)?;

    let mut used: Vec<usize> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    for role in [
        Role::Type,
        Role::Content,
        Role::Days,
        Role::Validity,
        Role::Attachments,
        Role::Note,
    ] {
        let Some(column) = table.columns.resolve(&table.header.cells, role) else {
            continue;
        };
        if used.contains(&column) {
            continue;
        }
        used.push(column);
        if let Some(value) = non_empty(best.cells, column) {
            lines.push(format!("- {}: {}", table.label(column, role), value));
        }
    }

    if lines.is_empty() {
        return None;
    }
    Some((
        lines.join("\n"),
        ExtractTrace::TableRow {
            evidence_index,
            row: best.cells.to_vec(),
            score: best.score,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventTag;

    const LEAVE_TABLE: &str = "<table>\
        <tr><th>구분</th><th>유형</th><th>내용</th><th>휴가일수</th><th>첨부서류</th><th>비고</th></tr>\
        <tr><td rowspan=\"3\">가족</td><td>본인</td><td>결혼</td><td>5일</td><td>청첩장</td><td>-</td></tr>\
        <tr><td>배우자</td><td>사망</td><td>5일</td><td>사망진단서</td><td>-</td></tr>\
        <tr><td>자녀</td><td>결혼</td><td>1일</td><td>청첩장</td><td>-</td></tr>\
        </table>";

    fn query(question: &str, kind: QuestionKind, tokens: &[&str], tags: &[EventTag]) -> ExtractQuery {
        ExtractQuery {
            question: question.to_string(),
            kind,
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
            event_tags: tags.to_vec(),
        }
    }

    #[test]
    fn test_days_answer_from_matching_row() {
        let evidence = vec![
            Evidence::paragraph("복리후생규정.docx", "제5조 경조휴가는 다음 표와 같다."),
            Evidence::table("복리후생규정.docx", LEAVE_TABLE),
        ];
        let q = query(
            "배우자 사망 경조휴가 며칠이야?",
            QuestionKind::Days,
            &["배우자", "사망", "경조휴가"],
            &[EventTag::Spouse, EventTag::Bereavement, EventTag::Family],
        );

        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(result.ok);
        assert!(result.answer.starts_with("**5일**"));
        assert!(result.answer.contains("배우자 · 사망"));
        match result.trace {
            Some(ExtractTrace::TableRow {
                evidence_index,
                row,
                ..
            }) => {
                assert_eq!(evidence_index, 1);
                assert_eq!(row[1], "배우자");
            }
            other => panic!("unexpected trace: {:?}", other),
        }
    }

    #[test]
    fn test_blank_days_column_is_not_filled_from_other_columns() {
        let html = "<table><tr><th>유형</th><th>휴가일수</th><th>사용기한</th></tr>\
            <tr><td>배우자 출산</td><td>-</td><td>출산일로부터 90일 이내</td></tr></table>";
        let evidence = vec![Evidence::table("a.docx", html)];
        let q = query(
            "배우자 출산휴가 며칠",
            QuestionKind::Days,
            &["배우자", "출산"],
            &[EventTag::Spouse, EventTag::Childbirth],
        );
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(!result.ok);
        assert_eq!(result.answer, FALLBACK_ANSWER);
        assert!(!result.answer.contains("90일"));
    }

    #[test]
    fn test_blank_days_column_falls_through_to_next_table() {
        let blank = "<table><tr><th>유형</th><th>휴가일수</th><th>사용기한</th></tr>\
            <tr><td>배우자 출산</td><td>-</td><td>출산일로부터 90일 이내</td></tr></table>";
        let filled = "<table><tr><th>유형</th><th>휴가일수</th></tr>\
            <tr><td>배우자 출산</td><td>10일</td></tr></table>";
        let evidence = vec![
            Evidence::table("a.docx", blank),
            Evidence::table("a.docx", filled),
        ];
        let q = query(
            "배우자 출산휴가 며칠",
            QuestionKind::Days,
            &["배우자", "출산"],
            &[EventTag::Spouse, EventTag::Childbirth],
        );
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(result.ok);
        assert_eq!(result.answer, "**10일** (배우자 출산)");
        assert!(matches!(
            result.trace,
            Some(ExtractTrace::TableRow { evidence_index: 1, .. })
        ));
    }

    #[test]
    fn test_bare_number_in_days_column_reads_as_days() {
        let html = "<table><tr><th>구분</th><th>대상</th><th>기간</th></tr>\
            <tr><td>예비군</td><td>훈련 참가자</td><td>2</td></tr></table>";
        let evidence = vec![Evidence::table("a.docx", html)];
        let q = query(
            "예비군 훈련 며칠",
            QuestionKind::Days,
            &["예비군", "훈련"],
            &[EventTag::ReserveDuty],
        );
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(result.ok);
        assert_eq!(result.answer, "**2일** (훈련 참가자)");
    }

    #[test]
    fn test_validity_line_uses_header_text() {
        let html = "<table><tr><th>유형</th><th>일수</th><th>사용기한</th></tr>\
            <tr><td>배우자 출산</td><td>10일</td><td>출산일로부터 90일 이내</td></tr></table>";
        let evidence = vec![Evidence::table("a.docx", html)];
        let q = query(
            "배우자 출산휴가 며칠",
            QuestionKind::Days,
            &["배우자", "출산"],
            &[EventTag::Spouse, EventTag::Childbirth],
        );
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert_eq!(
            result.answer,
            "**10일** (배우자 출산)\n- 사용기한: 출산일로부터 90일 이내"
        );
    }

    #[test]
    fn test_list_skips_rows_without_type_or_content() {
        let html = "<table>\
            <tr><th>구분</th><th>유형</th><th>내용</th><th>일수</th></tr>\
            <tr><td>경조</td><td>결혼</td><td>본인</td><td>5일</td></tr>\
            <tr><td>경조</td><td>사망</td><td>부모</td><td></td></tr>\
            <tr><td>기타</td><td></td><td></td><td>1일</td></tr>\
            </table>";
        let evidence = vec![Evidence::table("a.docx", html)];
        let q = query("휴가 종류 목록", QuestionKind::List, &["휴가", "종류"], &[]);

        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(result.ok);
        assert_eq!(result.answer, "- 결혼 · 본인 — 5일\n- 사망 · 부모");
        assert_eq!(result.answer.lines().count(), 2);
    }

    #[test]
    fn test_list_falls_back_to_next_table() {
        let empty = "<table><tr><th>유형</th><th>내용</th></tr><tr><td>-</td><td></td></tr></table>";
        let evidence = vec![
            Evidence::table("a.docx", empty),
            Evidence::table("a.docx", LEAVE_TABLE),
        ];
        let q = query("경조휴가 전체 목록", QuestionKind::List, &[], &[]);
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(result.ok);
        assert!(result.answer.starts_with("- 본인 · 결혼 — 5일"));
        assert!(matches!(
            result.trace,
            Some(ExtractTrace::TableRows { evidence_index: 1, rows: 3 })
        ));
    }

    #[test]
    fn test_criteria_row_bullets() {
        let evidence = vec![Evidence::table("a.docx", LEAVE_TABLE)];
        let q = query(
            "배우자 사망 시 첨부 서류 기준",
            QuestionKind::Criteria,
            &["배우자", "사망", "첨부", "서류"],
            &[EventTag::Spouse, EventTag::Bereavement],
        );
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(result.ok);
        assert_eq!(
            result.answer,
            "- 유형: 배우자\n- 내용: 사망\n- 휴가일수: 5일\n- 첨부서류: 사망진단서"
        );
    }

    #[test]
    fn test_criteria_prefers_sectioned_document() {
        let mut evidence: Vec<Evidence> = [
            "[시행일] 2024년 1월 1일",
            "대상: 전 직원",
            "기준",
            "근속 1년 이상 직원에게 부여한다.",
            "사용 절차",
            "1. 휴가 신청서 작성",
            "2. 팀장 승인",
        ]
        .iter()
        .map(|l| Evidence::paragraph("복리후생규정.docx", *l))
        .collect();
        evidence.push(Evidence::table("복리후생규정.docx", LEAVE_TABLE));

        let q = query(
            "배우자 사망 휴가 기준",
            QuestionKind::Criteria,
            &["배우자", "사망", "휴가"],
            &[EventTag::Spouse, EventTag::Bereavement],
        );
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(result.ok);
        assert!(result.answer.starts_with("## 기준\n"));
        assert!(result.answer.contains("| 구분 | 유형 | 내용 | 휴가일수 | 첨부서류 | 비고 |"));
        match result.trace {
            Some(ExtractTrace::Sections { headings }) => {
                assert_eq!(headings, vec!["시행일", "대상", "기준", "사용 절차"]);
            }
            other => panic!("unexpected trace: {:?}", other),
        }
    }

    #[test]
    fn test_criteria_without_sections_reads_table_row() {
        let evidence = vec![
            Evidence::paragraph("복리후생규정.docx", "대상: 전 직원"),
            Evidence::table("복리후생규정.docx", LEAVE_TABLE),
        ];
        let q = query(
            "배우자 사망 휴가 기준",
            QuestionKind::Criteria,
            &["배우자", "사망"],
            &[EventTag::Spouse, EventTag::Bereavement],
        );
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(result.ok);
        assert!(matches!(
            result.trace,
            Some(ExtractTrace::TableRow { evidence_index: 1, .. })
        ));
    }

    #[test]
    fn test_unparsable_table_falls_back() {
        let evidence = vec![Evidence::table("a.docx", "<div>표가 깨졌습니다</div>")];
        let q = query("경조휴가 며칠", QuestionKind::Days, &["경조휴가"], &[EventTag::Family]);
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(!result.ok);
        assert_eq!(result.answer, FALLBACK_ANSWER);
        assert!(result.trace.is_none());
    }

    #[test]
    fn test_weak_row_match_falls_back() {
        let evidence = vec![Evidence::table("a.docx", LEAVE_TABLE)];
        let q = query("포상휴가 며칠", QuestionKind::Days, &["포상휴가"], &[]);
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(!result.ok);
        assert_eq!(result.answer, FALLBACK_ANSWER);
    }

    #[test]
    fn test_unknown_kind_never_reads_tables() {
        let evidence = vec![Evidence::table("a.docx", LEAVE_TABLE)];
        let q = query("경조휴가", QuestionKind::Unknown, &["경조휴가"], &[EventTag::Family]);
        let result = extract(&q, &evidence, &ExtractConfig::default());
        assert!(!result.ok);
        assert_eq!(result.kind, QuestionKind::Unknown);
    }
}
