//! Window blocks → citation evidence, and the capped display subset.

use std::collections::HashSet;

use policyqa_extract::text::{decode_markup_text, normalize_compact};
use policyqa_extract::Evidence;
use policyqa_store::Block;

/// Filename used when the owning document cannot be found.
pub const UNKNOWN_FILENAME: &str = "unknown";

/// One evidence item per non-empty block, in window order.
pub fn to_evidence(blocks: &[Block], filename: &str) -> Vec<Evidence> {
    blocks
        .iter()
        .filter_map(|block| match (&block.table_html, &block.text) {
            (Some(html), _) if block.is_table() && !html.trim().is_empty() => {
                Some(Evidence::table(filename, html.clone()))
            }
            (_, Some(text)) if !text.trim().is_empty() => {
                Some(Evidence::paragraph(filename, text.clone()))
            }
            _ => None,
        })
        .collect()
}

fn dedupe_key(item: &Evidence) -> String {
    match (item.paragraph_text(), item.table_html()) {
        (Some(text), _) => normalize_compact(text),
        (_, Some(html)) => normalize_compact(&decode_markup_text(html)),
        _ => String::new(),
    }
}

/// At most `cap` items deduplicated by normalized text: the first table keeps
/// a reserved slot, paragraphs fill the rest. Window order is preserved.
pub fn select_display(evidence: &[Evidence], cap: usize) -> Vec<Evidence> {
    let mut seen: HashSet<String> = HashSet::new();
    let unique: Vec<(usize, &Evidence)> = evidence
        .iter()
        .enumerate()
        .filter(|(_, item)| seen.insert(dedupe_key(item)))
        .collect();

    let table = unique.iter().find(|(_, item)| item.is_table()).map(|(i, _)| *i);
    let paragraph_slots = cap.saturating_sub(usize::from(table.is_some() && cap > 0));

    let mut chosen: Vec<usize> = unique
        .iter()
        .filter(|(_, item)| !item.is_table())
        .take(paragraph_slots)
        .map(|(i, _)| *i)
        .collect();
    if cap > 0 {
        chosen.extend(table);
    }
    chosen.sort_unstable();
    chosen.into_iter().map(|i| evidence[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyqa_store::BlockKind;

    #[test]
    fn test_to_evidence_maps_kinds_and_skips_empty() {
        let blocks = vec![
            Block {
                id: 1,
                doc_id: 1,
                index: 0,
                kind: BlockKind::Paragraph,
                text: Some("본문".into()),
                table_html: None,
            },
            Block {
                id: 2,
                doc_id: 1,
                index: 1,
                kind: BlockKind::Table,
                text: Some("표 텍스트".into()),
                table_html: Some("<table></table>".into()),
            },
            Block {
                id: 3,
                doc_id: 1,
                index: 2,
                kind: BlockKind::Paragraph,
                text: Some("  ".into()),
                table_html: None,
            },
        ];
        let evidence = to_evidence(&blocks, "a.docx");
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0], Evidence::paragraph("a.docx", "본문"));
        assert_eq!(evidence[1], Evidence::table("a.docx", "<table></table>"));
    }

    #[test]
    fn test_display_dedupes_and_keeps_one_table() {
        let evidence = vec![
            Evidence::paragraph("a", "제1조 목적"),
            Evidence::paragraph("a", "제1조  목적."),
            Evidence::table("a", "<table><tr><td>1</td></tr></table>"),
            Evidence::paragraph("a", "제2조 정의"),
            Evidence::table("a", "<table><tr><td>2</td></tr></table>"),
        ];
        let shown = select_display(&evidence, 12);
        assert_eq!(shown.len(), 3);
        assert_eq!(shown[0].paragraph_text(), Some("제1조 목적"));
        assert!(shown[1].is_table());
        assert_eq!(shown[2].paragraph_text(), Some("제2조 정의"));
    }

    #[test]
    fn test_display_cap_reserves_table_slot() {
        let mut evidence: Vec<Evidence> = (0..20)
            .map(|i| Evidence::paragraph("a", format!("조항 {}", i)))
            .collect();
        evidence.push(Evidence::table("a", "<table><tr><td>x</td></tr></table>"));

        let shown = select_display(&evidence, 12);
        assert_eq!(shown.len(), 12);
        assert_eq!(shown.iter().filter(|e| e.is_table()).count(), 1);
        assert!(shown[11].is_table());
        assert_eq!(shown[10].paragraph_text(), Some("조항 10"));
    }
}
