//! Candidate scoring, anchor filtering and best-document selection.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use policyqa_core::RankingConfig;
use policyqa_store::Block;
use regex::Regex;
use serde::Serialize;

use crate::query::{is_filler_term, Intent, QueryPlan};

static DAY_COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\s*일").unwrap());
static MONEY_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d,]*\s*(?:만\s*)?원").unwrap());
static LEAVE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"휴가|연차|반차").unwrap());

/// A block with its transient ranking score. The block itself is untouched.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub block: Block,
    pub score: i64,
}

/// Scores blocks against one question.
pub struct Ranker<'a> {
    plan: &'a QueryPlan,
    cfg: &'a RankingConfig,
}

impl<'a> Ranker<'a> {
    pub fn new(plan: &'a QueryPlan, cfg: &'a RankingConfig) -> Self {
        Self { plan, cfg }
    }

    pub fn score(&self, block: &Block) -> i64 {
        let haystack = block.combined_text().to_lowercase();
        let mut score = 0;

        for term in &self.plan.terms {
            if !haystack.contains(term.as_str()) {
                continue;
            }
            if self.plan.anchors.contains(term) {
                let length_bonus = (term.chars().count() as i64
                    * self.cfg.anchor_length_bonus_per_char)
                    .min(self.cfg.anchor_length_bonus_cap);
                score += self.cfg.anchor_bonus + length_bonus;
            } else if is_filler_term(term) {
                score += self.cfg.filler_term_bonus;
            } else {
                score += self.cfg.term_bonus;
            }
        }

        if self.plan.day_question && DAY_COUNT_RE.is_match(&haystack) {
            score += self.cfg.day_pattern_bonus;
        }
        if self.plan.money_question && MONEY_AMOUNT_RE.is_match(&haystack) {
            score += self.cfg.money_pattern_bonus;
        }
        if block.is_table() {
            score += self.cfg.table_bonus;
        }
        score
    }

    /// Score every block, highest first. Equal scores keep input order.
    pub fn rank(&self, blocks: &[Block]) -> Vec<Candidate> {
        let mut ranked: Vec<Candidate> = blocks
            .iter()
            .map(|b| Candidate {
                block: b.clone(),
                score: self.score(b),
            })
            .collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }
}

/// Blocks containing at least one anchor, or the input when none do.
pub fn filter_by_anchors(blocks: Vec<Block>, anchors: &[String]) -> Vec<Block> {
    if anchors.is_empty() {
        return blocks;
    }
    let kept: Vec<Block> = blocks
        .iter()
        .filter(|b| {
            let text = b.combined_text().to_lowercase();
            anchors.iter().any(|a| text.contains(a.as_str()))
        })
        .cloned()
        .collect();
    if kept.is_empty() {
        blocks
    } else {
        kept
    }
}

/// For leave questions, narrow to leave-related blocks when any exist.
pub fn refine_for_leave(blocks: Vec<Block>, plan: &QueryPlan) -> Vec<Block> {
    let applies = plan.intent == Intent::Leave || plan.question.contains("휴가");
    if !applies {
        return blocks;
    }
    let kept: Vec<Block> = blocks
        .iter()
        .filter(|b| LEAVE_BLOCK_RE.is_match(&b.combined_text()))
        .cloned()
        .collect();
    if kept.is_empty() {
        blocks
    } else {
        kept
    }
}

/// Document with the highest summed score. Ties go to the document seen first.
pub fn pick_best_doc_id(blocks: &[Block], score: impl Fn(&Block) -> i64) -> Option<i64> {
    let mut order: Vec<i64> = Vec::new();
    let mut totals: HashMap<i64, i64> = HashMap::new();
    for block in blocks {
        if !totals.contains_key(&block.doc_id) {
            order.push(block.doc_id);
        }
        *totals.entry(block.doc_id).or_insert(0) += score(block);
    }

    let mut best: Option<(i64, i64)> = None;
    for doc_id in order {
        let total = totals[&doc_id];
        if best.map_or(true, |(_, t)| total > t) {
            best = Some((doc_id, total));
        }
    }
    best.map(|(doc_id, _)| doc_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyqa_store::BlockKind;

    fn paragraph(id: i64, doc_id: i64, text: &str) -> Block {
        Block {
            id,
            doc_id,
            index: id,
            kind: BlockKind::Paragraph,
            text: Some(text.to_string()),
            table_html: None,
        }
    }

    fn table(id: i64, doc_id: i64, html: &str) -> Block {
        Block {
            id,
            doc_id,
            index: id,
            kind: BlockKind::Table,
            text: None,
            table_html: Some(html.to_string()),
        }
    }

    #[test]
    fn test_score_components() {
        let plan = QueryPlan::analyze("경조휴가 신청 며칠");
        assert_eq!(plan.anchors, vec!["경조휴가".to_string()]);
        let cfg = RankingConfig::default();
        let ranker = Ranker::new(&plan, &cfg);

        // Anchor: 30 + min(4 * 2, 10); filler "신청": 2; day pattern: 8.
        let b = paragraph(1, 1, "경조휴가 신청은 5일 전까지 한다.");
        assert_eq!(ranker.score(&b), 30 + 8 + 2 + 8);

        // Table bonus only.
        let t = table(2, 1, "<table><tr><td>구분</td></tr></table>");
        assert_eq!(ranker.score(&t), 3);
    }

    #[test]
    fn test_money_bonus() {
        let plan = QueryPlan::analyze("야근 수당 얼마");
        let cfg = RankingConfig::default();
        let ranker = Ranker::new(&plan, &cfg);
        let b = paragraph(1, 1, "시간당 15,000원을 지급한다.");
        assert_eq!(ranker.score(&b), 8);
    }

    #[test]
    fn test_rank_orders_by_score() {
        let plan = QueryPlan::analyze("경조휴가");
        let cfg = RankingConfig::default();
        let ranker = Ranker::new(&plan, &cfg);
        let blocks = vec![paragraph(1, 1, "무관"), paragraph(2, 1, "경조휴가")];
        let ranked = ranker.rank(&blocks);
        assert_eq!(ranked[0].block.id, 2);
        assert_eq!(ranked[1].score, 0);
    }

    #[test]
    fn test_filter_by_anchors_never_empties() {
        let blocks = vec![paragraph(1, 1, "연차휴가"), paragraph(2, 1, "출장")];
        let anchors = vec!["연차".to_string()];
        assert_eq!(filter_by_anchors(blocks.clone(), &anchors).len(), 1);

        let none = vec!["포상".to_string()];
        assert_eq!(filter_by_anchors(blocks.clone(), &none), blocks);
        assert!(filter_by_anchors(Vec::new(), &none).is_empty());
    }

    #[test]
    fn test_leave_refinement() {
        let blocks = vec![paragraph(1, 1, "출장 여비"), paragraph(2, 2, "연차 사용")];
        let leave = QueryPlan::analyze("연차 며칠");
        assert_eq!(refine_for_leave(blocks.clone(), &leave).len(), 1);

        let other = QueryPlan::analyze("출장 여비");
        assert_eq!(refine_for_leave(blocks.clone(), &other).len(), 2);

        let unmatched = vec![paragraph(3, 1, "출장 여비")];
        assert_eq!(refine_for_leave(unmatched, &leave).len(), 1);
    }

    #[test]
    fn test_pick_best_doc_sums_and_breaks_ties_by_order() {
        let blocks = vec![
            paragraph(1, 7, "a"),
            paragraph(2, 3, "b"),
            paragraph(3, 3, "b"),
            paragraph(4, 7, "c"),
        ];
        let score = |b: &Block| if b.text.as_deref() == Some("b") { 2 } else { 1 };
        assert_eq!(pick_best_doc_id(&blocks, score), Some(3));

        // 3 vs 3: document 7 was seen first.
        let tie = vec![
            paragraph(1, 7, "a"),
            paragraph(2, 3, "b"),
            paragraph(3, 3, "a"),
            paragraph(4, 7, "b"),
        ];
        let score = |b: &Block| if b.text.as_deref() == Some("b") { 2 } else { 1 };
        assert_eq!(pick_best_doc_id(&tie, score), Some(7));
        assert_eq!(pick_best_doc_id(&[], |_| 1), None);
    }
}
