//! Context windowing: choose a contiguous block range of the best document.

use once_cell::sync::Lazy;
use policyqa_core::{Result, RetrievalConfig, WindowConfig};
use policyqa_store::{Block, BlockField, BlockStore};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::query::QueryPlan;
use crate::rank::{Candidate, Ranker};

/// Substring every day-count block carries; narrows the store fetch.
const DAY_UNIT: &str = "일";

static DAY_COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\s*일").unwrap());
static DAY_VOCABULARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"사망|조의|장례|배우자|부모|자녀|결혼|출산|경조").unwrap());

/// Inclusive block-index range within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub min_index: i64,
    pub max_index: i64,
}

impl Window {
    fn around(low: i64, high: i64, before: i64, after: i64) -> Self {
        let min_index = (low - before).max(0);
        Self {
            min_index,
            max_index: (high + after).max(min_index),
        }
    }
}

/// Span of the top-ranked blocks of `doc_id`, padded on both sides.
pub fn default_window(ranked: &[Candidate], doc_id: i64, cfg: &WindowConfig) -> Option<Window> {
    let indexes: Vec<i64> = ranked
        .iter()
        .filter(|c| c.block.doc_id == doc_id)
        .take(cfg.top_k)
        .map(|c| c.block.index)
        .collect();
    let low = *indexes.iter().min()?;
    let high = *indexes.iter().max()?;
    Some(Window::around(low, high, cfg.before, cfg.after))
}

/// Index of the best day-count block, if any block states a day count.
pub fn day_pivot(blocks: &[Block], ranker: &Ranker<'_>, cfg: &WindowConfig) -> Option<i64> {
    let mut best: Option<(i64, i64)> = None;
    for block in blocks {
        let text = block.combined_text();
        if !DAY_COUNT_RE.is_match(&text) {
            continue;
        }
        let mut score = ranker.score(block);
        if DAY_VOCABULARY_RE.is_match(&text) {
            score += cfg.day_vocabulary_bonus;
        }
        if block.is_table() {
            score += cfg.day_table_bonus;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((block.index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// Drop caption and footer fragments: after each table, up to `max_suppressed`
/// consecutive short paragraphs are skipped. A longer paragraph ends the run.
pub fn suppress_table_fragments(blocks: Vec<Block>, cfg: &WindowConfig) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    let mut suppressing = false;
    let mut suppressed = 0usize;

    for block in blocks {
        if block.is_table() {
            suppressing = true;
            suppressed = 0;
            out.push(block);
            continue;
        }
        if suppressing {
            let short = block.text_or_empty().trim().chars().count() <= cfg.short_paragraph_len;
            if short && suppressed < cfg.max_suppressed {
                suppressed += 1;
                continue;
            }
            suppressing = false;
        }
        out.push(block);
    }
    out
}

/// Fetch the evidence window of `doc_id`, ordered by index.
pub async fn build_window<S: BlockStore>(
    store: &S,
    plan: &QueryPlan,
    doc_id: i64,
    ranked: &[Candidate],
    ranker: &Ranker<'_>,
    cfg: &WindowConfig,
    retrieval: &RetrievalConfig,
) -> Result<Vec<Block>> {
    let mut window = None;

    if plan.day_question {
        let day_blocks = store
            .blocks_matching(
                doc_id,
                DAY_UNIT,
                &[BlockField::Text, BlockField::TableHtml],
                retrieval.day_candidate_limit,
            )
            .await?;
        if let Some(pivot) = day_pivot(&day_blocks, ranker, cfg) {
            debug!(pivot, "day-count pivot");
            window = Some(Window::around(pivot, pivot, cfg.day_pivot_before, cfg.day_pivot_after));
        }
    }

    let Some(window) = window.or_else(|| default_window(ranked, doc_id, cfg)) else {
        return Ok(Vec::new());
    };
    debug!(doc_id, min = window.min_index, max = window.max_index, "evidence window");

    let blocks = store
        .blocks_in_range(doc_id, window.min_index, window.max_index)
        .await?;
    Ok(suppress_table_fragments(blocks, cfg))
}
