//! Candidate retrieval: full-text first, pattern search when that is empty.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use policyqa_core::{Result, RetrievalConfig};
use policyqa_store::{escape_like, Block, BlockField, BlockStore};
use regex::Regex;
use tracing::debug;

use crate::query::QueryPlan;

static SEARCH_SYNTAX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]").unwrap());

/// Strip characters with meaning in the full-text query syntax.
pub fn sanitize_full_text_query(question: &str) -> String {
    SEARCH_SYNTAX_RE
        .replace_all(question, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Retrieve candidate blocks for a question. Store errors propagate; only an
/// empty full-text result triggers the pattern fallback.
pub async fn retrieve_candidates<S: BlockStore>(
    store: &S,
    plan: &QueryPlan,
    cfg: &RetrievalConfig,
) -> Result<Vec<Block>> {
    let query = sanitize_full_text_query(&plan.question);
    if !query.is_empty() {
        let hits = store.full_text_search(&query, cfg.full_text_limit).await?;
        if !hits.is_empty() {
            debug!(count = hits.len(), "full-text candidates");
            return Ok(hits);
        }
    }

    let mut patterns: Vec<&str> = Vec::new();
    for p in plan.terms.iter().chain(plan.expansions.iter()) {
        if !patterns.contains(&p.as_str()) {
            patterns.push(p);
        }
    }

    let mut seen: HashSet<i64> = HashSet::new();
    let mut out: Vec<Block> = Vec::new();
    for pattern in patterns {
        let escaped = escape_like(pattern);
        for field in [BlockField::Text, BlockField::TableHtml] {
            for block in store.pattern_search(&escaped, field, cfg.pattern_limit).await? {
                if seen.insert(block.id) {
                    out.push(block);
                }
            }
        }
    }

    debug!(count = out.len(), "pattern fallback candidates");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyqa_store::{NewBlock, SqliteStore};

    fn seeded() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        let doc = store.add_document("복리후생규정.docx").unwrap();
        store
            .add_block(doc, &NewBlock::paragraph(0, "제10조(경조휴가) 경조휴가는 다음과 같다."))
            .unwrap();
        store
            .add_block(doc, &NewBlock::paragraph(1, "연차 사용은 사전에 신청한다."))
            .unwrap();
        store
            .add_block(
                doc,
                &NewBlock::table(2, "<table><tr><td>연차</td><td>15일</td></tr></table>"),
            )
            .unwrap();
        (store, dir)
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_full_text_query("경조휴가 \"며칠\"이야?*"), "경조휴가 며칠 이야");
        assert_eq!(sanitize_full_text_query("?!"), "");
    }

    #[tokio::test]
    async fn test_full_text_hit_skips_fallback() {
        let (store, _dir) = seeded();
        let plan = QueryPlan::analyze("경조휴가 며칠이야?");
        let blocks = retrieve_candidates(&store, &plan, &RetrievalConfig::default())
            .await
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].index, 0);
    }

    #[tokio::test]
    async fn test_short_terms_use_pattern_fallback_deduplicated() {
        let (store, _dir) = seeded();
        // Two-character terms are below the trigram minimum.
        let plan = QueryPlan::analyze("연차 며칠");
        let blocks = retrieve_candidates(&store, &plan, &RetrievalConfig::default())
            .await
            .unwrap();
        let indexes: Vec<i64> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let (store, _dir) = seeded();
        let plan = QueryPlan::analyze("주차 요금");
        let blocks = retrieve_candidates(&store, &plan, &RetrievalConfig::default())
            .await
            .unwrap();
        assert!(blocks.is_empty());
    }
}
