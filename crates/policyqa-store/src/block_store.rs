//! The read interface the question-answering pipeline needs from storage.

use std::future::Future;

use policyqa_core::Result;

use crate::types::{Block, BlockField, Document};

/// Read-only access to stored blocks.
///
/// Every method may fail with a store error; callers propagate it unchanged.
/// Timeout and retry policy belong to the implementation.
pub trait BlockStore: Send + Sync {
    /// Full-text search over text and table markup, best relevance first.
    /// `query` must already be stripped of search-syntax characters.
    fn full_text_search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Block>>> + Send;

    /// Substring match over one field. `pattern` must be LIKE-escaped
    /// (see [`escape_like`]).
    fn pattern_search(
        &self,
        pattern: &str,
        field: BlockField,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Block>>> + Send;

    /// All blocks of a document with `min_index <= index <= max_index`,
    /// ordered by index ascending.
    fn blocks_in_range(
        &self,
        doc_id: i64,
        min_index: i64,
        max_index: i64,
    ) -> impl Future<Output = Result<Vec<Block>>> + Send;

    /// Blocks of a document where any of `fields` contains `substring`,
    /// ordered by index ascending.
    fn blocks_matching(
        &self,
        doc_id: i64,
        substring: &str,
        fields: &[BlockField],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Block>>> + Send;

    fn document_by_id(&self, id: i64) -> impl Future<Output = Result<Option<Document>>> + Send;
}

/// Escape LIKE wildcards so `s` matches literally under `ESCAPE '\'`.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(escape_like("경조휴가"), "경조휴가");
    }
}
