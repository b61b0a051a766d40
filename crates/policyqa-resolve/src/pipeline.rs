//! The answering pipeline: analyze → retrieve → rank → window → extract.

use policyqa_core::{PipelineConfig, Result};
use policyqa_extract::{
    build_summary, extract, Evidence, ExtractTrace, FALLBACK_ANSWER, NOT_FOUND_SUMMARY,
};
use policyqa_store::BlockStore;
use tracing::{debug, info};

use crate::evidence::{select_display, to_evidence, UNKNOWN_FILENAME};
use crate::query::QueryPlan;
use crate::rank::{filter_by_anchors, pick_best_doc_id, refine_for_leave, Ranker};
use crate::retrieve::retrieve_candidates;
use crate::types::{AnswerMeta, AnswerResponse};
use crate::window::build_window;

/// Stage output shared by [`AnswerPipeline::answer`] and [`AnswerPipeline::summarize`].
struct Gathered {
    plan: QueryPlan,
    /// Best document id and filename, when any candidate was found.
    best: Option<(i64, String)>,
    /// Full evidence window.
    evidence: Vec<Evidence>,
}

/// Answers questions against a [`BlockStore`]. Holds no per-request state.
pub struct AnswerPipeline<'a, S> {
    store: &'a S,
    config: &'a PipelineConfig,
}

impl<'a, S: BlockStore> AnswerPipeline<'a, S> {
    pub fn new(store: &'a S, config: &'a PipelineConfig) -> Self {
        Self { store, config }
    }

    /// Literal answer plus citation evidence. Only store failures are errors.
    pub async fn answer(&self, question: &str) -> Result<AnswerResponse> {
        let gathered = self.gather(question).await?;
        if gathered.best.is_none() {
            return Ok(Self::respond(gathered, FALLBACK_ANSWER.to_string(), None, 0));
        }

        let result = extract(
            &gathered.plan.extract_query(),
            &gathered.evidence,
            &self.config.extract,
        );
        info!(
            kind = %result.kind,
            extracted = result.ok,
            evidence = gathered.evidence.len(),
            "answered question"
        );
        let cap = self.config.evidence.display_cap;
        Ok(Self::respond(gathered, result.answer, result.trace, cap))
    }

    /// Intent-framed summary of the evidence window.
    pub async fn summarize(&self, question: &str) -> Result<AnswerResponse> {
        let gathered = self.gather(question).await?;
        if gathered.best.is_none() {
            return Ok(Self::respond(gathered, NOT_FOUND_SUMMARY.to_string(), None, 0));
        }

        let display = select_display(&gathered.evidence, self.config.evidence.display_cap);
        let summary = build_summary(gathered.plan.intent.label(), &display);
        let cap = self.config.evidence.display_cap;
        Ok(Self::respond(gathered, summary, None, cap))
    }

    async fn gather(&self, question: &str) -> Result<Gathered> {
        let plan = QueryPlan::analyze(question);
        debug!(
            terms = ?plan.terms,
            anchors = ?plan.anchors,
            kind = %plan.kind,
            intent = plan.intent.label(),
            "analyzed question"
        );

        let candidates = retrieve_candidates(self.store, &plan, &self.config.retrieval).await?;
        if candidates.is_empty() {
            debug!("no candidates");
            return Ok(Gathered {
                plan,
                best: None,
                evidence: Vec::new(),
            });
        }

        let ranker = Ranker::new(&plan, &self.config.ranking);
        let candidates = filter_by_anchors(candidates, &plan.anchors);
        let candidates = refine_for_leave(candidates, &plan);
        let Some(doc_id) = pick_best_doc_id(&candidates, |b| ranker.score(b)) else {
            return Ok(Gathered {
                plan,
                best: None,
                evidence: Vec::new(),
            });
        };

        let filename = self
            .store
            .document_by_id(doc_id)
            .await?
            .map(|d| d.filename)
            .unwrap_or_else(|| UNKNOWN_FILENAME.to_string());
        debug!(doc_id, %filename, candidates = candidates.len(), "best document");

        let ranked = ranker.rank(&candidates);
        let blocks = build_window(
            self.store,
            &plan,
            doc_id,
            &ranked,
            &ranker,
            &self.config.window,
            &self.config.retrieval,
        )
        .await?;
        let evidence = to_evidence(&blocks, &filename);

        Ok(Gathered {
            plan,
            best: Some((doc_id, filename)),
            evidence,
        })
    }

    fn respond(
        gathered: Gathered,
        answer: String,
        trace: Option<ExtractTrace>,
        cap: usize,
    ) -> AnswerResponse {
        let (best_document_id, best_filename) = match gathered.best {
            Some((id, filename)) => (Some(id), Some(filename)),
            None => (None, None),
        };
        AnswerResponse {
            ok: true,
            answer,
            evidence: select_display(&gathered.evidence, cap),
            meta: AnswerMeta {
                intent: gathered.plan.intent.label().to_string(),
                kind: gathered.plan.kind,
                best_document_id,
                best_filename,
                trace,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::{ready, Future};

    use policyqa_core::Error;
    use policyqa_extract::QuestionKind;
    use policyqa_store::{Block, BlockField, Document, NewBlock, SqliteStore};

    const LEAVE_TABLE: &str = "<table>\
        <tr><th>구분</th><th>경조유형</th><th>대상</th><th>휴가일수</th><th>첨부서류</th><th>비고</th></tr>\
        <tr><td rowspan=\"2\">가족</td><td>배우자</td><td>사망</td><td>5일</td><td>사망진단서</td><td>-</td></tr>\
        <tr><td>본인</td><td>결혼</td><td>5일</td><td>청첩장</td><td>-</td></tr>\
        </table>";

    fn seeded() -> (SqliteStore, tempfile::TempDir, i64) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();

        let doc = store.add_document("복리후생규정.docx").unwrap();
        let blocks = [
            NewBlock::paragraph(0, "제1장 총칙"),
            NewBlock::paragraph(
                1,
                "제10조(경조휴가) 직원의 경조사 발생 시 다음과 같이 경조휴가를 부여한다.",
            ),
            NewBlock::table(2, LEAVE_TABLE),
            NewBlock::paragraph(3, "비고"),
            NewBlock::paragraph(
                4,
                "제11조(연차휴가) 1년간 80% 이상 출근한 직원에게 15일의 유급휴가를 준다.",
            ),
        ];
        for b in &blocks {
            store.add_block(doc, b).unwrap();
        }

        let other = store.add_document("여비규정.docx").unwrap();
        store
            .add_block(other, &NewBlock::paragraph(0, "출장 여비는 실비로 지급한다."))
            .unwrap();
        (store, dir, doc)
    }

    #[tokio::test]
    async fn test_bereavement_leave_days() {
        let (store, _dir, doc) = seeded();
        let config = PipelineConfig::default();
        let response = AnswerPipeline::new(&store, &config)
            .answer("경조휴가 며칠이야?")
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.meta.kind, QuestionKind::Days);
        assert_eq!(response.meta.intent, "경조사");
        assert_eq!(response.meta.best_document_id, Some(doc));
        assert_eq!(response.meta.best_filename.as_deref(), Some("복리후생규정.docx"));
        assert!(response.answer.contains("5일"));
        assert!(response.answer.contains("배우자 · 사망"));
        assert!(matches!(response.meta.trace, Some(ExtractTrace::TableRow { .. })));

        // The short caption after the table is not cited.
        assert_eq!(response.evidence.iter().filter(|e| e.is_table()).count(), 1);
        assert!(response
            .evidence
            .iter()
            .all(|e| e.paragraph_text() != Some("비고")));
        assert!(response.evidence.iter().all(|e| e.filename == "복리후생규정.docx"));
    }

    #[tokio::test]
    async fn test_no_candidates_is_a_successful_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        let config = PipelineConfig::default();
        let response = AnswerPipeline::new(&store, &config)
            .answer("경조휴가 며칠이야?")
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.answer, FALLBACK_ANSWER);
        assert!(response.evidence.is_empty());
        assert_eq!(response.meta.best_document_id, None);
        assert_eq!(response.meta.intent, "경조사");
    }

    #[tokio::test]
    async fn test_unextractable_evidence_still_ok() {
        let (store, _dir, _) = seeded();
        let config = PipelineConfig::default();
        let response = AnswerPipeline::new(&store, &config)
            .answer("출장 여비 지급")
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.answer, FALLBACK_ANSWER);
        assert_eq!(response.meta.best_filename.as_deref(), Some("여비규정.docx"));
        assert_eq!(response.evidence.len(), 1);
    }

    #[tokio::test]
    async fn test_summary() {
        let (store, _dir, _) = seeded();
        let config = PipelineConfig::default();
        let pipeline = AnswerPipeline::new(&store, &config);

        let response = pipeline.summarize("경조휴가 며칠이야?").await.unwrap();
        assert!(response.answer.starts_with("**[경조사]**\n제1장 총칙"));
        assert!(response.answer.ends_with("아래 표를 참고하세요."));

        let dir = tempfile::tempdir().unwrap();
        let empty = SqliteStore::open(dir.path()).unwrap();
        let response = AnswerPipeline::new(&empty, &config)
            .summarize("경조휴가")
            .await
            .unwrap();
        assert_eq!(response.answer, NOT_FOUND_SUMMARY);
    }

    /// A store whose every call fails.
    struct UnavailableStore;

    fn unavailable<T>() -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
    {
        ready(Err(Error::Storage("store unavailable".into())))
    }

    impl BlockStore for UnavailableStore {
        fn full_text_search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> impl Future<Output = Result<Vec<Block>>> + Send {
            unavailable()
        }

        fn pattern_search(
            &self,
            _pattern: &str,
            _field: BlockField,
            _limit: usize,
        ) -> impl Future<Output = Result<Vec<Block>>> + Send {
            unavailable()
        }

        fn blocks_in_range(
            &self,
            _doc_id: i64,
            _min_index: i64,
            _max_index: i64,
        ) -> impl Future<Output = Result<Vec<Block>>> + Send {
            unavailable()
        }

        fn blocks_matching(
            &self,
            _doc_id: i64,
            _substring: &str,
            _fields: &[BlockField],
            _limit: usize,
        ) -> impl Future<Output = Result<Vec<Block>>> + Send {
            unavailable()
        }

        fn document_by_id(&self, _id: i64) -> impl Future<Output = Result<Option<Document>>> + Send {
            unavailable()
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let config = PipelineConfig::default();
        let err = AnswerPipeline::new(&UnavailableStore, &config)
            .answer("경조휴가 며칠이야?")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
