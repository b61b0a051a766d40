//! Request and response types of the answering pipeline.

use policyqa_extract::{Evidence, ExtractTrace, QuestionKind};
use serde::{Deserialize, Serialize};

/// A question from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

/// Classification and provenance of an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerMeta {
    /// Intent label.
    pub intent: String,
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_document_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<ExtractTrace>,
}

/// Response envelope. `ok` is true whenever the pipeline ran, including
/// when no answer was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub ok: bool,
    pub answer: String,
    pub evidence: Vec<Evidence>,
    pub meta: AnswerMeta,
}
