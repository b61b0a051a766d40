//! Question answering routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use policyqa_core::Result;
use policyqa_resolve::{AnswerResponse, AskRequest};
use tracing::{error, info};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ask", post(ask))
        .route("/ask/summary", post(ask_summary))
}

/// POST /api/ask: literal answer with citation evidence.
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    let question = req.question.trim();
    if question.is_empty() {
        return question_required();
    }
    info!("ask: {}", question);
    respond(state.pipeline().answer(question).await)
}

/// POST /api/ask/summary: intent-framed summary of the same evidence.
async fn ask_summary(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    let question = req.question.trim();
    if question.is_empty() {
        return question_required();
    }
    info!("ask/summary: {}", question);
    respond(state.pipeline().summarize(question).await)
}

fn question_required() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "question is required" })),
    )
}

fn respond(result: Result<AnswerResponse>) -> (StatusCode, Json<serde_json::Value>) {
    match result {
        Ok(response) => (StatusCode::OK, Json(serde_json::json!(response))),
        Err(e) => {
            error!("Answer pipeline failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}
