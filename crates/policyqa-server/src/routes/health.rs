//! Health and store statistics.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use policyqa_store::StoreStats;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// GET /api/health: liveness plus store statistics.
async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.store.get_stats().unwrap_or_else(|_| StoreStats {
        total_documents: 0,
        total_blocks: 0,
        table_blocks: 0,
        db_path: String::new(),
        db_size_mb: 0.0,
    });

    Json(serde_json::json!({
        "status": "ok",
        "service": "policyqa",
        "version": env!("CARGO_PKG_VERSION"),
        "documents": stats.total_documents,
        "blocks": stats.total_blocks,
        "tables": stats.table_blocks,
        "dbSizeMb": stats.db_size_mb,
    }))
}
