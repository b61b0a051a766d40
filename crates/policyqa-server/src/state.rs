//! Shared application state.

use policyqa_core::PolicyQaConfig;
use policyqa_resolve::AnswerPipeline;
use policyqa_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: PolicyQaConfig,
    pub store: SqliteStore,
}

impl AppState {
    pub fn new(config: PolicyQaConfig, store: SqliteStore) -> Self {
        Self { config, store }
    }

    /// Pipeline over the shared store. Cheap to build per request.
    pub fn pipeline(&self) -> AnswerPipeline<'_, SqliteStore> {
        AnswerPipeline::new(&self.store, &self.config.pipeline)
    }
}
