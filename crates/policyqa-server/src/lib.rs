//! PolicyQA server: HTTP API and CLI over the answering pipeline.

pub mod routes;
pub mod state;
pub mod validate;

pub use routes::build_router;
pub use state::AppState;
