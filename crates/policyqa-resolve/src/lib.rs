//! PolicyQA Resolve: question analysis, retrieval, ranking and windowing.
//!
//! [`AnswerPipeline`] runs the stages in order against any [`BlockStore`]
//! and hands the evidence window to `policyqa-extract` for the answer.
//!
//! [`BlockStore`]: policyqa_store::BlockStore

pub mod evidence;
pub mod pipeline;
pub mod query;
pub mod rank;
pub mod retrieve;
pub mod types;
pub mod window;

pub use pipeline::AnswerPipeline;
pub use query::{Intent, QueryPlan};
pub use types::*;
