//! PolicyQA Core: error types, configuration and pipeline tuning constants.

pub mod config;
pub mod error;

pub use config::{
    DataPaths, EvidenceConfig, ExtractConfig, PipelineConfig, PolicyQaConfig, RankingConfig,
    RetrievalConfig, WindowConfig,
};
pub use error::{Error, Result};
