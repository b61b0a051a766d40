//! Configuration, data directory management and pipeline tuning constants.
//!
//! The scoring thresholds and bonus magnitudes were chosen empirically. They
//! are kept as configurable values (all defaulted) so a deployment can tune
//! them through `pipeline.json` without touching the heuristics.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Paths to all PolicyQA data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
    /// Pipeline tuning file (`data/pipeline.json`).
    pub pipeline_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            pipeline_file: root.join("pipeline.json"),
            root,
        };
        std::fs::create_dir_all(&paths.db)?;
        Ok(paths)
    }
}

/// Top-level PolicyQA configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyQaConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Retrieval, ranking and extraction constants.
    pub pipeline: PipelineConfig,
}

impl PolicyQaConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3010);

        let data_paths = DataPaths::new(data_dir)?;
        let pipeline = PipelineConfig::load(&data_paths.pipeline_file)?;

        Ok(Self {
            port,
            data_paths,
            pipeline,
        })
    }
}

/// All tunable constants of the question-answering pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub retrieval: RetrievalConfig,
    pub ranking: RankingConfig,
    pub window: WindowConfig,
    pub extract: ExtractConfig,
    pub evidence: EvidenceConfig,
}

impl PipelineConfig {
    /// Load from a JSON file. A missing file yields the defaults; a file that
    /// exists but does not parse is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: PipelineConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        if config != Self::default() {
            info!("Loaded pipeline overrides from {}", path.display());
        }
        if config.extract.row_min_score <= 0 {
            warn!("extract.row_min_score <= 0 accepts every row as an answer");
        }
        Ok(config)
    }
}

/// Candidate fetch limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub full_text_limit: usize,
    pub pattern_limit: usize,
    pub day_candidate_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            full_text_limit: 80,
            pattern_limit: 120,
            day_candidate_limit: 300,
        }
    }
}

/// Candidate-block scoring bonuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub anchor_bonus: i64,
    pub anchor_length_bonus_per_char: i64,
    pub anchor_length_bonus_cap: i64,
    pub term_bonus: i64,
    pub filler_term_bonus: i64,
    pub day_pattern_bonus: i64,
    pub money_pattern_bonus: i64,
    pub table_bonus: i64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            anchor_bonus: 30,
            anchor_length_bonus_per_char: 2,
            anchor_length_bonus_cap: 10,
            term_bonus: 5,
            filler_term_bonus: 2,
            day_pattern_bonus: 8,
            money_pattern_bonus: 8,
            table_bonus: 3,
        }
    }
}

/// Context window geometry and cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub top_k: usize,
    pub before: i64,
    pub after: i64,
    pub day_pivot_before: i64,
    pub day_pivot_after: i64,
    pub day_vocabulary_bonus: i64,
    pub day_table_bonus: i64,
    pub short_paragraph_len: usize,
    pub max_suppressed: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            before: 2,
            after: 3,
            day_pivot_before: 3,
            day_pivot_after: 6,
            day_vocabulary_bonus: 10,
            day_table_bonus: 5,
            short_paragraph_len: 20,
            max_suppressed: 12,
        }
    }
}

/// Table header detection and row selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub header_scan_rows: usize,
    pub header_min_score: i64,
    pub header_keyword_weight: i64,
    pub short_cell_max_len: usize,
    pub short_cell_bonus_cap: i64,
    pub row_min_score: i64,
    pub event_tag_bonus: i64,
    pub token_bonus: i64,
    pub bereavement_bonus: i64,
    pub spouse_childbirth_bonus: i64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: 8,
            header_min_score: 3,
            header_keyword_weight: 2,
            short_cell_max_len: 6,
            short_cell_bonus_cap: 3,
            row_min_score: 6,
            event_tag_bonus: 15,
            token_bonus: 3,
            bereavement_bonus: 10,
            spouse_childbirth_bonus: 10,
        }
    }
}

/// Externally displayed evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    pub display_cap: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self { display_cap: 12 }
    }
}
