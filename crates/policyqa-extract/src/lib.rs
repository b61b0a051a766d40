//! PolicyQA Extract: turns evidence into a literal, templated answer.
//!
//! Tables are rebuilt into rectangular grids (merged cells forward-filled),
//! their header row and column roles are detected heuristically, and the
//! best-matching row is rendered as markdown. No generative model involved.

pub mod answer;
pub mod summary;
pub mod table;
pub mod text;
pub mod types;

pub use answer::{extract, FALLBACK_ANSWER};
pub use summary::{build_summary, NOT_FOUND_SUMMARY};
pub use table::{
    body_rows, build_column_map, extract_days_value, find_header_row, parse_grid,
    pick_best_row, score_row, ColumnMap, Grid, HeaderRow, Role, ScoredRow,
};
pub use types::*;
