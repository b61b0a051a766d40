//! Table reconstruction and row selection.
//!
//! Pipeline per table block: markup → [`parse_grid`] → [`find_header_row`]
//! → [`build_column_map`] → [`body_rows`] → [`pick_best_row`].

pub mod grid;
pub mod header;
pub mod rows;

pub use grid::{parse_grid, Grid};
pub use header::{body_rows, build_column_map, find_header_row, ColumnMap, HeaderRow, Role};
pub use rows::{extract_days_value, pick_best_row, score_row, ScoredRow};
