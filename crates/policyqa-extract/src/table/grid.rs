//! Table markup → rectangular grid of cell text.
//!
//! Tolerant by construction: rows and cells are located by their opening
//! tags only, so missing `</td>`/`</tr>` or stray attributes never fail the
//! parse. Merged cells are duplicated into every covered position.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::decode_markup_text;

/// Rows of cell text. Every row has the same column count.
pub type Grid = Vec<Vec<String>>;

/// Upper bound for a single span attribute.
const MAX_SPAN: usize = 64;

static ROW_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<tr\b[^>]*>").unwrap());
static CELL_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<t[dh]\b([^>]*)>").unwrap());
static CELL_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</t[dh]\s*>|</tr\s*>").unwrap());
static TABLE_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</table\s*>").unwrap());
static COLSPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bcolspan\s*=\s*["']?\s*(\d+)"#).unwrap());
static ROWSPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\browspan\s*=\s*["']?\s*(\d+)"#).unwrap());

struct RawCell {
    text: String,
    colspan: usize,
    rowspan: usize,
}

/// Text a spanning cell still owes to a future row.
struct PendingFill {
    text: String,
    /// Rows still covered, including the row this entry is keyed on.
    remaining: usize,
}

/// Sparse `(row, column) → fill` map, cleared entry by entry as rows consume it.
type PendingFills = HashMap<(usize, usize), PendingFill>;

/// Parse table markup into a grid. Returns an empty grid when no row is found.
pub fn parse_grid(table_html: &str) -> Grid {
    let mut pending: PendingFills = HashMap::new();
    let mut grid: Grid = Vec::new();

    for (r, body) in split_rows(table_html).into_iter().enumerate() {
        let mut row: Vec<String> = Vec::new();
        let mut col = 0usize;

        drain_at_cursor(&mut pending, r, &mut row, &mut col);
        for cell in split_cells(body) {
            drain_at_cursor(&mut pending, r, &mut row, &mut col);
            for c in col..col + cell.colspan {
                // A literal cell overrides a span reaching into the same position.
                pending.remove(&(r, c));
                put(&mut row, c, cell.text.clone());
                if cell.rowspan > 1 {
                    pending.insert(
                        (r + 1, c),
                        PendingFill {
                            text: cell.text.clone(),
                            remaining: cell.rowspan - 1,
                        },
                    );
                }
            }
            col += cell.colspan;
            drain_at_cursor(&mut pending, r, &mut row, &mut col);
        }

        // Fills past the last literal cell.
        let mut trailing: Vec<usize> = pending
            .keys()
            .filter(|(pr, pc)| *pr == r && *pc >= col)
            .map(|(_, pc)| *pc)
            .collect();
        trailing.sort_unstable();
        for c in trailing {
            if let Some(text) = take_fill(&mut pending, r, c) {
                put(&mut row, c, text);
            }
        }
        pending.retain(|(pr, _), _| *pr > r);

        grid.push(row);
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    grid.into_iter()
        .map(|mut row| {
            row.resize(width, String::new());
            row
        })
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect()
}

/// Consume fills at the cursor until a position without one is reached.
fn drain_at_cursor(pending: &mut PendingFills, r: usize, row: &mut Vec<String>, col: &mut usize) {
    while let Some(text) = take_fill(pending, r, *col) {
        put(row, *col, text);
        *col += 1;
    }
}

/// Remove the fill at `(r, c)`, re-registering it one row down if it spans further.
fn take_fill(pending: &mut PendingFills, r: usize, c: usize) -> Option<String> {
    let fill = pending.remove(&(r, c))?;
    if fill.remaining > 1 {
        pending.insert(
            (r + 1, c),
            PendingFill {
                text: fill.text.clone(),
                remaining: fill.remaining - 1,
            },
        );
    }
    Some(fill.text)
}

fn put(row: &mut Vec<String>, c: usize, text: String) {
    if row.len() <= c {
        row.resize(c + 1, String::new());
    }
    row[c] = text;
}

/// Row bodies: from each `<tr>` to the next one (or `</table>`, or the end).
fn split_rows(html: &str) -> Vec<&str> {
    let opens: Vec<regex::Match<'_>> = ROW_OPEN_RE.find_iter(html).collect();
    opens
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let end = opens.get(i + 1).map(|n| n.start()).unwrap_or(html.len());
            let body = &html[m.end()..end];
            match TABLE_CLOSE_RE.find(body) {
                Some(close) => &body[..close.start()],
                None => body,
            }
        })
        .collect()
}

fn split_cells(row_body: &str) -> Vec<RawCell> {
    let opens: Vec<regex::Captures<'_>> = CELL_OPEN_RE.captures_iter(row_body).collect();
    let mut cells = Vec::with_capacity(opens.len());

    for (i, caps) in opens.iter().enumerate() {
        let Some(tag) = caps.get(0) else { continue };
        let end = opens
            .get(i + 1)
            .and_then(|n| n.get(0))
            .map(|n| n.start())
            .unwrap_or(row_body.len());
        let mut inner = &row_body[tag.end()..end];
        if let Some(close) = CELL_CLOSE_RE.find(inner) {
            inner = &inner[..close.start()];
        }

        let attrs = caps.get(1).map_or("", |m| m.as_str());
        cells.push(RawCell {
            text: decode_markup_text(inner),
            colspan: span_attr(&COLSPAN_RE, attrs),
            rowspan: span_attr(&ROWSPAN_RE, attrs),
        });
    }
    cells
}

fn span_attr(re: &Regex, attrs: &str) -> usize {
    re.captures(attrs)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .map(|n| n.clamp(1, MAX_SPAN))
        .unwrap_or(1)
}
