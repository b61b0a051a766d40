//! Row scoring, best-row selection and day/period value extraction.

use once_cell::sync::Lazy;
use policyqa_core::ExtractConfig;
use regex::Regex;

use crate::text::normalize_compact;
use crate::types::EventTag;

static DEATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"사망|별세|조의|장례|조문|부고").unwrap());
static CHILDBIRTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"출산|분만").unwrap());
static DAY_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(일|시간)").unwrap());
static BARE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// A body row with its match score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow<'a> {
    /// Position within the body rows passed to [`pick_best_row`].
    pub index: usize,
    pub cells: &'a [String],
    pub score: i64,
}

/// Score a row against the question's tokens and event tags.
pub fn score_row(row: &[String], tokens: &[String], tags: &[EventTag], cfg: &ExtractConfig) -> i64 {
    let flat = normalize_compact(&row.join(" "));
    let mut score = 0;

    for tag in tags {
        if flat.contains(&normalize_compact(tag.keyword())) {
            score += cfg.event_tag_bonus;
        }
    }

    for token in tokens {
        let token = normalize_compact(token);
        if !token.is_empty() && flat.contains(&token) {
            score += cfg.token_bonus;
        }
    }

    if tags.contains(&EventTag::Bereavement) && DEATH_RE.is_match(&flat) {
        score += cfg.bereavement_bonus;
    }
    if tags.contains(&EventTag::Spouse)
        && tags.contains(&EventTag::Childbirth)
        && CHILDBIRTH_RE.is_match(&flat)
    {
        score += cfg.spouse_childbirth_bonus;
    }

    score
}

/// Arg-max over body rows (first wins on ties). Rows scoring below the
/// configured minimum are never returned.
pub fn pick_best_row<'a>(
    rows: &[&'a [String]],
    tokens: &[String],
    tags: &[EventTag],
    cfg: &ExtractConfig,
) -> Option<ScoredRow<'a>> {
    let mut best: Option<ScoredRow<'a>> = None;
    for (index, &cells) in rows.iter().enumerate() {
        let score = score_row(cells, tokens, tags, cfg);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(ScoredRow {
                index,
                cells,
                score,
            });
        }
    }
    best.filter(|b| b.score >= cfg.row_min_score)
}

/// Day/period value of a cell: every `<number>일` / `<number>시간` run joined
/// by spaces; a bare number is read as days.
pub fn extract_days_value(text: &str) -> Option<String> {
    let runs: Vec<String> = DAY_UNIT_RE
        .captures_iter(text)
        .map(|c| format!("{}{}", &c[1], &c[2]))
        .collect();
    if !runs.is_empty() {
        return Some(runs.join(" "));
    }
    BARE_NUMBER_RE
        .find(text)
        .map(|m| format!("{}일", m.as_str()))
}
