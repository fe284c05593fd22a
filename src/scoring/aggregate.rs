use serde::Serialize;

use super::parser::{parse_score, ParseResult};
use super::types::{ScoreType, TiebreakScheme, WorkoutScheme};

/// Collapse round values (in round order) into one representative value.
///
/// Returns `None` for an empty slice: "no aggregate" is not the same thing as
/// a genuine zero. Averages are not rounded here.
pub fn aggregate(values: &[f64], score_type: ScoreType) -> Option<f64> {
    let first = *values.first()?;
    let last = *values.last()?;

    let value = match score_type {
        ScoreType::Min => values.iter().copied().fold(first, f64::min),
        ScoreType::Max => values.iter().copied().fold(first, f64::max),
        ScoreType::Sum => values.iter().sum(),
        ScoreType::Average => values.iter().sum::<f64>() / values.len() as f64,
        ScoreType::First => first,
        ScoreType::Last => last,
    };
    Some(value)
}

/// Parsed rounds plus the aggregate of their valid values.
#[derive(Debug, Clone, Serialize)]
pub struct RoundsResult {
    pub rounds: Vec<ParseResult>,
    pub aggregated: Option<f64>,
}

impl RoundsResult {
    /// Hard errors from individual rounds, labelled with their 1-based round number.
    pub fn errors(&self) -> Vec<String> {
        self.rounds
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.error.as_ref().map(|e| format!("round {}: {}", i + 1, e)))
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.rounds
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.warning.as_ref().map(|w| format!("round {}: {}", i + 1, w)))
            .collect()
    }
}

/// Parse every round of one athlete's entry, then aggregate once.
///
/// `raw_rounds` is the complete, caller-ordered list of round strings. Blank,
/// invalid and status-only rounds (DNS/DNF) are skipped for the aggregate but
/// kept in `rounds` so the caller can show them.
pub fn aggregate_rounds<S: AsRef<str>>(
    raw_rounds: &[S],
    scheme: WorkoutScheme,
    score_type: ScoreType,
    time_cap: Option<u32>,
    tiebreak_scheme: Option<TiebreakScheme>,
) -> RoundsResult {
    let rounds: Vec<ParseResult> = raw_rounds
        .iter()
        .map(|raw| parse_score(raw.as_ref(), scheme, time_cap, tiebreak_scheme))
        .collect();

    let values: Vec<f64> = rounds
        .iter()
        .filter(|r| r.is_value_bearing())
        .filter_map(|r| r.raw_value)
        .collect();

    RoundsResult {
        aggregated: aggregate(&values, score_type),
        rounds,
    }
}
