//! P-Score: performance-relative event points.
//!
//! First place earns 100 and the median anchor earns 50; everyone else is
//! placed linearly on that line, so a large margin of victory is rewarded
//! and events with different units can be summed.
//!
//! - ascending (time): `100 - (X - Best) * (50 / (Median - Best))`
//! - descending (reps, load, ...): `100 - (Best - X) * (50 / (Best - Median))`

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::rank::{competition_ranks, points_desc, split_ties};
use super::types::{ScoreEntry, ScoreStatus, SortDirection, WorkoutScheme};

/// Which part of the value-bearing field defines the 50-point anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MedianField {
    /// The worst performer inside the top half of the field
    #[default]
    TopHalf,
    /// Interpolated median of the whole field
    All,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PScoreConfig {
    #[serde(default = "default_allow_negatives")]
    pub allow_negatives: bool,
    #[serde(default)]
    pub median_field: MedianField,
}

fn default_allow_negatives() -> bool {
    true
}

impl Default for PScoreConfig {
    fn default() -> Self {
        Self {
            allow_negatives: true,
            median_field: MedianField::TopHalf,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PScoreResult {
    pub user_id: String,
    pub p_score: f64,
    pub rank: u32,
}

/// Ranking tier: a lower tier always places ahead of a higher one.
fn tier(status: ScoreStatus, scheme: WorkoutScheme) -> u8 {
    match status {
        ScoreStatus::Scored => 0,
        // Capped athletes finish behind every finisher in a capped workout
        ScoreStatus::Cap if scheme == WorkoutScheme::TimeWithCap => 1,
        ScoreStatus::Cap => 0,
        ScoreStatus::Dnf => 2,
        ScoreStatus::Dns | ScoreStatus::Withdrawn => 3,
    }
}

fn compare_values(a: f64, b: f64, direction: SortDirection) -> Ordering {
    let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// Best and median raw values of a field sorted best-first.
fn anchors(sorted: &[f64], median_field: MedianField) -> Option<(f64, f64)> {
    let best = *sorted.first()?;
    let median = match median_field {
        MedianField::TopHalf => {
            let top_half = sorted.len().div_ceil(2).max(1);
            sorted[top_half - 1]
        }
        MedianField::All => {
            let mut values = sorted.to_vec();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        }
    };
    Some((best, median))
}

fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // avoid a negative zero leaking into output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn p_score_for(value: f64, best: f64, median: f64, direction: SortDirection) -> f64 {
    if median == best {
        return 100.0;
    }
    match direction {
        SortDirection::Ascending => 100.0 - (value - best) * (50.0 / (median - best)),
        SortDirection::Descending => 100.0 - (best - value) * (50.0 / (best - median)),
    }
}

/// Normalize one event's field onto the P-Score scale.
///
/// Results come back ordered by rank. DNF entries score 0 and rank behind
/// every value-bearing entry; DNS and withdrawn entries score 0 and rank last.
/// Equal p-scores always share a rank. Within one, more capped reps and then
/// a better tie-break come first; otherwise input order is kept.
pub fn calculate_pscore(
    scores: &[ScoreEntry],
    scheme: WorkoutScheme,
    config: &PScoreConfig,
) -> Vec<PScoreResult> {
    if scores.is_empty() {
        return Vec::new();
    }

    let direction = scheme.sort_direction();

    let mut field: Vec<&ScoreEntry> = scores.iter().filter(|s| s.status.has_value()).collect();
    field.sort_by(|a, b| {
        tier(a.status, scheme)
            .cmp(&tier(b.status, scheme))
            .then_with(|| compare_values(a.value, b.value, direction))
    });
    let sorted_values: Vec<f64> = field.iter().map(|s| s.value).collect();
    let anchors = anchors(&sorted_values, config.median_field);

    log::debug!(
        "p-score field: {} value-bearing of {} entries, anchors {:?}",
        sorted_values.len(),
        scores.len(),
        anchors
    );

    let mut rows: Vec<(u8, f64, &ScoreEntry)> = scores
        .iter()
        .map(|entry| {
            let p_score = match anchors {
                Some((best, median)) if entry.status.has_value() => {
                    let raw = round2(p_score_for(entry.value, best, median, direction));
                    if config.allow_negatives {
                        raw
                    } else {
                        raw.max(0.0)
                    }
                }
                _ => 0.0,
            };
            (tier(entry.status, scheme), p_score, entry)
        })
        .collect();

    rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| points_desc(a.1, b.1)));
    // capped reps and tie-breaks order equal p-scores; the rank stays shared
    split_ties(&mut rows, |row| row.2, |a, b| a.0 == b.0 && a.1 == b.1);

    let ranks = competition_ranks(&rows, |a, b| a.0 == b.0 && a.1 == b.1);
    rows.into_iter()
        .zip(ranks)
        .map(|((_, p_score, entry), rank)| PScoreResult {
            user_id: entry.user_id.clone(),
            p_score,
            rank,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::TiebreakScheme;

    fn entries(values: &[f64]) -> Vec<ScoreEntry> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ScoreEntry::new(format!("{}", i + 1), *v, ScoreStatus::Scored))
            .collect()
    }

    fn config(allow_negatives: bool, median_field: MedianField) -> PScoreConfig {
        PScoreConfig {
            allow_negatives,
            median_field,
        }
    }

    fn find<'a>(results: &'a [PScoreResult], user_id: &str) -> &'a PScoreResult {
        results.iter().find(|r| r.user_id == user_id).unwrap()
    }

    #[test]
    fn test_timed_field_anchors_and_negative() {
        let scores = entries(&[300.0, 360.0, 420.0, 480.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());

        assert_eq!(find(&results, "1").p_score, 100.0);
        assert_eq!(find(&results, "1").rank, 1);
        assert_eq!(find(&results, "2").p_score, 50.0);
        assert_eq!(find(&results, "3").p_score, 0.0);
        assert_eq!(find(&results, "4").p_score, -50.0);
    }

    #[test]
    fn test_clamps_when_negatives_disallowed() {
        let scores = entries(&[300.0, 360.0, 420.0, 480.0]);
        let results = calculate_pscore(
            &scores,
            WorkoutScheme::Time,
            &config(false, MedianField::TopHalf),
        );
        assert_eq!(find(&results, "4").p_score, 0.0);
        assert!(results.iter().all(|r| r.p_score >= 0.0));
    }

    #[test]
    fn test_six_athlete_timed_field() {
        let scores = entries(&[300.0, 330.0, 360.0, 400.0, 450.0, 500.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        assert_eq!(find(&results, "2").p_score, 75.0);
        assert_eq!(find(&results, "3").p_score, 50.0);
    }

    #[test]
    fn test_descending_field() {
        let scores = entries(&[100.0, 90.0, 80.0, 70.0, 60.0, 50.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Load, &PScoreConfig::default());
        assert_eq!(find(&results, "1").p_score, 100.0);
        assert_eq!(find(&results, "2").p_score, 75.0);
        assert_eq!(find(&results, "3").p_score, 50.0);
    }

    #[test]
    fn test_reps_first_place() {
        let scores = entries(&[200.0, 150.0, 100.0, 50.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Reps, &PScoreConfig::default());
        assert_eq!(find(&results, "1").p_score, 100.0);
        assert_eq!(find(&results, "1").rank, 1);
    }

    #[test]
    fn test_median_of_all_is_interpolated() {
        // median (360 + 420) / 2 = 390
        let scores = entries(&[300.0, 360.0, 420.0, 480.0]);
        let results = calculate_pscore(
            &scores,
            WorkoutScheme::Time,
            &config(true, MedianField::All),
        );
        assert_eq!(find(&results, "1").p_score, 100.0);
        // 100 - 60 * (50 / 90)
        assert_eq!(find(&results, "2").p_score, 66.67);
    }

    #[test]
    fn test_halfway_between_best_and_median_is_75() {
        let scores = entries(&[300.0, 330.0, 360.0, 420.0, 480.0, 500.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        assert_eq!(find(&results, "2").p_score, 75.0);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        let scores = entries(&[300.0, 340.0, 360.0, 400.0, 450.0, 500.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        assert_eq!(find(&results, "2").p_score, 66.67);
    }

    #[test]
    fn test_dns_scores_zero_and_ranks_last() {
        let mut scores = entries(&[300.0, 360.0]);
        scores.push(ScoreEntry::new("3", 0.0, ScoreStatus::Dns));
        scores.push(ScoreEntry::new("4", 420.0, ScoreStatus::Scored));
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());

        let dns = find(&results, "3");
        assert_eq!(dns.p_score, 0.0);
        assert_eq!(dns.rank, 4);
    }

    #[test]
    fn test_dnf_ranks_after_scored() {
        let mut scores = entries(&[300.0, 360.0]);
        scores.push(ScoreEntry::new("3", 0.0, ScoreStatus::Dnf));
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        assert_eq!(find(&results, "3").rank, 3);
        assert_eq!(find(&results, "3").p_score, 0.0);
    }

    #[test]
    fn test_dnf_before_dns_and_withdrawn() {
        let scores = vec![
            ScoreEntry::new("wd", 0.0, ScoreStatus::Withdrawn),
            ScoreEntry::new("dnf", 0.0, ScoreStatus::Dnf),
            ScoreEntry::new("dns", 0.0, ScoreStatus::Dns),
            ScoreEntry::new("a", 50.0, ScoreStatus::Scored),
        ];
        let results = calculate_pscore(&scores, WorkoutScheme::Reps, &PScoreConfig::default());
        let ids: Vec<&str> = results.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "dnf", "wd", "dns"]);
        assert_eq!(find(&results, "dnf").rank, 2);
        assert_eq!(find(&results, "wd").rank, 3);
        assert_eq!(find(&results, "dns").rank, 3);
    }

    #[test]
    fn test_capped_ranks_after_finishers() {
        let scores = vec![
            ScoreEntry::new("1", 300.0, ScoreStatus::Scored),
            ScoreEntry::new("2", 360.0, ScoreStatus::Scored),
            ScoreEntry::new("3", 500.0, ScoreStatus::Cap),
            ScoreEntry::new("4", 420.0, ScoreStatus::Scored),
        ];
        let results =
            calculate_pscore(&scores, WorkoutScheme::TimeWithCap, &PScoreConfig::default());
        assert_eq!(find(&results, "3").rank, 4);
        assert_eq!(find(&results, "4").rank, 3);
    }

    #[test]
    fn test_withdrawn_does_not_move_anchors() {
        let mut scores = entries(&[300.0, 360.0, 420.0, 480.0]);
        let baseline = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        scores.push(ScoreEntry::new("wd", 0.0, ScoreStatus::Withdrawn));
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());

        assert_eq!(find(&results, "wd").p_score, 0.0);
        for r in &baseline {
            assert_eq!(find(&results, &r.user_id).p_score, r.p_score);
        }
    }

    #[test]
    fn test_single_athlete() {
        let results =
            calculate_pscore(&entries(&[300.0]), WorkoutScheme::Time, &PScoreConfig::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].p_score, 100.0);
        assert_eq!(results[0].rank, 1);
    }

    #[test]
    fn test_tied_for_first() {
        let scores = entries(&[300.0, 300.0, 360.0, 420.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        assert_eq!(find(&results, "1").p_score, 100.0);
        assert_eq!(find(&results, "2").p_score, 100.0);
        assert_eq!(find(&results, "1").rank, 1);
        assert_eq!(find(&results, "2").rank, 1);
    }

    #[test]
    fn test_tiebreak_orders_but_does_not_split_equal_p_scores() {
        let scores = vec![
            ScoreEntry::new("slow", 5012.0, ScoreStatus::Scored)
                .with_tiebreak(TiebreakScheme::Time, 600.0),
            ScoreEntry::new("fast", 5012.0, ScoreStatus::Scored)
                .with_tiebreak(TiebreakScheme::Time, 510.0),
            ScoreEntry::new("mid", 4010.0, ScoreStatus::Scored),
            ScoreEntry::new("low", 3005.0, ScoreStatus::Scored),
            ScoreEntry::new("last", 2000.0, ScoreStatus::Scored),
        ];
        let results =
            calculate_pscore(&scores, WorkoutScheme::RoundsReps, &PScoreConfig::default());
        let ids: Vec<&str> = results.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["fast", "slow", "mid", "low", "last"]);
        assert_eq!(find(&results, "fast").p_score, 100.0);
        assert_eq!(find(&results, "slow").p_score, 100.0);
        assert_eq!(find(&results, "fast").rank, 1);
        assert_eq!(find(&results, "slow").rank, 1);
        assert_eq!(find(&results, "mid").rank, 3);
    }

    #[test]
    fn test_all_identical() {
        let scores = entries(&[300.0, 300.0, 300.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        assert!(results.iter().all(|r| r.p_score == 100.0 && r.rank == 1));
    }

    #[test]
    fn test_empty_field() {
        let results = calculate_pscore(&[], WorkoutScheme::Time, &PScoreConfig::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_results_sorted_by_rank() {
        let scores = vec![
            ScoreEntry::new("4", 480.0, ScoreStatus::Scored),
            ScoreEntry::new("1", 300.0, ScoreStatus::Scored),
            ScoreEntry::new("3", 420.0, ScoreStatus::Scored),
            ScoreEntry::new("2", 360.0, ScoreStatus::Scored),
        ];
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        let ids: Vec<&str> = results.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_rank_monotonic_in_p_score() {
        let scores = entries(&[512.0, 300.0, 433.0, 300.0, 610.0, 377.0, 433.0, 299.0]);
        let results = calculate_pscore(&scores, WorkoutScheme::Time, &PScoreConfig::default());
        for a in &results {
            for b in &results {
                if a.p_score > b.p_score {
                    assert!(a.rank <= b.rank);
                }
                if a.p_score == b.p_score {
                    assert_eq!(a.rank, b.rank);
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let scores = entries(&[512.0, 300.0, 433.0, 377.0]);
        let cfg = config(false, MedianField::All);
        assert_eq!(
            calculate_pscore(&scores, WorkoutScheme::Time, &cfg),
            calculate_pscore(&scores, WorkoutScheme::Time, &cfg)
        );
    }

    #[test]
    fn test_config_defaults_from_yaml() {
        let cfg: PScoreConfig = serde_saphyr::from_str("median_field: all").unwrap();
        assert!(cfg.allow_negatives);
        assert_eq!(cfg.median_field, MedianField::All);
    }
}
