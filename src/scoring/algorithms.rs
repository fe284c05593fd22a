use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::config::{
    CustomTableConfig, PointsTemplate, ScoringAlgorithm, ScoringConfig, StatusPolicy,
    TraditionalConfig,
};
use super::pscore::calculate_pscore;
use super::rank::{competition_ranks, split_ties};
use super::types::{ScoreEntry, ScoreStatus, SortDirection, WorkoutScheme};

/// Points per place for the winner-takes-more table; every later place earns 1.
const WINNER_TAKES_MORE: [f64; 28] = [
    100.0, 85.0, 75.0, 67.0, 60.0, 54.0, 49.0, 45.0, 41.0, 38.0, 35.0, 32.0, 30.0, 28.0, 26.0,
    24.0, 22.0, 20.0, 18.0, 16.0, 14.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0,
];

/// Points one athlete earned in one event.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventPoints {
    pub user_id: String,
    pub points: f64,
    pub rank: u32,
}

/// Turn one event's field into points with the configured algorithm.
///
/// Results are ordered by event rank. Under the placement tables, athletes
/// whose status policy is `exclude` are absent.
pub fn calculate_event_points(
    scores: &[ScoreEntry],
    scheme: WorkoutScheme,
    config: &ScoringConfig,
) -> Vec<EventPoints> {
    if scores.is_empty() {
        return Vec::new();
    }

    match config.algorithm {
        ScoringAlgorithm::Traditional => placement_event_points(scores, scheme, config, |rank| {
            traditional_points(rank, &config.traditional)
        }),
        ScoringAlgorithm::WinnerTakesMore => {
            placement_event_points(scores, scheme, config, winner_takes_more_points)
        }
        ScoringAlgorithm::Custom => placement_event_points(scores, scheme, config, |rank| {
            custom_points(rank, &config.custom_table, &config.traditional)
        }),
        ScoringAlgorithm::PScore => pscore_event_points(scores, scheme, config),
    }
}

/// Points for a placement under the traditional table.
pub fn traditional_points(rank: u32, config: &TraditionalConfig) -> f64 {
    let points = config.first_place_points - f64::from(rank.saturating_sub(1)) * config.step;
    points.max(0.0)
}

pub fn winner_takes_more_points(rank: u32) -> f64 {
    let index = rank.saturating_sub(1) as usize;
    WINNER_TAKES_MORE.get(index).copied().unwrap_or(1.0)
}

/// Points for a placement under a custom table: the override if one is set
/// for that place, otherwise the base template's value.
pub fn custom_points(rank: u32, table: &CustomTableConfig, traditional: &TraditionalConfig) -> f64 {
    if let Some(points) = table.overrides.get(&rank) {
        return *points;
    }
    match table.base_template {
        PointsTemplate::Traditional => traditional_points(rank, traditional),
        PointsTemplate::WinnerTakesMore => winner_takes_more_points(rank),
    }
}

/// Whether event points can go below zero under this config.
pub fn can_have_negative_scores(config: &ScoringConfig) -> bool {
    config.algorithm == ScoringAlgorithm::PScore && config.p_score.allow_negatives
}

fn capped_last(status: ScoreStatus, scheme: WorkoutScheme) -> bool {
    scheme == WorkoutScheme::TimeWithCap && status == ScoreStatus::Cap
}

fn compare_active(a: &ScoreEntry, b: &ScoreEntry, scheme: WorkoutScheme) -> Ordering {
    let by_value = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
    capped_last(a.status, scheme)
        .cmp(&capped_last(b.status, scheme))
        .then(match scheme.sort_direction() {
            SortDirection::Ascending => by_value,
            SortDirection::Descending => by_value.reverse(),
        })
}

/// Rank the field and read each place's points off a table.
fn placement_event_points<F>(
    scores: &[ScoreEntry],
    scheme: WorkoutScheme,
    config: &ScoringConfig,
    points_for: F,
) -> Vec<EventPoints>
where
    F: Fn(u32) -> f64,
{
    let mut active: Vec<&ScoreEntry> = scores.iter().filter(|s| s.status.has_value()).collect();
    active.sort_by(|a, b| compare_active(a, b, scheme));

    let classes = split_ties(&mut active, |e| *e, |a, b| {
        compare_active(a, b, scheme) == Ordering::Equal
    });
    let ranks = competition_ranks(&classes, |a, b| a == b);
    let last_active_rank = ranks.last().copied().unwrap_or(0);

    let mut results: Vec<EventPoints> = active
        .iter()
        .zip(&ranks)
        .map(|(entry, rank)| EventPoints {
            user_id: entry.user_id.clone(),
            points: points_for(*rank),
            rank: *rank,
        })
        .collect();

    for entry in scores.iter().filter(|s| !s.status.has_value()) {
        let rank = last_active_rank + 1;
        let points = match config.status_handling.policy(entry.status) {
            Some(StatusPolicy::LastPlace | StatusPolicy::WorstPerformance) => points_for(rank),
            Some(StatusPolicy::Zero) => 0.0,
            Some(StatusPolicy::Exclude) | None => continue,
        };
        results.push(EventPoints {
            user_id: entry.user_id.clone(),
            points,
            rank,
        });
    }

    results
}

/// The whole field goes to the normalizer, which already places DNF, DNS and
/// withdrawn athletes behind everyone with a result at 0 points.
fn pscore_event_points(
    scores: &[ScoreEntry],
    scheme: WorkoutScheme,
    config: &ScoringConfig,
) -> Vec<EventPoints> {
    calculate_pscore(scores, scheme, &config.p_score)
        .into_iter()
        .map(|result| EventPoints {
            user_id: result.user_id,
            points: result.p_score,
            rank: result.rank,
        })
        .collect()
}
