use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::pscore::PScoreConfig;
use super::tiebreak::TiebreakerConfig;
use super::types::ScoreStatus;

/// Main scoring configuration.
///
/// Chooses how event placements turn into points, how DNF/DNS/withdrawn
/// athletes are treated, and how ties on total points are broken. Every
/// section is optional and falls back to its default.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   algorithm: p_score
///   p_score:
///     allow_negatives: false
///     median_field: all
///   tiebreaker:
///     primary: countback
///     secondary: head_to_head
///     head_to_head_event_id: final
///   status_handling:
///     dns: exclude
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub algorithm: ScoringAlgorithm,

    /// Placement table used by the traditional algorithm
    #[serde(default)]
    pub traditional: TraditionalConfig,

    /// Per-place overrides used by the custom algorithm
    #[serde(default)]
    pub custom_table: CustomTableConfig,

    #[serde(default)]
    pub p_score: PScoreConfig,

    #[serde(default)]
    pub tiebreaker: TiebreakerConfig,

    #[serde(default)]
    pub status_handling: StatusHandling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringAlgorithm {
    /// Fixed step deduction from first place
    #[default]
    Traditional,
    /// Margin-of-victory scoring
    PScore,
    /// Front-loaded table: 100, 85, 75, 67, ...
    WinnerTakesMore,
    /// A base table with individual places overridden
    Custom,
}

impl ScoringAlgorithm {
    pub fn display_name(&self) -> &'static str {
        match self {
            ScoringAlgorithm::Traditional => "Traditional",
            ScoringAlgorithm::PScore => "P-Score",
            ScoringAlgorithm::WinnerTakesMore => "Winner Takes More",
            ScoringAlgorithm::Custom => "Custom",
        }
    }
}

/// Placement table a custom table starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsTemplate {
    #[default]
    Traditional,
    WinnerTakesMore,
}

/// Example YAML:
/// ```yaml
/// custom_table:
///   base_template: winner_takes_more
///   overrides:
///     1: 150
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CustomTableConfig {
    #[serde(default)]
    pub base_template: PointsTemplate,

    /// Place (1-based) to points
    #[serde(default)]
    pub overrides: BTreeMap<u32, f64>,
}

/// Traditional placement points: 1st earns `first_place_points`, each
/// following rank `step` less, never below zero.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TraditionalConfig {
    #[serde(default = "default_step")]
    pub step: f64,

    #[serde(default = "default_first_place_points")]
    pub first_place_points: f64,
}

fn default_step() -> f64 {
    5.0
}

fn default_first_place_points() -> f64 {
    100.0
}

impl Default for TraditionalConfig {
    fn default() -> Self {
        Self {
            step: default_step(),
            first_place_points: default_first_place_points(),
        }
    }
}

/// What an event does with an athlete who has no comparable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Rank right after the last active athlete and earn that rank's points
    LastPlace,
    /// Rank right after the last active athlete with 0 points
    Zero,
    /// Leave the athlete out of the event entirely
    Exclude,
    /// Rank as the worst performance of the event; placed like `last_place`
    WorstPerformance,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StatusHandling {
    #[serde(default = "default_dnf")]
    pub dnf: StatusPolicy,

    #[serde(default = "default_dns")]
    pub dns: StatusPolicy,

    #[serde(default = "default_withdrawn")]
    pub withdrawn: StatusPolicy,
}

fn default_dnf() -> StatusPolicy {
    StatusPolicy::LastPlace
}

fn default_dns() -> StatusPolicy {
    StatusPolicy::Zero
}

fn default_withdrawn() -> StatusPolicy {
    StatusPolicy::Exclude
}

impl Default for StatusHandling {
    fn default() -> Self {
        Self {
            dnf: default_dnf(),
            dns: default_dns(),
            withdrawn: default_withdrawn(),
        }
    }
}

impl StatusHandling {
    /// Policy for a status without a value; `None` for scored and capped entries.
    pub fn policy(&self, status: ScoreStatus) -> Option<StatusPolicy> {
        match status {
            ScoreStatus::Scored | ScoreStatus::Cap => None,
            ScoreStatus::Dnf => Some(self.dnf),
            ScoreStatus::Dns => Some(self.dns),
            ScoreStatus::Withdrawn => Some(self.withdrawn),
        }
    }
}
