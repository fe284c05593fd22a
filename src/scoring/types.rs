use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scoring format of a workout.
///
/// The scheme decides the parse grammar, the unit shown to athletes and
/// whether a lower or a higher raw value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkoutScheme {
    Time,
    TimeWithCap,
    RoundsReps,
    Reps,
    Load,
    Points,
    Calories,
    Meters,
    PassFail,
    Emom,
}

impl WorkoutScheme {
    pub const ALL: [WorkoutScheme; 10] = [
        WorkoutScheme::Time,
        WorkoutScheme::TimeWithCap,
        WorkoutScheme::RoundsReps,
        WorkoutScheme::Reps,
        WorkoutScheme::Load,
        WorkoutScheme::Points,
        WorkoutScheme::Calories,
        WorkoutScheme::Meters,
        WorkoutScheme::PassFail,
        WorkoutScheme::Emom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutScheme::Time => "time",
            WorkoutScheme::TimeWithCap => "time-with-cap",
            WorkoutScheme::RoundsReps => "rounds-reps",
            WorkoutScheme::Reps => "reps",
            WorkoutScheme::Load => "load",
            WorkoutScheme::Points => "points",
            WorkoutScheme::Calories => "calories",
            WorkoutScheme::Meters => "meters",
            WorkoutScheme::PassFail => "pass-fail",
            WorkoutScheme::Emom => "emom",
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        match self {
            WorkoutScheme::Time | WorkoutScheme::TimeWithCap => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, WorkoutScheme::Time | WorkoutScheme::TimeWithCap)
    }
}

impl fmt::Display for WorkoutScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match WorkoutScheme::ALL
            .iter()
            .find(|scheme| scheme.as_str() == normalized)
        {
            Some(scheme) => Ok(*scheme),
            None => bail!("Unknown workout scheme: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Lower raw value wins (times)
    Ascending,
    /// Higher raw value wins (reps, load, points, ...)
    Descending,
}

/// Outcome of an athlete's attempt at an event.
///
/// Only `Scored` and `Cap` carry a comparable raw value. `Dnf` still takes a
/// placement (after every value-bearing entry); `Dns` and `Withdrawn` are
/// outside the ranking math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreStatus {
    Scored,
    Cap,
    Dnf,
    Dns,
    Withdrawn,
}

impl ScoreStatus {
    pub fn has_value(&self) -> bool {
        matches!(self, ScoreStatus::Scored | ScoreStatus::Cap)
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, ScoreStatus::Dns | ScoreStatus::Withdrawn)
    }

    /// Lowercase name as written in competition files
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStatus::Scored => "scored",
            ScoreStatus::Cap => "cap",
            ScoreStatus::Dnf => "dnf",
            ScoreStatus::Dns => "dns",
            ScoreStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreStatus::Scored => "scored",
            ScoreStatus::Cap => "CAP",
            ScoreStatus::Dnf => "DNF",
            ScoreStatus::Dns => "DNS",
            ScoreStatus::Withdrawn => "WD",
        }
    }
}

/// How several round values of one athlete collapse into one raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreType {
    Min,
    Max,
    Sum,
    Average,
    First,
    Last,
}

impl FromStr for ScoreType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(ScoreType::Min),
            "max" => Ok(ScoreType::Max),
            "sum" => Ok(ScoreType::Sum),
            "average" | "avg" => Ok(ScoreType::Average),
            "first" => Ok(ScoreType::First),
            "last" => Ok(ScoreType::Last),
            _ => bail!("Unknown score type: {}", s),
        }
    }
}

/// Format of the tie-break value recorded alongside a main score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TiebreakScheme {
    Time,
    Reps,
}

impl TiebreakScheme {
    /// Faster tie-break times win; more tie-break reps win.
    pub fn sort_direction(&self) -> SortDirection {
        match self {
            TiebreakScheme::Time => SortDirection::Ascending,
            TiebreakScheme::Reps => SortDirection::Descending,
        }
    }
}

impl FromStr for TiebreakScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(TiebreakScheme::Time),
            "reps" => Ok(TiebreakScheme::Reps),
            _ => bail!("Unknown tie-break scheme: {}", s),
        }
    }
}

/// Aggregation used when an event does not configure one explicitly.
///
/// This is the only place the scheme-to-score-type fallback lives; callers
/// resolve it once and pass the result down.
pub fn default_score_type(scheme: WorkoutScheme) -> ScoreType {
    match scheme {
        WorkoutScheme::Load => ScoreType::Max,
        WorkoutScheme::Time
        | WorkoutScheme::TimeWithCap
        | WorkoutScheme::RoundsReps
        | WorkoutScheme::Reps
        | WorkoutScheme::Points
        | WorkoutScheme::Calories
        | WorkoutScheme::Meters
        | WorkoutScheme::PassFail
        | WorkoutScheme::Emom => ScoreType::Sum,
    }
}

/// A parsed tie-break value together with the format it was entered in.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TiebreakValue {
    pub scheme: TiebreakScheme,
    pub value: f64,
}

/// One athlete's (already parsed and aggregated) result in one event.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoreEntry {
    pub user_id: String,
    pub value: f64,
    pub status: ScoreStatus,
    /// Reps completed before the cap, for capped entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capped_reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<TiebreakValue>,
}

impl ScoreEntry {
    pub fn new(user_id: impl Into<String>, value: f64, status: ScoreStatus) -> Self {
        Self {
            user_id: user_id.into(),
            value,
            status,
            capped_reps: None,
            tiebreak: None,
        }
    }

    pub fn with_capped_reps(mut self, reps: u32) -> Self {
        self.capped_reps = Some(reps);
        self
    }

    pub fn with_tiebreak(mut self, scheme: TiebreakScheme, value: f64) -> Self {
        self.tiebreak = Some(TiebreakValue { scheme, value });
        self
    }
}

/// Final standing row: rank follows standard competition ranking.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RankedResult {
    pub user_id: String,
    pub total_points: f64,
    pub rank: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction() {
        assert_eq!(WorkoutScheme::Time.sort_direction(), SortDirection::Ascending);
        assert_eq!(
            WorkoutScheme::TimeWithCap.sort_direction(),
            SortDirection::Ascending
        );
        assert_eq!(WorkoutScheme::Emom.sort_direction(), SortDirection::Descending);
        assert_eq!(WorkoutScheme::Reps.sort_direction(), SortDirection::Descending);
        assert_eq!(WorkoutScheme::Load.sort_direction(), SortDirection::Descending);
        assert_eq!(
            WorkoutScheme::RoundsReps.sort_direction(),
            SortDirection::Descending
        );
    }

    #[test]
    fn test_scheme_from_str() {
        assert_eq!(
            "time-with-cap".parse::<WorkoutScheme>().unwrap(),
            WorkoutScheme::TimeWithCap
        );
        assert_eq!(
            "Pass_Fail".parse::<WorkoutScheme>().unwrap(),
            WorkoutScheme::PassFail
        );
        assert!("feet".parse::<WorkoutScheme>().is_err());
    }

    #[test]
    fn test_scheme_serde_names() {
        for scheme in WorkoutScheme::ALL {
            let json = serde_json::to_string(&scheme).unwrap();
            assert_eq!(json, format!("\"{}\"", scheme.as_str()));
        }
    }

    #[test]
    fn test_default_score_types() {
        assert_eq!(default_score_type(WorkoutScheme::Time), ScoreType::Sum);
        assert_eq!(default_score_type(WorkoutScheme::TimeWithCap), ScoreType::Sum);
        assert_eq!(default_score_type(WorkoutScheme::Reps), ScoreType::Sum);
        assert_eq!(default_score_type(WorkoutScheme::PassFail), ScoreType::Sum);
        assert_eq!(default_score_type(WorkoutScheme::Load), ScoreType::Max);
    }

    #[test]
    fn test_tiebreak_directions() {
        assert_eq!(TiebreakScheme::Time.sort_direction(), SortDirection::Ascending);
        assert_eq!(TiebreakScheme::Reps.sort_direction(), SortDirection::Descending);
    }

    #[test]
    fn test_score_entry_json_omits_empty_extras() {
        let plain = serde_json::to_string(&ScoreEntry::new("a", 60.0, ScoreStatus::Scored)).unwrap();
        assert!(!plain.contains("tiebreak"));
        assert!(!plain.contains("capped_reps"));

        let entry = ScoreEntry::new("a", 600.0, ScoreStatus::Cap)
            .with_capped_reps(90)
            .with_tiebreak(TiebreakScheme::Time, 300.0);
        let json = serde_json::to_string(&entry).unwrap();
        let back: ScoreEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_status_classes() {
        assert!(ScoreStatus::Scored.has_value());
        assert!(ScoreStatus::Cap.has_value());
        assert!(!ScoreStatus::Dnf.has_value());
        assert!(!ScoreStatus::Dnf.is_inactive());
        assert!(ScoreStatus::Dns.is_inactive());
        assert!(ScoreStatus::Withdrawn.is_inactive());
    }
}
