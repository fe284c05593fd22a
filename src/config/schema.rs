use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::scoring::{
    default_score_type, validate_scoring, ScoreStatus, ScoreType, ScoringConfig, TiebreakScheme,
    WorkoutScheme,
};

/// A competition file: who competes, which events, and every entered score.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Competition {
    pub name: String,

    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Registered athletes; every one of them appears in the overall standings
    #[serde(default)]
    pub athletes: Vec<Athlete>,

    #[serde(default)]
    pub events: Vec<EventConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Athlete {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Athlete {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EventConfig {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    pub scheme: WorkoutScheme,

    /// Human duration ("15m", "12m30s") or bare seconds
    #[serde(default)]
    pub time_cap: Option<String>,

    /// Round aggregation; falls back to the scheme's default
    #[serde(default)]
    pub score_type: Option<ScoreType>,

    #[serde(default)]
    pub tiebreak_scheme: Option<TiebreakScheme>,

    /// Reps in the whole workout, used to order capped athletes
    #[serde(default)]
    pub total_reps: Option<u32>,

    #[serde(default)]
    pub scores: Vec<AthleteScore>,
}

impl EventConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn score_type(&self) -> ScoreType {
        self.score_type
            .unwrap_or_else(|| default_score_type(self.scheme))
    }

    /// Time cap in whole seconds.
    pub fn time_cap_seconds(&self) -> Result<Option<u32>> {
        self.time_cap
            .as_deref()
            .map(parse_time_cap)
            .transpose()
            .with_context(|| format!("Invalid time cap for event '{}'", self.id))
    }
}

/// One athlete's entry for one event.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AthleteScore {
    pub athlete: String,

    /// Raw per-round inputs, in round order
    #[serde(default)]
    pub rounds: Vec<String>,

    /// Explicit outcome, overriding what the rounds imply
    #[serde(default)]
    pub status: Option<ScoreStatus>,

    /// Reps completed when the time cap hit
    #[serde(default)]
    pub capped_reps: Option<u32>,

    /// Raw tie-break input, read with the event's tiebreak scheme
    #[serde(default)]
    pub tiebreak: Option<String>,
}

/// Parse a time cap as a humantime duration or a bare number of seconds.
pub fn parse_time_cap(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let duration = match trimmed.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => humantime::parse_duration(trimmed)
            .with_context(|| format!("'{}' is not a duration", trimmed))?,
    };

    let seconds = duration.as_secs();
    if seconds == 0 {
        bail!("time cap must be positive");
    }
    u32::try_from(seconds).with_context(|| format!("time cap of {}s is too long", seconds))
}

impl Competition {
    pub fn event(&self, id: &str) -> Option<&EventConfig> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn athlete(&self, id: &str) -> Option<&Athlete> {
        self.athletes.iter().find(|a| a.id == id)
    }

    pub fn athlete_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.athlete(id).map(Athlete::display_name).unwrap_or(id)
    }

    /// Validate the whole competition file.
    /// Returns all validation errors at once (not just the first).
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = validate_scoring(&self.scoring).err().unwrap_or_default();

        let mut athlete_ids = HashSet::new();
        for (i, athlete) in self.athletes.iter().enumerate() {
            if athlete.id.trim().is_empty() {
                errors.push(format!("athletes[{}].id: must not be empty", i));
            } else if !athlete_ids.insert(athlete.id.as_str()) {
                errors.push(format!("athletes[{}].id: duplicate athlete '{}'", i, athlete.id));
            }
        }

        let mut event_ids = HashSet::new();
        for (i, event) in self.events.iter().enumerate() {
            let path = format!("events[{}]", i);
            if event.id.trim().is_empty() {
                errors.push(format!("{}.id: must not be empty", path));
            } else if !event_ids.insert(event.id.as_str()) {
                errors.push(format!("{}.id: duplicate event '{}'", path, event.id));
            }

            if let Some(cap) = &event.time_cap {
                if let Err(e) = parse_time_cap(cap) {
                    errors.push(format!("{}.time_cap: invalid '{}' - {:#}", path, cap, e));
                }
            }
            if event.total_reps.is_some() && event.scheme != WorkoutScheme::TimeWithCap {
                errors.push(format!(
                    "{}.total_reps: only meaningful for time-with-cap, event is {}",
                    path, event.scheme
                ));
            }

            let mut entered = HashSet::new();
            for (j, score) in event.scores.iter().enumerate() {
                if !athlete_ids.contains(score.athlete.as_str()) {
                    errors.push(format!(
                        "{}.scores[{}].athlete: unknown athlete '{}'",
                        path, j, score.athlete
                    ));
                }
                if !entered.insert(score.athlete.as_str()) {
                    errors.push(format!(
                        "{}.scores[{}].athlete: second entry for '{}'",
                        path, j, score.athlete
                    ));
                }
                if score.tiebreak.is_some() && event.tiebreak_scheme.is_none() {
                    errors.push(format!(
                        "{}.scores[{}].tiebreak: event has no tiebreak_scheme",
                        path, j
                    ));
                }
            }
        }

        if let Some(id) = &self.scoring.tiebreaker.head_to_head_event_id {
            if !id.trim().is_empty() && !event_ids.contains(id.as_str()) {
                errors.push(format!(
                    "scoring.tiebreaker.head_to_head_event_id: unknown event '{}'",
                    id
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ScoringAlgorithm, TiebreakMethod};

    const SAMPLE: &str = r#"
name: Spring Throwdown
scoring:
  algorithm: p_score
  tiebreaker:
    primary: countback
    secondary: head_to_head
    head_to_head_event_id: fran
athletes:
  - id: alice
    name: Alice A.
  - id: bob
events:
  - id: fran
    name: Fran
    scheme: time-with-cap
    time_cap: 10m
    total_reps: 90
    scores:
      - athlete: alice
        rounds: ["4:12"]
      - athlete: bob
        rounds: ["cap"]
        capped_reps: 75
  - id: dl
    scheme: load
    scores:
      - athlete: alice
        rounds: ["225", "245", "255"]
      - athlete: bob
        status: withdrawn
"#;

    fn sample() -> Competition {
        serde_saphyr::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_competition() {
        let competition = sample();
        assert_eq!(competition.name, "Spring Throwdown");
        assert_eq!(competition.scoring.algorithm, ScoringAlgorithm::PScore);
        assert_eq!(competition.scoring.tiebreaker.secondary, Some(TiebreakMethod::HeadToHead));
        assert_eq!(competition.athletes.len(), 2);
        assert_eq!(competition.events.len(), 2);

        let fran = competition.event("fran").unwrap();
        assert_eq!(fran.scheme, WorkoutScheme::TimeWithCap);
        assert_eq!(fran.time_cap_seconds().unwrap(), Some(600));
        assert_eq!(fran.scores[1].capped_reps, Some(75));

        let dl = competition.event("dl").unwrap();
        assert_eq!(dl.score_type(), ScoreType::Max);
        assert_eq!(dl.scores[1].status, Some(ScoreStatus::Withdrawn));
        assert!(dl.scores[1].rounds.is_empty());

        assert!(competition.validate().is_ok());
    }

    #[test]
    fn test_minimal_competition() {
        let competition: Competition = serde_saphyr::from_str("name: Empty\n").unwrap();
        assert!(competition.events.is_empty());
        assert_eq!(competition.scoring, ScoringConfig::default());
        assert!(competition.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "name: X\nvenue: Gym\n";
        assert!(serde_saphyr::from_str::<Competition>(yaml).is_err());
    }

    #[test]
    fn test_display_names() {
        let competition = sample();
        assert_eq!(competition.athlete_name("alice"), "Alice A.");
        assert_eq!(competition.athlete_name("bob"), "bob");
        assert_eq!(competition.athlete_name("ghost"), "ghost");
        assert_eq!(competition.event("dl").unwrap().display_name(), "dl");
    }

    #[test]
    fn test_parse_time_cap() {
        assert_eq!(parse_time_cap("900").unwrap(), 900);
        assert_eq!(parse_time_cap("15m").unwrap(), 900);
        assert_eq!(parse_time_cap("12m 30s").unwrap(), 750);
        assert_eq!(parse_time_cap(" 1h ").unwrap(), 3600);
        assert!(parse_time_cap("0").is_err());
        assert!(parse_time_cap("soon").is_err());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut competition = sample();
        competition.athletes.push(Athlete {
            id: "alice".to_string(),
            name: None,
        });
        competition.events[0].time_cap = Some("whenever".to_string());
        competition.events[1].scores.push(AthleteScore {
            athlete: "carol".to_string(),
            rounds: vec!["200".to_string()],
            status: None,
            capped_reps: None,
            tiebreak: None,
        });
        competition.scoring.tiebreaker.head_to_head_event_id = Some("murph".to_string());

        let errors = competition.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.starts_with("athletes[2].id")));
        assert!(errors.iter().any(|e| e.starts_with("events[0].time_cap")));
        assert!(errors.iter().any(|e| e.contains("unknown athlete 'carol'")));
        assert!(errors.iter().any(|e| e.contains("unknown event 'murph'")));
    }

    #[test]
    fn test_validate_includes_scoring_errors() {
        let mut competition = sample();
        competition.scoring.tiebreaker.primary = TiebreakMethod::HeadToHead;
        competition.scoring.tiebreaker.secondary = None;
        competition.scoring.tiebreaker.head_to_head_event_id = None;
        competition.scoring.traditional.step = -1.0;

        let errors = competition.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("scoring."));
    }

    #[test]
    fn test_validate_duplicate_entry_and_stray_total_reps() {
        let mut competition = sample();
        let repeat = competition.events[1].scores[0].clone();
        competition.events[1].scores.push(repeat);
        competition.events[1].total_reps = Some(10);

        let errors = competition.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("second entry for 'alice'")));
        assert!(errors.iter().any(|e| e.starts_with("events[1].total_reps")));
    }
}
