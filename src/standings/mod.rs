mod storage;

pub use storage::{load_standings, save_standings, STANDINGS_VERSION};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::{AthleteScore, Competition, EventConfig};
use crate::scoring::{
    aggregate_rounds, apply_tiebreakers, calculate_event_points, format_value, is_outlier,
    parse_tiebreak_score, AthleteStanding, RankedResult, ScoreEntry, ScoreStatus, ScoreType,
    ScoringAlgorithm, ScoringConfig, TiebreakValue, WorkoutScheme,
};

/// One athlete's line in an event table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventRow {
    pub user_id: String,
    pub status: ScoreStatus,
    /// Comparable raw value; absent for DNF/DNS/withdrawn
    pub value: Option<f64>,
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<String>,
    pub points: f64,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventStandings {
    pub event_id: String,
    pub name: String,
    pub scheme: WorkoutScheme,
    pub rows: Vec<EventRow>,
    /// Entries that could not be scored, as "athlete: reason"
    #[serde(default)]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Standings {
    pub version: u32,
    pub competition: String,
    pub algorithm: ScoringAlgorithm,
    /// Athlete id to display name
    #[serde(default)]
    pub athletes: BTreeMap<String, String>,
    pub events: Vec<EventStandings>,
    pub overall: Vec<RankedResult>,
}

impl Standings {
    pub fn event(&self, id: &str) -> Option<&EventStandings> {
        self.events.iter().find(|e| e.event_id == id)
    }

    pub fn athlete_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.athletes.get(id).map(String::as_str).unwrap_or(id)
    }
}

/// A score that made it through parsing, ready for the points algorithm.
struct Prepared {
    entry: ScoreEntry,
    display: String,
    tiebreak: Option<String>,
}

impl Prepared {
    fn status_only(user_id: &str, status: ScoreStatus) -> Self {
        Self {
            entry: ScoreEntry::new(user_id, 0.0, status),
            display: status.label().to_string(),
            tiebreak: None,
        }
    }
}

/// Score every event and rank the whole field.
///
/// Every registered athlete appears in the overall standings, including
/// those without a single scored event.
pub fn build_standings(competition: &Competition) -> Result<Standings> {
    if let Err(errors) = competition.validate() {
        bail!(
            "Invalid competition configuration:\n  {}",
            errors.join("\n  ")
        );
    }

    let events = competition
        .events
        .iter()
        .map(|event| score_event(event, &competition.scoring))
        .collect::<Result<Vec<_>>>()?;

    let mut athletes: Vec<AthleteStanding> = competition
        .athletes
        .iter()
        .map(|a| AthleteStanding::new(a.id.as_str(), 0.0))
        .collect();
    let index: HashMap<&str, usize> = competition
        .athletes
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id.as_str(), i))
        .collect();

    for event in &events {
        for row in &event.rows {
            if let Some(&i) = index.get(row.user_id.as_str()) {
                athletes[i].total_points += row.points;
                athletes[i]
                    .event_placements
                    .insert(event.event_id.clone(), row.rank);
            }
        }
    }
    for athlete in &mut athletes {
        // keep float noise from splitting athletes who are really tied
        athlete.total_points = (athlete.total_points * 100.0).round() / 100.0;
    }

    let overall = apply_tiebreakers(&athletes, &competition.scoring.tiebreaker)?;
    log::debug!(
        "standings for '{}': {} athletes over {} events",
        competition.name,
        overall.len(),
        events.len()
    );

    Ok(Standings {
        version: STANDINGS_VERSION,
        competition: competition.name.clone(),
        algorithm: competition.scoring.algorithm,
        athletes: competition
            .athletes
            .iter()
            .map(|a| (a.id.clone(), a.display_name().to_string()))
            .collect(),
        events,
        overall,
    })
}

/// Parse, aggregate and award points for one event.
pub fn score_event(event: &EventConfig, config: &ScoringConfig) -> Result<EventStandings> {
    let time_cap = event.time_cap_seconds()?;
    let score_type = event.score_type();
    log::debug!(
        "event {}: scheme {}, {:?} over rounds, cap {:?}",
        event.id,
        event.scheme,
        score_type,
        time_cap
    );

    let mut prepared = Vec::new();
    let mut issues = Vec::new();
    for score in &event.scores {
        match prepare_entry(score, event, score_type, time_cap) {
            Ok(Some(p)) => prepared.push(p),
            Ok(None) => log::debug!("event {}: no result entered for {}", event.id, score.athlete),
            Err(reason) => {
                log::warn!("event {}: skipping {}: {}", event.id, score.athlete, reason);
                issues.push(format!("{}: {}", score.athlete, reason));
            }
        }
    }

    let field: Vec<f64> = prepared
        .iter()
        .filter(|p| p.entry.status == ScoreStatus::Scored)
        .map(|p| p.entry.value)
        .collect();
    for p in prepared.iter().filter(|p| p.entry.status == ScoreStatus::Scored) {
        if is_outlier(p.entry.value, &field) {
            log::warn!(
                "event {}: {} scored {}, far outside the field",
                event.id,
                p.entry.user_id,
                p.display
            );
        }
    }

    let entries: Vec<ScoreEntry> = prepared.iter().map(|p| p.entry.clone()).collect();
    let by_user: HashMap<&str, &Prepared> = prepared
        .iter()
        .map(|p| (p.entry.user_id.as_str(), p))
        .collect();

    let rows = calculate_event_points(&entries, event.scheme, config)
        .into_iter()
        .filter_map(|points| {
            let p = by_user.get(points.user_id.as_str())?;
            Some(EventRow {
                status: p.entry.status,
                value: p.entry.status.has_value().then_some(p.entry.value),
                display: p.display.clone(),
                tiebreak: p.tiebreak.clone(),
                points: points.points,
                rank: points.rank,
                user_id: points.user_id,
            })
        })
        .collect();

    Ok(EventStandings {
        event_id: event.id.clone(),
        name: event.display_name().to_string(),
        scheme: event.scheme,
        rows,
        issues,
    })
}

/// Turn one raw entry into a ranked-ready score.
///
/// `Ok(None)` means nothing was entered yet; `Err` carries the reason the
/// entry cannot be scored.
fn prepare_entry(
    score: &AthleteScore,
    event: &EventConfig,
    score_type: ScoreType,
    time_cap: Option<u32>,
) -> Result<Option<Prepared>, String> {
    if let Some(status) = score.status.filter(|s| !s.has_value()) {
        return Ok(Some(Prepared::status_only(&score.athlete, status)));
    }

    let result = aggregate_rounds(
        &score.rounds,
        event.scheme,
        score_type,
        time_cap,
        event.tiebreak_scheme,
    );
    let errors = result.errors();
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }
    for warning in result.warnings() {
        log::warn!("event {}: {}: {}", event.id, score.athlete, warning);
    }

    let tiebreak = match (score.tiebreak.as_deref(), event.tiebreak_scheme) {
        (Some(raw), Some(scheme)) => {
            let parsed = parse_tiebreak_score(raw, scheme);
            if let Some(error) = parsed.error {
                return Err(format!("tiebreak: {}", error));
            }
            parsed
                .raw_value
                .filter(|_| parsed.is_valid)
                .map(|value| (TiebreakValue { scheme, value }, parsed.formatted))
        }
        _ => None,
    };
    let (tiebreak_value, tiebreak) = tiebreak.unzip();

    let statuses: Vec<ScoreStatus> = result.rounds.iter().filter_map(|r| r.score_status).collect();
    let capped = event.scheme == WorkoutScheme::TimeWithCap
        && (score.status == Some(ScoreStatus::Cap) || statuses.contains(&ScoreStatus::Cap));

    let prepared = if capped {
        let base = result
            .aggregated
            .or(time_cap.map(f64::from))
            .ok_or("capped result needs the event's time_cap")?;
        let missing = match (event.total_reps, score.capped_reps) {
            (Some(total), Some(reps)) if reps > total => {
                return Err(format!("capped_reps {} exceeds total_reps {}", reps, total));
            }
            (Some(total), Some(reps)) => total - reps,
            _ => 0,
        };
        let display = match score.capped_reps {
            Some(reps) => format!("CAP ({} reps)", reps),
            None => "CAP".to_string(),
        };
        let mut entry = ScoreEntry::new(
            score.athlete.as_str(),
            base + f64::from(missing),
            ScoreStatus::Cap,
        );
        entry.capped_reps = score.capped_reps;
        entry.tiebreak = tiebreak_value;
        Prepared {
            entry,
            display,
            tiebreak,
        }
    } else if let Some(value) = result.aggregated {
        let mut entry = ScoreEntry::new(
            score.athlete.as_str(),
            value,
            score.status.unwrap_or(ScoreStatus::Scored),
        );
        entry.tiebreak = tiebreak_value;
        Prepared {
            entry,
            display: format_value(value, event.scheme),
            tiebreak,
        }
    } else if statuses.contains(&ScoreStatus::Dnf) {
        Prepared::status_only(&score.athlete, ScoreStatus::Dnf)
    } else if statuses.contains(&ScoreStatus::Dns) {
        Prepared::status_only(&score.athlete, ScoreStatus::Dns)
    } else {
        return Ok(None);
    };

    Ok(Some(prepared))
}
