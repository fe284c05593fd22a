use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::rank::{competition_ranks, points_desc};
use super::types::RankedResult;

/// A rule for separating athletes tied on total points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakMethod {
    None,
    /// Most 1st places, then most 2nd places, and so on
    Countback,
    /// Better placement in one designated event
    HeadToHead,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TiebreakerConfig {
    pub primary: TiebreakMethod,
    #[serde(default)]
    pub secondary: Option<TiebreakMethod>,
    #[serde(default)]
    pub head_to_head_event_id: Option<String>,
}

impl Default for TiebreakerConfig {
    fn default() -> Self {
        Self::new(TiebreakMethod::Countback)
    }
}

impl TiebreakerConfig {
    pub fn new(primary: TiebreakMethod) -> Self {
        Self {
            primary,
            secondary: None,
            head_to_head_event_id: None,
        }
    }

    fn methods(&self) -> Vec<TiebreakMethod> {
        std::iter::once(self.primary).chain(self.secondary).collect()
    }

    /// Reject a head-to-head rule that has no event to compare on.
    pub fn validate(&self) -> Result<()> {
        let needs_event = self.methods().contains(&TiebreakMethod::HeadToHead);
        let has_event = self
            .head_to_head_event_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if needs_event && !has_event {
            bail!("head_to_head_event_id is required for head_to_head tiebreaker");
        }
        Ok(())
    }
}

/// One athlete's total and their placements in the events completed so far.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AthleteStanding {
    pub user_id: String,
    pub total_points: f64,
    #[serde(default)]
    pub event_placements: BTreeMap<String, u32>,
}

impl AthleteStanding {
    pub fn new(user_id: impl Into<String>, total_points: f64) -> Self {
        Self {
            user_id: user_id.into(),
            total_points,
            event_placements: BTreeMap::new(),
        }
    }

    pub fn with_placement(mut self, event_id: impl Into<String>, placement: u32) -> Self {
        self.event_placements.insert(event_id.into(), placement);
        self
    }

    fn placement_count(&self, placement: u32) -> usize {
        self.event_placements
            .values()
            .filter(|p| **p == placement)
            .count()
    }
}

/// Rank athletes by total points, breaking point ties with the configured rules.
///
/// Fails before looking at any athlete when the config is invalid. Athletes
/// still tied after every rule share a rank and keep their input order.
pub fn apply_tiebreakers(
    athletes: &[AthleteStanding],
    config: &TiebreakerConfig,
) -> Result<Vec<RankedResult>> {
    config.validate()?;

    let mut ordered: Vec<&AthleteStanding> = athletes.iter().collect();
    ordered.sort_by(|a, b| points_desc(a.total_points, b.total_points));

    let methods = config.methods();
    let event_id = config.head_to_head_event_id.as_deref().unwrap_or_default();

    // (tie class id, athlete) in final order
    let mut resolved: Vec<(usize, &AthleteStanding)> = Vec::with_capacity(ordered.len());
    let mut next_class = 0;

    for group in ordered.chunk_by(|a, b| a.total_points == b.total_points) {
        let classes = if group.len() > 1 {
            resolve(group.to_vec(), &methods, event_id)
        } else {
            vec![group.to_vec()]
        };
        if classes.len() > 1 {
            log::debug!(
                "tie at {} points split into {} places",
                group[0].total_points,
                classes.len()
            );
        }
        for class in classes {
            resolved.extend(class.into_iter().map(|a| (next_class, a)));
            next_class += 1;
        }
    }

    let ranks = competition_ranks(&resolved, |a, b| a.0 == b.0);
    Ok(resolved
        .into_iter()
        .zip(ranks)
        .map(|((_, athlete), rank)| RankedResult {
            user_id: athlete.user_id.clone(),
            total_points: athlete.total_points,
            rank,
        })
        .collect())
}

/// Split a tied group into ordered tie classes.
///
/// The first method orders the group; any class it leaves with more than one
/// member goes on to the remaining methods. Resolved members are never
/// looked at again.
fn resolve<'a>(
    mut group: Vec<&'a AthleteStanding>,
    methods: &[TiebreakMethod],
    event_id: &str,
) -> Vec<Vec<&'a AthleteStanding>> {
    let Some((method, rest)) = methods.split_first() else {
        return vec![group];
    };

    let compare: Box<dyn Fn(&AthleteStanding, &AthleteStanding) -> Ordering + '_> = match method {
        TiebreakMethod::None => return resolve(group, rest, event_id),
        TiebreakMethod::Countback => {
            let levels: BTreeSet<u32> = group
                .iter()
                .flat_map(|a| a.event_placements.values().copied())
                .collect();
            Box::new(move |a, b| countback(a, b, &levels))
        }
        TiebreakMethod::HeadToHead => Box::new(move |a, b| head_to_head(a, b, event_id)),
    };

    group.sort_by(|a, b| compare(*a, *b));

    let mut classes = Vec::new();
    for class in group.chunk_by(|a, b| compare(*a, *b) == Ordering::Equal) {
        if class.len() > 1 {
            classes.extend(resolve(class.to_vec(), rest, event_id));
        } else {
            classes.push(class.to_vec());
        }
    }
    classes
}

/// More finishes at the best differing placement level wins.
fn countback(a: &AthleteStanding, b: &AthleteStanding, levels: &BTreeSet<u32>) -> Ordering {
    levels
        .iter()
        .map(|level| b.placement_count(*level).cmp(&a.placement_count(*level)))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Lower placement in the designated event wins; no placement loses to any.
fn head_to_head(a: &AthleteStanding, b: &AthleteStanding, event_id: &str) -> Ordering {
    match (
        a.event_placements.get(event_id),
        b.event_placements.get(event_id),
    ) {
        (Some(pa), Some(pb)) => pa.cmp(pb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
