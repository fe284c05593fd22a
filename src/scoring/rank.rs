use std::cmp::Ordering;

use super::types::{RankedResult, ScoreEntry, SortDirection};

/// Standard competition ranks for an already ordered slice.
///
/// `same` tells whether two neighbours share a key. Tied entries take the
/// same rank and the next distinct entry's rank is its 1-based position, so
/// two athletes tied for 1st are followed by 3rd.
pub fn competition_ranks<T, F>(ordered: &[T], same: F) -> Vec<u32>
where
    F: Fn(&T, &T) -> bool,
{
    let mut ranks = Vec::with_capacity(ordered.len());
    for (i, item) in ordered.iter().enumerate() {
        let rank = match i.checked_sub(1) {
            Some(prev) if same(&ordered[prev], item) => ranks[prev],
            _ => i as u32 + 1,
        };
        ranks.push(rank);
    }
    ranks
}

/// Reorder runs of entries that tie on their main result.
///
/// `same` marks neighbours of an already sorted slice as tied. Inside a run,
/// capped athletes with more reps go first. What is still tied is then
/// ordered by tie-break, but only when every member entered one, since a
/// missing tie-break neither beats nor loses to an entered one. Returns a tie
/// class id per item, in the new order.
pub fn split_ties<T, E, S>(items: &mut [T], entry: E, same: S) -> Vec<usize>
where
    E: Fn(&T) -> &ScoreEntry,
    S: Fn(&T, &T) -> bool,
{
    let mut classes = Vec::with_capacity(items.len());
    let mut next_class = 0;
    let mut start = 0;

    while start < items.len() {
        let mut end = start + 1;
        while end < items.len() && same(&items[end - 1], &items[end]) {
            end += 1;
        }

        let run = &mut items[start..end];
        run.sort_by(|a, b| capped_reps_desc(entry(a), entry(b)));
        for group in run.chunk_by_mut(|a, b| capped_reps_desc(entry(a), entry(b)).is_eq()) {
            let by_tiebreak = group.iter().all(|item| entry(item).tiebreak.is_some());
            if by_tiebreak {
                group.sort_by(|a, b| tiebreak_order(entry(a), entry(b)));
            }
            for i in 0..group.len() {
                let split = i > 0
                    && by_tiebreak
                    && tiebreak_order(entry(&group[i - 1]), entry(&group[i])).is_ne();
                if split {
                    next_class += 1;
                }
                classes.push(next_class);
            }
            next_class += 1;
        }
        start = end;
    }
    classes
}

fn capped_reps_desc(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.capped_reps.unwrap_or(0).cmp(&a.capped_reps.unwrap_or(0))
}

fn tiebreak_order(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    match (a.tiebreak, b.tiebreak) {
        (Some(ta), Some(tb)) => {
            let ord = ta.value.partial_cmp(&tb.value).unwrap_or(Ordering::Equal);
            match ta.scheme.sort_direction() {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
        _ => Ordering::Equal,
    }
}

/// Descending comparison for point totals; NaN sorts as equal.
pub fn points_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Rank `(user_id, total_points)` pairs by points, highest first.
///
/// The sort is stable: athletes with equal points keep their input order.
pub fn assign_ranks<S: AsRef<str>>(standings: &[(S, f64)]) -> Vec<RankedResult> {
    let mut ordered: Vec<&(S, f64)> = standings.iter().collect();
    ordered.sort_by(|a, b| points_desc(a.1, b.1));

    let ranks = competition_ranks(&ordered, |a, b| a.1 == b.1);
    ordered
        .into_iter()
        .zip(ranks)
        .map(|((user_id, total_points), rank)| RankedResult {
            user_id: user_id.as_ref().to_string(),
            total_points: *total_points,
            rank,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ScoreStatus, TiebreakScheme};

    #[test]
    fn test_assign_ranks_skips_after_tie() {
        let standings = [("a", 200.0), ("b", 200.0), ("c", 150.0), ("d", 100.0)];
        let ranks: Vec<u32> = assign_ranks(&standings).iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3, 4]);
    }

    #[test]
    fn test_assign_ranks_sorts_descending() {
        let standings = [("low", 10.0), ("high", 90.0), ("mid", 50.0)];
        let result = assign_ranks(&standings);
        let ids: Vec<&str> = result.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
        assert_eq!(result[2].rank, 3);
    }

    #[test]
    fn test_assign_ranks_empty() {
        let standings: [(&str, f64); 0] = [];
        assert!(assign_ranks(&standings).is_empty());
    }

    #[test]
    fn test_tie_rank_skip_invariant() {
        for k in 1..6usize {
            let mut standings: Vec<(String, f64)> =
                (0..k).map(|i| (format!("top-{}", i), 100.0)).collect();
            standings.push(("next".to_string(), 50.0));
            let result = assign_ranks(&standings);
            assert!(result[..k].iter().all(|r| r.rank == 1));
            assert_eq!(result[k].rank, 1 + k as u32);
        }
    }

    #[test]
    fn test_stable_for_equal_points() {
        let standings = [("z", 5.0), ("a", 5.0), ("m", 5.0)];
        let ids: Vec<String> = assign_ranks(&standings)
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_competition_ranks_custom_key() {
        let ordered = [1, 1, 1, 2, 3, 3];
        assert_eq!(
            competition_ranks(&ordered, |a, b| a == b),
            vec![1, 1, 1, 4, 5, 5]
        );
    }

    fn ids_and_classes(entries: &mut [ScoreEntry]) -> (Vec<String>, Vec<usize>) {
        let classes = split_ties(entries, |e| e, |a, b| a.value == b.value);
        (entries.iter().map(|e| e.user_id.clone()).collect(), classes)
    }

    #[test]
    fn test_split_ties_by_time_tiebreak() {
        let mut entries = vec![
            ScoreEntry::new("slow", 5012.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Time, 600.0),
            ScoreEntry::new("fast", 5012.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Time, 510.0),
            ScoreEntry::new("mid", 5012.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Time, 540.0),
        ];
        let (ids, classes) = ids_and_classes(&mut entries);
        assert_eq!(ids, vec!["fast", "mid", "slow"]);
        assert_eq!(competition_ranks(&classes, |a, b| a == b), vec![1, 2, 3]);
    }

    #[test]
    fn test_split_ties_by_reps_tiebreak() {
        let mut entries = vec![
            ScoreEntry::new("a", 754.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Reps, 100.0),
            ScoreEntry::new("b", 754.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Reps, 150.0),
            ScoreEntry::new("c", 754.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Reps, 125.0),
        ];
        let (ids, _) = ids_and_classes(&mut entries);
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_missing_tiebreak_keeps_run_tied() {
        let mut entries = vec![
            ScoreEntry::new("none", 5012.0, ScoreStatus::Scored),
            ScoreEntry::new("entered", 5012.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Time, 510.0),
        ];
        let (ids, classes) = ids_and_classes(&mut entries);
        assert_eq!(ids, vec!["none", "entered"]);
        assert_eq!(classes[0], classes[1]);
    }

    #[test]
    fn test_tiebreak_never_crosses_main_result() {
        let mut entries = vec![
            ScoreEntry::new("better", 5015.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Time, 600.0),
            ScoreEntry::new("worse", 5010.0, ScoreStatus::Scored).with_tiebreak(TiebreakScheme::Time, 300.0),
        ];
        let (ids, classes) = ids_and_classes(&mut entries);
        assert_eq!(ids, vec!["better", "worse"]);
        assert_ne!(classes[0], classes[1]);
    }

    #[test]
    fn test_more_capped_reps_go_first() {
        let mut entries = vec![
            ScoreEntry::new("few", 600.0, ScoreStatus::Cap).with_capped_reps(50),
            ScoreEntry::new("many", 600.0, ScoreStatus::Cap).with_capped_reps(90),
            ScoreEntry::new("also-many", 600.0, ScoreStatus::Cap).with_capped_reps(90),
        ];
        let (ids, classes) = ids_and_classes(&mut entries);
        assert_eq!(ids, vec!["many", "also-many", "few"]);
        assert_eq!(competition_ranks(&classes, |a, b| a == b), vec![1, 1, 3]);
    }
}
