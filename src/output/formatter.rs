use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scoring::{format_value, ParseResult, RankedResult, RoundsResult, WorkoutScheme};
use crate::standings::{EventStandings, Standings};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format points with at most two decimals, dropping trailing zeros
/// (95 -> "95", 97.50 -> "97.5", -12.25 -> "-12.25")
pub fn format_points(points: f64) -> String {
    let formatted = format!("{:.2}", points);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Rank label: "T3" when the rank is shared
fn format_rank(rank: u32, tied: bool) -> String {
    if tied {
        format!("T{}", rank)
    } else {
        rank.to_string()
    }
}

/// Rows are in rank order, so a shared rank always sits next to its twin.
fn tied_flags<T>(rows: &[T], rank: impl Fn(&T) -> u32) -> Vec<bool> {
    (0..rows.len())
        .map(|i| {
            let current = rank(&rows[i]);
            let before = i.checked_sub(1).is_some_and(|p| rank(&rows[p]) == current);
            let after = rows.get(i + 1).is_some_and(|next| rank(next) == current);
            before || after
        })
        .collect()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn fit_name(name: &str, fixed_width: usize, term_width: Option<usize>) -> String {
    match term_width {
        Some(width) if width > fixed_width + 10 => truncate_name(name, width - fixed_width),
        // Very narrow terminal, show truncated
        Some(_) => truncate_name(name, 20),
        // No terminal (pipe), don't truncate
        None => name.to_string(),
    }
}

/// Format the overall standings: rank, points, name, then per-event placements
///
/// Rank column is 4 chars (fits "T999"), points column 8 chars, both
/// right-aligned.
pub fn format_standings_table(standings: &Standings, use_colors: bool) -> String {
    if standings.overall.is_empty() {
        return "No athletes registered.".to_string();
    }

    let term_width = get_terminal_width();
    let rank_width = 4;
    let points_width = 8;
    let separator = "  ";
    let tied = tied_flags(&standings.overall, |r| r.rank);

    let header = if use_colors {
        format!("{}", standings.competition.bold())
    } else {
        standings.competition.clone()
    };

    let rows = standings.overall.iter().zip(tied).map(|(result, tied)| {
        let rank_str = format!("{:>w$}", format_rank(result.rank, tied), w = rank_width);
        let points_str = format!("{:>w$}", format_points(result.total_points), w = points_width);
        let placements = format_placements(standings, result);

        let fixed_width = rank_width + points_width + separator.len() * 3 + placements.len();
        let name = fit_name(
            standings.athlete_name(&result.user_id),
            fixed_width,
            term_width,
        );

        if use_colors {
            let rank_colored = if result.rank == 1 {
                format!("{}", rank_str.yellow().bold())
            } else {
                format!("{}", rank_str.dimmed())
            };
            format!(
                "{}{}{}{}{}{}{}",
                rank_colored,
                separator,
                points_str.bold(),
                separator,
                name,
                separator,
                placements.dimmed()
            )
        } else {
            format!(
                "{}{}{}{}{}{}{}",
                rank_str, separator, points_str, separator, name, separator, placements
            )
        }
    });

    std::iter::once(header)
        .chain(rows)
        .map(|line| line.trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// "event:place" pairs in event order, "-" where the athlete has no placement
fn format_placements(standings: &Standings, result: &RankedResult) -> String {
    standings
        .events
        .iter()
        .map(|event| {
            let place = event
                .rows
                .iter()
                .find(|row| row.user_id == result.user_id)
                .map(|row| row.rank.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("{}:{}", event.event_id, place)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format one event: rank, points, name, result (and tie-break when present)
pub fn format_event_table(event: &EventStandings, standings: &Standings, use_colors: bool) -> String {
    let title = format!("{} ({})", event.name, event.scheme);
    let header = if use_colors {
        format!("{}", title.bold())
    } else {
        title
    };

    if event.rows.is_empty() {
        return format!("{}\nNo results entered.", header);
    }

    let term_width = get_terminal_width();
    let rank_width = 4;
    let points_width = 8;
    let separator = "  ";
    let tied = tied_flags(&event.rows, |r| r.rank);

    let rows = event.rows.iter().zip(tied).map(|(row, tied)| {
        let rank_str = format!("{:>w$}", format_rank(row.rank, tied), w = rank_width);
        let points_str = format!("{:>w$}", format_points(row.points), w = points_width);
        let result = match &row.tiebreak {
            Some(tiebreak) => format!("{} (tb {})", row.display, tiebreak),
            None => row.display.clone(),
        };

        let fixed_width = rank_width + points_width + separator.len() * 3 + result.len();
        let name = fit_name(standings.athlete_name(&row.user_id), fixed_width, term_width);

        if use_colors {
            let result_colored = if row.status.has_value() {
                format!("{}", result.cyan())
            } else {
                format!("{}", result.red())
            };
            format!(
                "{}{}{}{}{}{}{}",
                rank_str.dimmed(),
                separator,
                points_str.bold(),
                separator,
                name,
                separator,
                result_colored
            )
        } else {
            format!(
                "{}{}{}{}{}{}{}",
                rank_str, separator, points_str, separator, name, separator, result
            )
        }
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format overall standings as tab-separated values for scripting
/// Columns: rank, athlete id, name, total points (no headers, no colors)
pub fn format_standings_tsv(standings: &Standings) -> String {
    standings
        .overall
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}",
                r.rank,
                r.user_id,
                standings.athlete_name(&r.user_id),
                format_points(r.total_points)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one event as tab-separated values
/// Columns: rank, athlete id, name, status, result, points
pub fn format_event_tsv(event: &EventStandings, standings: &Standings) -> String {
    event
        .rows
        .iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                row.rank,
                row.user_id,
                standings.athlete_name(&row.user_id),
                row.status.as_str(),
                row.display,
                format_points(row.points)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty JSON for any serializable report
pub fn format_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

/// Describe a single parse for the terminal
pub fn format_parse_result(result: &ParseResult, use_colors: bool) -> String {
    let mut lines = Vec::new();

    let verdict = match (&result.error, result.is_valid) {
        (Some(error), _) => format!("invalid: {}", error),
        (None, true) => "valid".to_string(),
        (None, false) => "empty".to_string(),
    };
    lines.push(if use_colors {
        if result.is_valid {
            format!("{}", verdict.green())
        } else {
            format!("{}", verdict.red())
        }
    } else {
        verdict
    });

    if !result.formatted.is_empty() {
        lines.push(format!("  Formatted: {}", result.formatted));
    }
    if let Some(value) = result.raw_value {
        lines.push(format!("  Raw value: {}", value));
    }
    if let Some(status) = result.score_status {
        lines.push(format!("  Status: {}", status.label()));
    }
    if result.needs_tie_break {
        lines.push("  Tie-break: required".to_string());
    }
    if let Some(warning) = &result.warning {
        let line = format!("  Warning: {}", warning);
        lines.push(if use_colors {
            format!("{}", line.yellow())
        } else {
            line
        });
    }

    lines.join("\n")
}

/// Describe a multi-round aggregation for the terminal
pub fn format_rounds_result(result: &RoundsResult, scheme: WorkoutScheme, use_colors: bool) -> String {
    let mut lines: Vec<String> = result
        .rounds
        .iter()
        .enumerate()
        .map(|(i, round)| {
            let text = match &round.error {
                Some(error) => format!("invalid: {}", error),
                None if round.formatted.is_empty() => "-".to_string(),
                None => round.formatted.clone(),
            };
            format!("{:>3}. {}", i + 1, text)
        })
        .collect();

    let total = match result.aggregated {
        Some(value) => format!("{} ({})", format_value(value, scheme), value),
        None => "no value".to_string(),
    };
    let line = format!("  => {}", total);
    lines.push(if use_colors {
        format!("{}", line.bold())
    } else {
        line
    });

    lines.join("\n")
}
