use serde::Serialize;

use super::types::{ScoreStatus, TiebreakScheme, WorkoutScheme};

/// Rounds+reps are packed into one number so a plain numeric sort orders them.
pub const ROUNDS_MULTIPLIER: f64 = 1000.0;

const MAX_PLAUSIBLE_SECONDS: f64 = 4.0 * 3600.0;
const MAX_PLAUSIBLE_COUNT: f64 = 10_000.0;

/// Result of interpreting one free-text score entry.
///
/// `warning` marks a usable but unusual value (the caller may ask for a
/// confirmation); `error` marks input that cannot be interpreted and always
/// comes with `is_valid == false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub is_valid: bool,
    pub raw_value: Option<f64>,
    pub formatted: String,
    pub score_status: Option<ScoreStatus>,
    pub needs_tie_break: bool,
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl ParseResult {
    fn empty() -> Self {
        Self {
            is_valid: false,
            raw_value: None,
            formatted: String::new(),
            score_status: None,
            needs_tie_break: false,
            warning: None,
            error: None,
        }
    }

    fn invalid(formatted: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            formatted: formatted.into(),
            error: Some(error.into()),
            ..Self::empty()
        }
    }

    fn scored(raw_value: f64, formatted: String) -> Self {
        Self {
            is_valid: true,
            raw_value: Some(raw_value),
            formatted,
            score_status: Some(ScoreStatus::Scored),
            ..Self::empty()
        }
    }

    fn status_only(status: ScoreStatus, formatted: &str) -> Self {
        Self {
            is_valid: true,
            formatted: formatted.to_string(),
            score_status: Some(status),
            ..Self::empty()
        }
    }

    fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    fn with_tie_break(mut self, needs_tie_break: bool) -> Self {
        self.needs_tie_break = needs_tie_break;
        self
    }

    fn with_tie_break_if_valid(self, tiebreak_scheme: Option<TiebreakScheme>) -> Self {
        let needs = self.is_valid && tiebreak_scheme.is_some();
        self.with_tie_break(needs)
    }

    /// True when the entry contributes a comparable raw value.
    pub fn is_value_bearing(&self) -> bool {
        self.is_valid
            && self.raw_value.is_some()
            && self.score_status.is_some_and(|s| s.has_value())
    }
}

/// Parse a raw score entry for the given workout scheme.
///
/// `time_cap` is in seconds. Blank input is not an error: it yields an
/// invalid result without an error message so the caller can decide whether
/// an empty entry is simply incomplete.
pub fn parse_score(
    input: &str,
    scheme: WorkoutScheme,
    time_cap: Option<u32>,
    tiebreak_scheme: Option<TiebreakScheme>,
) -> ParseResult {
    let normalized = normalize(input);
    if normalized.is_empty() {
        return ParseResult::empty();
    }

    match normalized.as_str() {
        "dns" | "did not start" => return ParseResult::status_only(ScoreStatus::Dns, "DNS"),
        "dnf" | "did not finish" => return ParseResult::status_only(ScoreStatus::Dnf, "DNF"),
        "cap" | "c" => return parse_cap(input, scheme, time_cap, tiebreak_scheme),
        _ => {}
    }

    match scheme {
        WorkoutScheme::Time | WorkoutScheme::TimeWithCap => {
            parse_time(&normalized, scheme, time_cap, tiebreak_scheme)
        }
        WorkoutScheme::RoundsReps => parse_rounds_reps(&normalized, tiebreak_scheme),
        WorkoutScheme::Reps | WorkoutScheme::Emom => {
            parse_count(&normalized, "reps", "rep count").with_tie_break_if_valid(tiebreak_scheme)
        }
        WorkoutScheme::Calories => parse_count(&normalized, "cal", "calorie count"),
        WorkoutScheme::Load => parse_quantity(&normalized, "", "load"),
        WorkoutScheme::Meters => parse_quantity(&normalized, "m", "distance"),
        WorkoutScheme::Points => parse_quantity(&normalized, " pts", "points"),
        WorkoutScheme::PassFail => parse_pass_fail(&normalized),
    }
}

/// Parse the tie-break value entered next to a main score.
pub fn parse_tiebreak_score(input: &str, tiebreak_scheme: TiebreakScheme) -> ParseResult {
    let normalized = normalize(input);
    if normalized.is_empty() {
        return ParseResult::empty();
    }

    match tiebreak_scheme {
        TiebreakScheme::Time => parse_time(&normalized, WorkoutScheme::Time, None, None),
        TiebreakScheme::Reps => parse_count(&normalized, "reps", "rep count"),
    }
}

fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse_cap(
    input: &str,
    scheme: WorkoutScheme,
    time_cap: Option<u32>,
    tiebreak_scheme: Option<TiebreakScheme>,
) -> ParseResult {
    if scheme != WorkoutScheme::TimeWithCap {
        return ParseResult::invalid(input.trim(), "CAP is only valid for time-capped workouts");
    }

    let formatted = match time_cap {
        Some(cap) => format!("CAP ({})", format_time(cap as f64)),
        None => "CAP".to_string(),
    };

    ParseResult {
        is_valid: true,
        raw_value: time_cap.map(f64::from),
        formatted,
        score_status: Some(ScoreStatus::Cap),
        ..ParseResult::empty()
    }
    .with_tie_break(tiebreak_scheme.is_some())
}

fn parse_time(
    text: &str,
    scheme: WorkoutScheme,
    time_cap: Option<u32>,
    tiebreak_scheme: Option<TiebreakScheme>,
) -> ParseResult {
    if text.starts_with('-') {
        return ParseResult::invalid(text, "Time cannot be negative");
    }

    let total = if text.contains(':') {
        match parse_clock(text) {
            Ok(seconds) => seconds,
            Err((preview, error)) => return ParseResult::invalid(preview, error),
        }
    } else {
        let numeric = strip_unit(text);
        match numeric.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => seconds,
            _ => return ParseResult::invalid(text, "Invalid time format"),
        }
    };

    let formatted = format_time(total);

    if let Some(cap) = time_cap {
        let cap = cap as f64;
        if scheme == WorkoutScheme::TimeWithCap && total == cap {
            return ParseResult {
                score_status: Some(ScoreStatus::Cap),
                ..ParseResult::scored(total, format!("CAP ({})", formatted))
            }
            .with_tie_break(tiebreak_scheme.is_some());
        }
        if total > cap {
            return ParseResult::scored(total, formatted)
                .with_warning(format!("Time exceeds cap of {}", format_time(cap)));
        }
    }

    if total == 0.0 {
        return ParseResult::scored(total, formatted).with_warning("A time of 0:00 is unusual");
    }
    if total > MAX_PLAUSIBLE_SECONDS {
        return ParseResult::scored(total, formatted)
            .with_warning("Time is over 4 hours, please double-check");
    }

    ParseResult::scored(total, formatted)
}

/// Parse `M:SS`, `H:MM:SS` (seconds may carry a fraction).
///
/// On failure returns a best-effort preview alongside the error message.
fn parse_clock(text: &str) -> Result<f64, (String, String)> {
    let parts: Vec<&str> = text.split(':').map(str::trim).collect();
    if parts.len() > 3 {
        return Err((text.to_string(), "Invalid time format".to_string()));
    }

    let (leading, seconds_part) = parts.split_at(parts.len() - 1);
    let mut whole_minutes = 0u64;
    for (i, part) in leading.iter().enumerate() {
        let value: u64 = match part.parse() {
            Ok(v) => v,
            Err(_) if part.is_empty() && i == 0 => 0,
            Err(_) => return Err((text.to_string(), "Invalid time format".to_string())),
        };
        if leading.len() == 2 && i == 1 && value >= 60 {
            return Err((text.to_string(), "Minutes must be less than 60".to_string()));
        }
        whole_minutes = match whole_minutes.checked_mul(60).and_then(|m| m.checked_add(value)) {
            Some(m) => m,
            None => return Err((text.to_string(), "Invalid time format".to_string())),
        };
    }
    let Some(whole_seconds) = whole_minutes.checked_mul(60) else {
        return Err((text.to_string(), "Invalid time format".to_string()));
    };

    let seconds_part = seconds_part[0];
    if seconds_part.is_empty() {
        let preview = format_time(whole_seconds as f64);
        return Err((preview, "Incomplete time: enter seconds".to_string()));
    }

    let seconds: f64 = match seconds_part.parse() {
        Ok(s) if f64::is_finite(s) && !seconds_part.starts_with(['-', '+']) => s,
        _ => return Err((text.to_string(), "Invalid time format".to_string())),
    };
    if seconds >= 60.0 {
        return Err((text.to_string(), "Seconds must be less than 60".to_string()));
    }

    Ok(whole_seconds as f64 + seconds)
}

fn parse_rounds_reps(text: &str, tiebreak_scheme: Option<TiebreakScheme>) -> ParseResult {
    let split = text.split_once('+').or_else(|| text.split_once('.'));

    let Some((rounds_part, reps_part)) = split else {
        return parse_count(text, "reps", "rep count").with_tie_break_if_valid(tiebreak_scheme);
    };

    let rounds_part = rounds_part.trim();
    let reps_part = strip_unit(reps_part.trim());

    if reps_part.is_empty() {
        if let Ok(rounds) = rounds_part.parse::<u32>() {
            return ParseResult::invalid(
                format!("{}+0", rounds),
                "Enter the partial reps after the rounds",
            );
        }
    }

    let (Ok(rounds), Ok(reps)) = (rounds_part.parse::<u32>(), reps_part.parse::<u32>()) else {
        return ParseResult::invalid(
            text,
            "Rounds and reps must be non-negative whole numbers (e.g. 5+12)",
        );
    };

    if reps as f64 >= ROUNDS_MULTIPLIER {
        return ParseResult::invalid(
            format!("{}+{}", rounds, reps),
            "Partial reps must be below 1000",
        );
    }

    ParseResult::scored(
        rounds as f64 * ROUNDS_MULTIPLIER + reps as f64,
        format!("{}+{}", rounds, reps),
    )
    .with_tie_break(tiebreak_scheme.is_some())
}

fn parse_count(text: &str, unit: &str, what: &str) -> ParseResult {
    let value = match parse_non_negative(text, what) {
        Ok(v) => v,
        Err(error) => return ParseResult::invalid(text, error),
    };
    if value.fract() != 0.0 {
        return ParseResult::invalid(text, format!("Invalid {}: must be a whole number", what));
    }

    let result = ParseResult::scored(value, format!("{} {}", format_number(value), unit));
    if value > MAX_PLAUSIBLE_COUNT {
        result.with_warning(format!("{} is an unusually high {}", format_number(value), what))
    } else {
        result
    }
}

fn parse_quantity(text: &str, suffix: &str, what: &str) -> ParseResult {
    match parse_non_negative(text, what) {
        Ok(value) => ParseResult::scored(value, format!("{}{}", format_number(value), suffix)),
        Err(error) => ParseResult::invalid(text, error),
    }
}

fn parse_pass_fail(text: &str) -> ParseResult {
    match text {
        "pass" | "p" => return ParseResult::scored(1.0, "Pass".to_string()),
        "fail" | "f" => return ParseResult::scored(0.0, "Fail".to_string()),
        _ => {}
    }

    match parse_non_negative(text, "pass count") {
        Ok(value) if value.fract() == 0.0 => {
            ParseResult::scored(value, format!("{} passed", format_number(value)))
        }
        Ok(_) => ParseResult::invalid(text, "Rounds passed must be a whole number"),
        Err(_) => ParseResult::invalid(text, "Enter the number of rounds passed, 'pass' or 'fail'"),
    }
}

fn parse_non_negative(text: &str, what: &str) -> Result<f64, String> {
    let numeric = strip_unit(text).replace(',', "");
    if numeric.is_empty() {
        return Err("Invalid input".to_string());
    }
    match numeric.parse::<f64>() {
        Ok(v) if !v.is_finite() => Err(format!("Invalid {}", what)),
        Ok(v) if v < 0.0 => Err(format!("Invalid {}: cannot be negative", what)),
        Ok(v) => Ok(v),
        Err(_) => Err(format!("Invalid {}", what)),
    }
}

/// Drop a trailing unit word such as `lbs`, `reps` or `m`.
fn strip_unit(text: &str) -> &str {
    text.trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value)
    } else {
        let s = format!("{:.3}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Format seconds as `M:SS`, or `H:MM:SS` from one hour up.
pub fn format_time(total_seconds: f64) -> String {
    let total_millis = (total_seconds.max(0.0) * 1000.0).round() as u64;
    let whole = total_millis / 1000;
    let millis = total_millis % 1000;
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let seconds = whole % 60;

    let base = if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    };

    if millis > 0 {
        let fraction = format!(".{:03}", millis);
        format!("{}{}", base, fraction.trim_end_matches('0'))
    } else {
        base
    }
}

/// Render a raw (possibly aggregated) value in the scheme's display format.
pub fn format_value(value: f64, scheme: WorkoutScheme) -> String {
    match scheme {
        WorkoutScheme::Time | WorkoutScheme::TimeWithCap => format_time(value),
        WorkoutScheme::RoundsReps => {
            let rounds = (value / ROUNDS_MULTIPLIER).trunc();
            let reps = value - rounds * ROUNDS_MULTIPLIER;
            format!("{}+{}", format_number(rounds), format_number(reps))
        }
        WorkoutScheme::Reps | WorkoutScheme::Emom => format!("{} reps", format_number(value)),
        WorkoutScheme::Calories => format!("{} cal", format_number(value)),
        WorkoutScheme::Meters => format!("{}m", format_number(value)),
        WorkoutScheme::Points => format!("{} pts", format_number(value)),
        WorkoutScheme::Load => format_number(value),
        WorkoutScheme::PassFail => format!("{} passed", format_number(value)),
    }
}

/// A value more than two standard deviations from the field mean.
///
/// Fields smaller than three never report outliers.
pub fn is_outlier(value: f64, field: &[f64]) -> bool {
    if field.len() < 3 {
        return false;
    }
    let n = field.len() as f64;
    let mean = field.iter().sum::<f64>() / n;
    let variance = field.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (value - mean).abs() > 2.0 * variance.sqrt()
}
