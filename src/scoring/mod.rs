pub mod aggregate;
pub mod algorithms;
pub mod config;
pub mod parser;
pub mod pscore;
pub mod rank;
pub mod tiebreak;
pub mod types;
pub mod validation;

pub use aggregate::{aggregate, aggregate_rounds, RoundsResult};
pub use algorithms::{calculate_event_points, can_have_negative_scores, EventPoints};
pub use config::*;
pub use parser::{format_time, format_value, is_outlier, parse_score, parse_tiebreak_score, ParseResult};
pub use pscore::{calculate_pscore, MedianField, PScoreConfig, PScoreResult};
pub use rank::assign_ranks;
pub use tiebreak::{apply_tiebreakers, AthleteStanding, TiebreakMethod, TiebreakerConfig};
pub use types::*;
pub use validation::validate_scoring;
