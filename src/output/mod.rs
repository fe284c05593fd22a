pub mod formatter;

pub use formatter::{
    format_event_table, format_event_tsv, format_json, format_parse_result, format_points,
    format_rounds_result, format_standings_table, format_standings_tsv, should_use_colors,
};
