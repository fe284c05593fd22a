use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use wod_rank::config::Competition;
use wod_rank::scoring::{ScoreType, TiebreakScheme, WorkoutScheme};
use wod_rank::standings::Standings;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INVALID_SCORE: i32 = 1;
const EXIT_IO: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse one raw score and show how it is read
    Parse {
        /// Workout scheme (time, time-with-cap, rounds-reps, reps, load, ...)
        scheme: WorkoutScheme,
        /// Raw score text, e.g. "12:34", "5+12", "cap", "dnf"
        input: String,
        /// Time cap as a duration ("15m") or seconds
        #[arg(long)]
        time_cap: Option<String>,
        /// Tie-break format recorded with the score
        #[arg(long)]
        tiebreak_scheme: Option<TiebreakScheme>,
    },
    /// Parse several rounds and aggregate them into one value
    Aggregate {
        scheme: WorkoutScheme,
        /// Raw round scores in round order
        #[arg(required = true)]
        rounds: Vec<String>,
        /// min, max, sum, average, first or last (defaults per scheme)
        #[arg(long)]
        score_type: Option<ScoreType>,
        #[arg(long)]
        time_cap: Option<String>,
    },
    /// Show one event's results and points
    Event {
        event_id: String,
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show overall standings (default if no subcommand)
    Standings {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Also write the full standings as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show standings previously saved with --output
    Show {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Check the competition file and report every problem
    Validate,
}

#[derive(Parser, Debug)]
#[command(name = "wod-rank")]
#[command(about = "Competition scoring and ranking CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to competition file (defaults to ~/.config/wod-rank/competition.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let start_time = Instant::now();
    let command = cli.command.unwrap_or(Commands::Standings {
        format: OutputFormat::Table,
        output: None,
    });

    let code = match command {
        Commands::Parse {
            scheme,
            input,
            time_cap,
            tiebreak_scheme,
        } => run_parse(scheme, &input, time_cap.as_deref(), tiebreak_scheme),
        Commands::Aggregate {
            scheme,
            rounds,
            score_type,
            time_cap,
        } => run_aggregate(scheme, &rounds, score_type, time_cap.as_deref()),
        Commands::Event { event_id, format } => run_event(cli.config, &event_id, format),
        Commands::Standings { format, output } => run_standings(cli.config, format, output),
        Commands::Show { file, format } => match wod_rank::standings::load_standings(&file) {
            Ok(standings) => print_standings(&standings, format),
            Err(e) => {
                eprintln!("Failed to load standings: {:#}", e);
                EXIT_IO
            }
        },
        Commands::Validate => run_validate(cli.config),
    };

    log::debug!("finished in {:?}", start_time.elapsed());
    std::process::exit(code);
}

/// `RUST_LOG` wins; otherwise warnings, or debug with --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn parse_cap_arg(time_cap: Option<&str>) -> Result<Option<u32>, i32> {
    match time_cap.map(wod_rank::config::parse_time_cap).transpose() {
        Ok(cap) => Ok(cap),
        Err(e) => {
            eprintln!("Invalid --time-cap: {:#}", e);
            Err(EXIT_INVALID_SCORE)
        }
    }
}

fn run_parse(
    scheme: WorkoutScheme,
    input: &str,
    time_cap: Option<&str>,
    tiebreak_scheme: Option<TiebreakScheme>,
) -> i32 {
    let time_cap = match parse_cap_arg(time_cap) {
        Ok(cap) => cap,
        Err(code) => return code,
    };

    let result = wod_rank::scoring::parse_score(input, scheme, time_cap, tiebreak_scheme);
    let use_colors = wod_rank::output::should_use_colors();
    println!("{}", wod_rank::output::format_parse_result(&result, use_colors));

    if result.is_valid {
        EXIT_SUCCESS
    } else {
        EXIT_INVALID_SCORE
    }
}

fn run_aggregate(
    scheme: WorkoutScheme,
    rounds: &[String],
    score_type: Option<ScoreType>,
    time_cap: Option<&str>,
) -> i32 {
    let time_cap = match parse_cap_arg(time_cap) {
        Ok(cap) => cap,
        Err(code) => return code,
    };
    let score_type = score_type.unwrap_or_else(|| wod_rank::scoring::default_score_type(scheme));
    log::debug!("aggregating {} rounds with {:?}", rounds.len(), score_type);

    let result = wod_rank::scoring::aggregate_rounds(rounds, scheme, score_type, time_cap, None);
    let use_colors = wod_rank::output::should_use_colors();
    println!(
        "{}",
        wod_rank::output::format_rounds_result(&result, scheme, use_colors)
    );

    for warning in result.warnings() {
        eprintln!("Warning: {}", warning);
    }
    if !result.errors().is_empty() || result.aggregated.is_none() {
        return EXIT_INVALID_SCORE;
    }
    EXIT_SUCCESS
}

fn load_competition(path: Option<PathBuf>) -> Result<Competition, i32> {
    wod_rank::config::load_config(path).map_err(|e| {
        eprintln!("Config error: {:#}", e);
        EXIT_CONFIG
    })
}

fn build(path: Option<PathBuf>) -> Result<Standings, i32> {
    let competition = load_competition(path)?;
    let standings = wod_rank::standings::build_standings(&competition).map_err(|e| {
        eprintln!("{:#}", e);
        EXIT_CONFIG
    })?;

    for event in &standings.events {
        for issue in &event.issues {
            eprintln!("Skipped in {}: {}", event.event_id, issue);
        }
    }
    Ok(standings)
}

fn run_standings(path: Option<PathBuf>, format: OutputFormat, output: Option<PathBuf>) -> i32 {
    let standings = match build(path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    if let Some(output) = output {
        if let Err(e) = wod_rank::standings::save_standings(&output, &standings) {
            eprintln!("Failed to write standings: {:#}", e);
            return EXIT_IO;
        }
        eprintln!("Saved standings to {}", output.display());
    }

    print_standings(&standings, format)
}

fn print_standings(standings: &Standings, format: OutputFormat) -> i32 {
    let rendered = match format {
        OutputFormat::Table => {
            let use_colors = wod_rank::output::should_use_colors();
            wod_rank::output::format_standings_table(standings, use_colors)
        }
        OutputFormat::Tsv => wod_rank::output::format_standings_tsv(standings),
        OutputFormat::Json => match wod_rank::output::format_json(standings) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("{:#}", e);
                return EXIT_IO;
            }
        },
    };
    println!("{}", rendered);
    EXIT_SUCCESS
}

fn run_event(path: Option<PathBuf>, event_id: &str, format: OutputFormat) -> i32 {
    let standings = match build(path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let Some(event) = standings.event(event_id) else {
        let known: Vec<&str> = standings.events.iter().map(|e| e.event_id.as_str()).collect();
        eprintln!(
            "Unknown event '{}'. Known events: {}",
            event_id,
            if known.is_empty() {
                "(none)".to_string()
            } else {
                known.join(", ")
            }
        );
        return EXIT_CONFIG;
    };

    let rendered = match format {
        OutputFormat::Table => {
            let use_colors = wod_rank::output::should_use_colors();
            wod_rank::output::format_event_table(event, &standings, use_colors)
        }
        OutputFormat::Tsv => wod_rank::output::format_event_tsv(event, &standings),
        OutputFormat::Json => match wod_rank::output::format_json(event) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("{:#}", e);
                return EXIT_IO;
            }
        },
    };
    println!("{}", rendered);
    EXIT_SUCCESS
}

fn run_validate(path: Option<PathBuf>) -> i32 {
    let competition = match load_competition(path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(errors) = competition.validate() {
        eprintln!("Competition config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return EXIT_CONFIG;
    }

    println!(
        "{}: {} athletes, {} events, {} scoring. OK",
        competition.name,
        competition.athletes.len(),
        competition.events.len(),
        competition.scoring.algorithm.display_name()
    );
    EXIT_SUCCESS
}
