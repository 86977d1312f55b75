//! CLI entry point for cleaning and analyzing election results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use election_prep::config::DEFAULT_OUTPUT_PATH;
use election_prep::{
    CleanerConfig, CleaningError, DatabaseConfig, DatasetAnalyzer, ElectionCleaner, store_cleaned,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clean and analyze constituency-level election results",
    long_about = "Batch cleaner and descriptive analyzer for election results.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  ELECTION_RAW_CSV      Raw input for `clean`\n  \
                  ELECTION_CLEANED_CSV  Cleaned output of `clean`, input of `analyze`\n  \
                  DATABASE_URL          Full PostgreSQL URL for `clean --store`\n  \
                  DB_HOST, DB_PORT, DB_USER, DB_PASSWORD, DB_NAME, DB_TABLE, DB_SSL\n\n\
                  EXAMPLES:\n  \
                  # Clean with the default paths and year window\n  \
                  election-prep clean\n\n  \
                  # Clean a narrower window into a custom file\n  \
                  election-prep clean -i raw.csv -o out/clean.csv --min-year 2004\n\n  \
                  # Clean and replace the PostgreSQL table\n  \
                  election-prep clean --store --table election_data\n\n  \
                  # Describe the cleaned file as JSON\n  \
                  election-prep --json analyze -i cleaned_election_data.csv"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable text
    ///
    /// Disables all logging; only the JSON document is written.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a raw results file and write the cleaned CSV
    Clean(CleanArgs),
    /// Print a descriptive report of a cleaned results file
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Raw results CSV
    #[arg(short, long, env = "ELECTION_RAW_CSV")]
    input: Option<PathBuf>,

    /// Where to write the cleaned CSV (overwritten)
    #[arg(short, long, env = "ELECTION_CLEANED_CSV")]
    output: Option<PathBuf>,

    /// JSON config file; flags given on the command line take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// First election year to keep
    #[arg(long)]
    min_year: Option<i64>,

    /// Last election year to keep
    #[arg(long)]
    max_year: Option<i64>,

    /// Keep Sex values as written instead of mapping them onto MALE/FEMALE/O/UNKNOWN
    #[arg(long)]
    no_sex_canonicalization: bool,

    /// Replace the database table with the cleaned rows afterwards
    #[arg(long)]
    store: bool,

    /// Database table to replace
    #[arg(long)]
    table: Option<String>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Cleaned results CSV
    #[arg(short, long, env = "ELECTION_CLEANED_CSV", default_value = DEFAULT_OUTPUT_PATH)]
    input: PathBuf,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    // .env must be loaded before parsing so clap's `env` fallbacks see it
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet, cli.json);

    let outcome = match &cli.command {
        Command::Clean(args) => run_clean(args, cli.json),
        Command::Analyze(args) => run_analyze(args, cli.json),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e, cli.json);
            ExitCode::FAILURE
        }
    }
}

/// Report a failure.
///
/// In JSON mode the error goes to stdout as `{"error": {code, message}}`,
/// otherwise it is logged.
fn report_failure(error: &anyhow::Error, json: bool) {
    if json {
        let payload = match error.downcast_ref::<CleaningError>() {
            Some(e) => serde_json::json!({ "error": e }),
            None => serde_json::json!({
                "error": { "code": "INTERNAL_ERROR", "message": format!("{:#}", error) }
            }),
        };
        println!("{}", payload);
    } else {
        error!("{:#}", error);
    }
}

/// Merge defaults, the optional config file, the environment and CLI flags.
fn build_config(args: &CleanArgs) -> Result<CleanerConfig> {
    let (base, database) = match &args.config {
        Some(path) => {
            let file = CleanerConfig::from_json_file(path)
                .with_context(|| format!("Loading config {}", path.display()))?;
            let database = file.database.clone();
            (file, database)
        }
        None => (CleanerConfig::default(), DatabaseConfig::from_env()?),
    };

    let mut builder = CleanerConfig::builder().base(base).database(database);

    if args.no_sex_canonicalization {
        builder = builder.canonicalize_sex(false);
    }

    if let Some(ref input) = args.input {
        builder = builder.input_path(input);
    }
    if let Some(ref output) = args.output {
        builder = builder.output_path(output);
    }
    if let Some(year) = args.min_year {
        builder = builder.min_year(year);
    }
    if let Some(year) = args.max_year {
        builder = builder.max_year(year);
    }
    if let Some(ref table) = args.table {
        builder = builder.table(table);
    }

    Ok(builder.build()?)
}

fn run_clean(args: &CleanArgs, json: bool) -> Result<()> {
    let config = build_config(args)?;
    debug!("Cleaner config: {:?}", config);

    let cleaner = ElectionCleaner::new(config);
    let (cleaned, mut summary) = cleaner.run()?;

    if args.store {
        let rows = store_cleaned(&cleaned, &cleaner.config().database)?;
        summary.rows_stored = Some(rows);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary);
    }
    Ok(())
}

fn run_analyze(args: &AnalyzeArgs, json: bool) -> Result<()> {
    let report = DatasetAnalyzer::analyze_file(&args.input)?;
    info!("Analysis complete: {} rows x {} columns", report.rows, report.columns);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn clean_args(argv: &[&str]) -> CleanArgs {
        let cli = Cli::parse_from(argv);
        match cli.command {
            Command::Clean(args) => args,
            Command::Analyze(_) => panic!("expected clean subcommand"),
        }
    }

    fn write_config(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_command_metadata() {
        use clap::CommandFactory;

        let command = Cli::command();
        assert!(command.get_author().is_none());
        assert_eq!(command.get_name(), "election-prep");
    }

    #[test]
    fn test_config_file_disables_sex_canonicalization() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{ "canonicalize_sex": false }"#);
        let path = path.to_str().unwrap();

        let args = clean_args(&["election-prep", "clean", "--config", path]);
        let config = build_config(&args).unwrap();

        assert!(!config.canonicalize_sex);
    }

    #[test]
    fn test_flag_disables_sex_canonicalization() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{ "canonicalize_sex": true }"#);
        let path = path.to_str().unwrap();

        let args = clean_args(&[
            "election-prep",
            "clean",
            "--config",
            path,
            "--no-sex-canonicalization",
        ]);
        let config = build_config(&args).unwrap();

        assert!(!config.canonicalize_sex);
    }

    #[test]
    fn test_cli_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{ "min_year": 1996, "max_year": 2009, "database": { "table": "from_file" } }"#,
        );
        let path = path.to_str().unwrap();

        let args = clean_args(&[
            "election-prep",
            "clean",
            "--config",
            path,
            "--max-year",
            "2014",
            "--table",
            "from_cli",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.min_year, 1996);
        assert_eq!(config.max_year, 2014);
        assert_eq!(config.database.table, "from_cli");
        assert!(config.canonicalize_sex);
    }
}
