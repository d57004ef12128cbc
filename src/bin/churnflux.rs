//! churnflux CLI - Command-line interface for churn-flux
//!
//! Commands:
//! - analyze: Score customers and write the analysis table or report
//! - summary: Print summary statistics for a run
//! - export: Write the CRM upload CSV
//! - patterns: Print the active pattern set
//! - doctor: Diagnose configuration and environment

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use churn_flux::encoder::{ReportEncoder, RunInfo};
use churn_flux::export::{CrmExporter, DEFAULT_CRM_EXPORT_PATH};
use churn_flux::patterns::{PatternSet, DEFAULT_PATTERNS_PATH};
use churn_flux::schema::{parse_timestamp, RawTable, TableAdapter};
use churn_flux::types::{ActivityTable, AnalysisResult, CustomerTable};
use churn_flux::{summarize, AnalysisError, ChurnEngine, EngineConfig, PRODUCER_NAME, VERSION};

/// churnflux - Universal customer engagement and churn-risk engine
#[derive(Parser)]
#[command(name = "churnflux")]
#[command(version = VERSION)]
#[command(about = "Classify customers into engagement tiers and score churn risk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score customers and write the analysis table
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Wrap results and summary in a report envelope (JSON formats only)
        #[arg(long)]
        report: bool,
    },

    /// Print summary statistics for a run
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write the CRM upload CSV
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = DEFAULT_CRM_EXPORT_PATH)]
        output: PathBuf,
    },

    /// Print the active pattern set
    Patterns {
        /// Pattern document to load
        #[arg(long, default_value = DEFAULT_PATTERNS_PATH)]
        patterns: PathBuf,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Pattern document to check
        #[arg(long, default_value = DEFAULT_PATTERNS_PATH)]
        patterns: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Customer table (use - for stdin)
    #[arg(long)]
    customers: PathBuf,

    /// Activity table; omit to analyze without activity data
    #[arg(long)]
    activities: Option<PathBuf>,

    /// Input format (inferred from the file extension when omitted)
    #[arg(long)]
    format: Option<InputFormat>,

    /// Reference time for recency (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    as_of: Option<String>,

    /// Pattern document to load
    #[arg(long, default_value = DEFAULT_PATTERNS_PATH)]
    patterns: PathBuf,

    /// Company name recorded in reports
    #[arg(long, default_value = "")]
    company: String,

    /// Business vertical (e.g., ecommerce, gaming)
    #[arg(long, default_value = "unknown")]
    industry: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// JSON array of row objects
    Json,
    /// Newline-delimited JSON (one row per line)
    Ndjson,
    /// CSV with a header row
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// CSV table
    Csv,
}

/// Tables and engine prepared from the shared input flags
struct Run {
    engine: ChurnEngine,
    customers: CustomerTable,
    activities: ActivityTable,
    now: DateTime<Utc>,
}

impl Run {
    fn results(&self) -> Vec<AnalysisResult> {
        self.engine
            .analyze_at(&self.customers, &self.activities, self.now)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ChurnCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            output_format,
            report,
        } => cmd_analyze(&input, &output, output_format, report),
        Commands::Summary { input } => cmd_summary(&input),
        Commands::Export { input, output } => cmd_export(&input, &output),
        Commands::Patterns { patterns } => cmd_patterns(&patterns),
        Commands::Doctor { patterns, json } => cmd_doctor(&patterns, json),
    }
}

fn prepare(input: &InputArgs) -> Result<Run, ChurnCliError> {
    let now = match &input.as_of {
        Some(text) => parse_timestamp(text)?,
        None => Utc::now(),
    };

    check_single_stdin(input)?;

    let customers_raw = read_table(&input.customers, input.format)?;
    let customers = TableAdapter::customers(&customers_raw)?;
    let activities = match &input.activities {
        Some(path) => TableAdapter::activities(&read_table(path, input.format)?)?,
        None => ActivityTable::default(),
    };

    let config = EngineConfig::new(input.company.clone(), input.industry.clone())
        .with_patterns_path(input.patterns.clone());

    Ok(Run {
        engine: ChurnEngine::new(config),
        customers,
        activities,
        now,
    })
}

fn cmd_analyze(
    input: &InputArgs,
    output: &Path,
    output_format: OutputFormat,
    report: bool,
) -> Result<(), ChurnCliError> {
    let run = prepare(input)?;
    let results = run.results();

    let output_data = match (output_format, report) {
        (OutputFormat::Csv, true) => return Err(ChurnCliError::ReportNeedsJson),
        (OutputFormat::Csv, false) => {
            let mut buffer = Vec::new();
            CrmExporter::write_results_csv(&results, &mut buffer)?;
            String::from_utf8_lossy(&buffer).into_owned()
        }
        (format, true) => {
            let summary = summarize(&results);
            let run_info = RunInfo {
                config: run.engine.config(),
                patterns: run.engine.patterns(),
                reference_time: run.now,
                time_column: run.activities.time_column,
            };
            let report = ReportEncoder::new().encode(run_info, results, summary);
            to_json(&report, format)?
        }
        (format, false) => to_json(&results, format)?,
    };

    write_output(output, &output_data)
}

fn cmd_summary(input: &InputArgs) -> Result<(), ChurnCliError> {
    let run = prepare(input)?;
    let summary = run.engine.summarize(&run.results());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_export(input: &InputArgs, output: &Path) -> Result<(), ChurnCliError> {
    let run = prepare(input)?;
    let results = run.results();

    if is_stdio(output) {
        let records = CrmExporter::records(&results, run.now);
        CrmExporter::write_csv(&records, io::stdout().lock())?;
    } else {
        let records = CrmExporter::export_to_path(&results, run.now, output)?;
        eprintln!("CRM export saved to {} ({} rows)", output.display(), records.len());
    }
    Ok(())
}

fn cmd_patterns(path: &Path) -> Result<(), ChurnCliError> {
    let patterns = PatternSet::load(path);
    println!("{}", patterns.to_json()?);
    Ok(())
}

fn cmd_doctor(patterns_path: &Path, json: bool) -> Result<(), ChurnCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, VERSION),
    });

    let pattern_check = if !patterns_path.exists() {
        DoctorCheck {
            name: "patterns".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "{} does not exist, built-in defaults will be used",
                patterns_path.display()
            ),
        }
    } else {
        match PatternSet::try_load(patterns_path) {
            Ok(patterns) => DoctorCheck {
                name: "patterns".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Pattern file valid ({} verticals, {} customers analyzed)",
                    patterns.verticals.len(),
                    patterns.universal.total_customers_analyzed
                ),
            },
            Err(e) => DoctorCheck {
                name: "patterns".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid pattern file ({e}), built-in defaults will be used"),
            },
        }
    };
    checks.push(pattern_check);

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass table files with --customers/--activities)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--customers - reads from it)".to_string(),
        }
    };
    checks.push(stdin_check);

    let healthy = checks.iter().all(|c| c.status != CheckStatus::Error);
    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        healthy,
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} doctor", PRODUCER_NAME);
        for check in &report.checks {
            let symbol = match check.status {
                CheckStatus::Ok => "✓",
                CheckStatus::Warning => "!",
                CheckStatus::Error => "✗",
            };
            println!("  {} {}: {}", symbol, check.name, check.message);
        }
    }

    if healthy {
        Ok(())
    } else {
        Err(ChurnCliError::DoctorFailed)
    }
}

/// stdin can only be consumed once per run
fn check_single_stdin(input: &InputArgs) -> Result<(), ChurnCliError> {
    match &input.activities {
        Some(activities) if is_stdio(&input.customers) && is_stdio(activities) => {
            Err(ChurnCliError::StdinTwice)
        }
        _ => Ok(()),
    }
}

fn read_table(path: &Path, format: Option<InputFormat>) -> Result<RawTable, ChurnCliError> {
    let data = if is_stdio(path) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };

    let table = match format.unwrap_or_else(|| infer_format(path)) {
        InputFormat::Json => RawTable::parse_json(&data)?,
        InputFormat::Ndjson => RawTable::parse_ndjson(&data)?,
        InputFormat::Csv => RawTable::parse_csv_str(&data)?,
    };
    Ok(table)
}

fn infer_format(path: &Path) -> InputFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => InputFormat::Csv,
        Some("ndjson") | Some("jsonl") => InputFormat::Ndjson,
        _ => InputFormat::Json,
    }
}

fn to_json<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<String, ChurnCliError> {
    let text = match format {
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    };
    Ok(text + "\n")
}

fn write_output(output: &Path, data: &str) -> Result<(), ChurnCliError> {
    if is_stdio(output) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data.as_bytes())?;
        stdout.flush()?;
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    healthy: bool,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[derive(Debug)]
enum ChurnCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    ReportNeedsJson,
    StdinTwice,
    DoctorFailed,
}

impl From<io::Error> for ChurnCliError {
    fn from(e: io::Error) -> Self {
        ChurnCliError::Io(e)
    }
}

impl From<AnalysisError> for ChurnCliError {
    fn from(e: AnalysisError) -> Self {
        ChurnCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for ChurnCliError {
    fn from(e: serde_json::Error) -> Self {
        ChurnCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ChurnCliError> for CliError {
    fn from(e: ChurnCliError) -> Self {
        match e {
            ChurnCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ChurnCliError::Analysis(e @ AnalysisError::MissingColumn { .. }) => CliError {
                code: "MISSING_COLUMN".to_string(),
                message: e.to_string(),
                hint: Some("Every table needs a customer_id column".to_string()),
            },
            ChurnCliError::Analysis(e) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the input tables and --format".to_string()),
            },
            ChurnCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            ChurnCliError::ReportNeedsJson => CliError {
                code: "INVALID_ARGS".to_string(),
                message: "--report requires a JSON output format".to_string(),
                hint: Some("Use --output-format json or json-pretty".to_string()),
            },
            ChurnCliError::StdinTwice => CliError {
                code: "INVALID_ARGS".to_string(),
                message: "--customers and --activities cannot both read stdin".to_string(),
                hint: Some("Pass at least one of the tables as a file".to_string()),
            },
            ChurnCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Fix the reported errors and run again".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(customers: &str, activities: Option<&str>) -> InputArgs {
        let mut args = vec!["churnflux", "summary", "--customers", customers];
        if let Some(activities) = activities {
            args.extend(["--activities", activities]);
        }
        match Cli::parse_from(args).command {
            Commands::Summary { input } => input,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_both_tables_from_stdin_rejected() {
        assert!(matches!(
            check_single_stdin(&input("-", Some("-"))),
            Err(ChurnCliError::StdinTwice)
        ));
    }

    #[test]
    fn test_one_table_from_stdin_allowed() {
        assert!(check_single_stdin(&input("-", Some("events.csv"))).is_ok());
        assert!(check_single_stdin(&input("customers.csv", Some("-"))).is_ok());
        assert!(check_single_stdin(&input("-", None)).is_ok());
    }

    #[test]
    fn test_format_inferred_from_extension() {
        assert!(matches!(infer_format(Path::new("a.csv")), InputFormat::Csv));
        assert!(matches!(infer_format(Path::new("a.jsonl")), InputFormat::Ndjson));
        assert!(matches!(infer_format(Path::new("-")), InputFormat::Json));
    }
}
