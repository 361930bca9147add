//! Nscreen CLI - Command-line interface for the Neurascreen engine
//!
//! Commands:
//! - score: Score a single recorded session (batch mode)
//! - combine: Score a battery of recorded sessions into one report
//! - validate: Validate recorded session schema
//! - doctor: Diagnose engine health and calibration
//! - calibration: Print or check calibration tables

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use neurascreen::config::CalibrationConfig;
use neurascreen::error::ScoringError;
use neurascreen::report::ReportEncoder;
use neurascreen::schema::{RecordedSession, SCHEMA_VERSION};
use neurascreen::session::{score_recorded, ScreeningEngine};
use neurascreen::{ENGINE_VERSION, PRODUCER_NAME};

/// Nscreen - On-device scoring engine for ADHD screening sessions
#[derive(Parser)]
#[command(name = "nscreen")]
#[command(author = "Neurascreen Engineering")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score recorded screening sessions into behavioral reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single recorded session (batch mode)
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Calibration file (defaults to the built-in table)
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Score a battery of recorded sessions into one composite report
    Combine {
        /// Session files, one session per file (use - to read newline-delimited JSON from stdin)
        #[arg(required = true)]
        sessions: Vec<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Calibration file (defaults to the built-in table)
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Emit only the composite block instead of the full report
        #[arg(long)]
        composite_only: bool,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Validate recorded session schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and calibration
    Doctor {
        /// Check a calibration file
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in calibration table as JSON
    Calibration {
        /// Validate a calibration file instead of printing the built-in one
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// A single recorded session document
    Json,
    /// Newline-delimited JSON (one session per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
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

fn run(cli: Cli) -> Result<(), NscreenCliError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            calibration,
            format,
        } => cmd_score(&input, &output, calibration.as_deref(), format),

        Commands::Combine {
            sessions,
            output,
            calibration,
            composite_only,
            format,
        } => cmd_combine(
            &sessions,
            &output,
            calibration.as_deref(),
            composite_only,
            format,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { calibration, json } => cmd_doctor(calibration.as_deref(), json),

        Commands::Calibration { check } => cmd_calibration(check.as_deref()),
    }
}

fn cmd_score(
    input: &PathBuf,
    output: &PathBuf,
    calibration: Option<&Path>,
    format: OutputFormat,
) -> Result<(), NscreenCliError> {
    let input_data = read_input(input)?;
    let session = RecordedSession::from_json(&input_data)?;
    let calibration = load_calibration(calibration)?;

    let result = score_recorded(&session, &calibration)?;

    let output_data = format_output(&result, &format)?;
    write_output(output, &output_data)
}

fn cmd_combine(
    sessions: &[PathBuf],
    output: &PathBuf,
    calibration: Option<&Path>,
    composite_only: bool,
    format: OutputFormat,
) -> Result<(), NscreenCliError> {
    let calibration = load_calibration(calibration)?;
    let mut engine = ScreeningEngine::with_calibration(calibration)?;

    for path in sessions {
        for document in read_session_documents(path)? {
            let session = RecordedSession::from_json(&document)?;
            engine.process_session(&session)?;
        }
    }

    if engine.results().is_empty() {
        return Err(NscreenCliError::NoSessions);
    }

    let composite = engine.composite();

    let output_data = if composite_only {
        format_output(&composite, &format)?
    } else {
        let report =
            ReportEncoder::new().encode(engine.results(), &composite, engine.calibration());
        format_output(&report, &format)?
    };

    write_output(output, &output_data)
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), NscreenCliError> {
    let input_data = read_input(input)?;

    let documents: Vec<&str> = match input_format {
        InputFormat::Json => vec![input_data.as_str()],
        InputFormat::Ndjson => input_data
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect(),
    };

    let mut errors: Vec<ValidationErrorDetail> = Vec::new();

    for (index, document) in documents.iter().enumerate() {
        match serde_json::from_str::<RecordedSession>(document) {
            Ok(session) => {
                if let Err(e) = session.validate() {
                    errors.push(ValidationErrorDetail {
                        index,
                        session_id: session.session_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
            Err(e) => {
                errors.push(ValidationErrorDetail {
                    index,
                    session_id: None,
                    error: e.to_string(),
                });
            }
        }
    }

    let report = ValidationReport {
        total_sessions: documents.len(),
        valid_sessions: documents.len() - errors.len(),
        invalid_sessions: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total sessions:   {}", report.total_sessions);
        println!("Valid sessions:   {}", report.valid_sessions);
        println!("Invalid sessions: {}", report.invalid_sessions);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Session {} (index {}): {}",
                    err.session_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_sessions > 0 {
        Err(NscreenCliError::ValidationFailed(report.invalid_sessions))
    } else {
        Ok(())
    }
}

fn cmd_doctor(calibration: Option<&Path>, json: bool) -> Result<(), NscreenCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Neurascreen version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "session_schema".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    // Check the calibration that scoring would actually use
    match calibration {
        Some(path) => {
            if path.exists() {
                match fs::read_to_string(path) {
                    Ok(content) => match CalibrationConfig::from_json(&content) {
                        Ok(config) => {
                            checks.push(DoctorCheck {
                                name: "calibration".to_string(),
                                status: CheckStatus::Ok,
                                message: format!(
                                    "Calibration file valid (version {})",
                                    config.version
                                ),
                            });
                        }
                        Err(e) => {
                            checks.push(DoctorCheck {
                                name: "calibration".to_string(),
                                status: CheckStatus::Error,
                                message: format!("Invalid calibration: {}", e),
                            });
                        }
                    },
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "calibration".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Cannot read calibration file: {}", e),
                        });
                    }
                }
            } else {
                checks.push(DoctorCheck {
                    name: "calibration".to_string(),
                    status: CheckStatus::Warning,
                    message: "Calibration file does not exist".to_string(),
                });
            }
        }
        None => {
            let config = CalibrationConfig::default();
            let check = match config.validate() {
                Ok(()) => DoctorCheck {
                    name: "calibration".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Built-in calibration valid (version {})", config.version),
                },
                Err(e) => DoctorCheck {
                    name: "calibration".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Built-in calibration invalid: {}", e),
                },
            };
            checks.push(check);
        }
    }

    // Check stdin availability (for piped batch input)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch input ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Nscreen Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(NscreenCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_calibration(check: Option<&Path>) -> Result<(), NscreenCliError> {
    match check {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let config = CalibrationConfig::from_json(&content)?;
            println!("Calibration file valid (version {})", config.version);
        }
        None => {
            println!("{}", CalibrationConfig::default().to_json()?);
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<String, NscreenCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &PathBuf, data: &str) -> Result<(), NscreenCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }

    Ok(())
}

fn read_session_documents(path: &PathBuf) -> Result<Vec<String>, NscreenCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect())
    } else {
        Ok(vec![fs::read_to_string(path)?])
    }
}

fn load_calibration(path: Option<&Path>) -> Result<CalibrationConfig, NscreenCliError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Ok(CalibrationConfig::from_json(&content)?)
        }
        None => Ok(CalibrationConfig::default()),
    }
}

fn format_output<T: serde::Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, NscreenCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum NscreenCliError {
    Io(io::Error),
    Scoring(ScoringError),
    Json(serde_json::Error),
    NoSessions,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for NscreenCliError {
    fn from(e: io::Error) -> Self {
        NscreenCliError::Io(e)
    }
}

impl From<ScoringError> for NscreenCliError {
    fn from(e: ScoringError) -> Self {
        NscreenCliError::Scoring(e)
    }
}

impl From<serde_json::Error> for NscreenCliError {
    fn from(e: serde_json::Error) -> Self {
        NscreenCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<NscreenCliError> for CliError {
    fn from(e: NscreenCliError) -> Self {
        match e {
            NscreenCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            NscreenCliError::Scoring(e) => CliError {
                code: "SCORING_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches the screen.session.v1 schema".to_string()),
            },
            NscreenCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            NscreenCliError::NoSessions => CliError {
                code: "NO_SESSIONS".to_string(),
                message: "No sessions found in input".to_string(),
                hint: Some("Ensure input files are not empty".to_string()),
            },
            NscreenCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} sessions failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            NscreenCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_sessions: usize,
    valid_sessions: usize,
    invalid_sessions: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    session_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
