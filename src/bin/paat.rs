//! PAAT CLI - Command-line interface for physical activity level estimation
//!
//! Commands:
//! - estimate: Label every sample of a recording as MVPA and/or sedentary
//! - info: Print the device metadata of a GT3X file
//! - config: Print the effective estimator configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

use paat::encoder::{EncodeInput, ReportEncoder};
use paat::io::{Gt3xReader, NdjsonReader, Recording, RecordingReader};
use paat::types::PaLevelRecord;
use paat::{EstimatorConfig, Interval, PaLevelEstimator, PaatError, PAAT_VERSION};

/// PAAT - Physical activity level estimation from raw accelerometry
#[derive(Parser)]
#[command(name = "paat")]
#[command(version = PAAT_VERSION)]
#[command(about = "Estimate MVPA and sedentary behavior from raw accelerometer data", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label every sample as MVPA and/or sedentary behavior
    Estimate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format (guessed from the file extension when omitted)
        #[arg(long)]
        input_format: Option<InputFormat>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Load estimator configuration from a JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// MVPA cutpoint in g (overrides the configuration file)
        #[arg(long)]
        mvpa_cutpoint: Option<f64>,

        /// Sedentary cutpoint in g (overrides the configuration file)
        #[arg(long)]
        sb_cutpoint: Option<f64>,

        /// Epoch width, e.g. "1s", "5 seconds", "1min"; "none" disables resampling
        #[arg(long)]
        interval: Option<String>,
    },

    /// Print the device metadata of a GT3X file
    Info {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective estimator configuration
    Config {
        /// Load configuration from a JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// ActiGraph .gt3x archive
    Gt3x,
    /// Newline-delimited JSON samples {timestamp, y, x, z}
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One {timestamp, mvpa, sb} record per line
    Ndjson,
    /// JSON array of {timestamp, mvpa, sb} records
    Json,
    /// Pretty-printed JSON array
    JsonPretty,
    /// Summary report with the classified epochs
    Report,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str) {
    let level = log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::WARN);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), PaatCliError> {
    match cli.command {
        Commands::Estimate {
            input,
            output,
            input_format,
            output_format,
            config,
            mvpa_cutpoint,
            sb_cutpoint,
            interval,
        } => {
            let config = resolve_config(config.as_deref(), mvpa_cutpoint, sb_cutpoint, interval.as_deref())?;
            cmd_estimate(&input, &output, input_format, output_format, config)
        }

        Commands::Info { input, json } => cmd_info(&input, json),

        Commands::Config { config } => {
            let config = resolve_config(config.as_deref(), None, None, None)?;
            config.validate()?;
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn resolve_config(
    path: Option<&Path>,
    mvpa_cutpoint: Option<f64>,
    sb_cutpoint: Option<f64>,
    interval: Option<&str>,
) -> Result<EstimatorConfig, PaatCliError> {
    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            EstimatorConfig::from_json(path)?
        }
        None => EstimatorConfig::default(),
    };

    if let Some(cutpoint) = mvpa_cutpoint {
        config.mvpa_cutpoint = cutpoint;
    }
    if let Some(cutpoint) = sb_cutpoint {
        config.sb_cutpoint = cutpoint;
    }
    if let Some(interval) = interval {
        config.interval = Interval::parse(interval)?;
    }

    Ok(config)
}

fn cmd_estimate(
    input: &Path,
    output: &Path,
    input_format: Option<InputFormat>,
    output_format: OutputFormat,
    config: EstimatorConfig,
) -> Result<(), PaatCliError> {
    let format = input_format.unwrap_or_else(|| guess_format(input));
    let recording = read_recording(input, format)?;

    if recording.is_empty() {
        return Err(PaatCliError::NoSamples);
    }
    info!(samples = recording.len(), "Loaded recording");

    let estimator = PaLevelEstimator::new(config);
    let epochs = estimator.epochs(&recording.time, &recording.acceleration)?;
    let levels = estimator.levels(&recording.time, &epochs);
    debug!(epochs = epochs.len(), "Classified epochs");

    let output_data = match output_format {
        OutputFormat::Report => {
            let source = source_name(input);
            let device_serial = recording
                .metadata
                .as_ref()
                .and_then(|m| m.serial_number());
            ReportEncoder::new().encode_to_json(&EncodeInput {
                source: &source,
                device_serial,
                time: &recording.time,
                levels: &levels,
                epochs: &epochs,
                config: estimator.config(),
            })? + "\n"
        }
        format => {
            let records: Vec<PaLevelRecord> = recording
                .time
                .iter()
                .zip(&levels)
                .map(|(&timestamp, level)| PaLevelRecord {
                    timestamp,
                    mvpa: level.mvpa,
                    sb: level.sb,
                })
                .collect();
            format_records(&records, format)?
        }
    };

    if is_std_stream(output) {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> Result<(), PaatCliError> {
    let recording = read_recording(input, InputFormat::Gt3x)?;
    let metadata = recording.metadata.unwrap_or_default();

    if json {
        let report = InfoReport {
            fields: &metadata.fields,
            samples: recording.time.len(),
            first_sample_utc: recording.time.first().map(|t| t.to_rfc3339()),
            last_sample_utc: recording.time.last().map(|t| t.to_rfc3339()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("GT3X Info");
        println!("=========");
        for (key, value) in &metadata.fields {
            println!("{:<22} {}", format!("{key}:"), value);
        }
        println!();
        println!("Samples:      {}", recording.time.len());
        if let (Some(first), Some(last)) = (recording.time.first(), recording.time.last()) {
            println!("First sample: {}", first.to_rfc3339());
            println!("Last sample:  {}", last.to_rfc3339());
        }
    }

    Ok(())
}

// Helper functions

fn read_recording(input: &Path, format: InputFormat) -> Result<Recording, PaatCliError> {
    let reader: &dyn RecordingReader = match format {
        InputFormat::Gt3x => &Gt3xReader,
        InputFormat::Ndjson => &NdjsonReader,
    };

    if is_std_stream(input) {
        if atty::is(atty::Stream::Stdin) {
            warn!("Reading {} samples from an interactive terminal", reader.format());
        }
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Ok(reader.read_bytes(&buffer)?)
    } else {
        Ok(reader.read_path(input)?)
    }
}

fn guess_format(input: &Path) -> InputFormat {
    match input.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("gt3x") => InputFormat::Gt3x,
        _ => InputFormat::Ndjson,
    }
}

fn is_std_stream(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn source_name(input: &Path) -> String {
    if is_std_stream(input) {
        return "stdin".to_string();
    }
    input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

fn format_records(records: &[PaLevelRecord], format: OutputFormat) -> Result<String, PaatCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::with_capacity(records.len());
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty | OutputFormat::Report => {
            Ok(serde_json::to_string_pretty(records)? + "\n")
        }
    }
}

// Error types

#[derive(Debug)]
enum PaatCliError {
    Io(io::Error),
    Paat(PaatError),
    Json(serde_json::Error),
    NoSamples,
}

impl From<io::Error> for PaatCliError {
    fn from(e: io::Error) -> Self {
        PaatCliError::Io(e)
    }
}

impl From<PaatError> for PaatCliError {
    fn from(e: PaatError) -> Self {
        PaatCliError::Paat(e)
    }
}

impl From<serde_json::Error> for PaatCliError {
    fn from(e: serde_json::Error) -> Self {
        PaatCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PaatCliError> for CliError {
    fn from(e: PaatCliError) -> Self {
        match e {
            PaatCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PaatCliError::Paat(e) => {
                let (code, hint) = match &e {
                    PaatError::InvalidInterval(_) => {
                        ("INVALID_INTERVAL", "Use a width such as 1s, 5 seconds or 1min")
                    }
                    PaatError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'paat config' to see a valid configuration")
                    }
                    PaatError::Archive(_)
                    | PaatError::MissingEntry(_)
                    | PaatError::Metadata(_)
                    | PaatError::Record { .. }
                    | PaatError::Checksum { .. } => {
                        ("GT3X_ERROR", "Ensure the input is an unmodified ActiGraph .gt3x file")
                    }
                    PaatError::ParseError(_) | PaatError::Json(_) => {
                        ("PARSE_ERROR", "Ensure every line is {\"timestamp\", \"y\", \"x\", \"z\"}")
                    }
                    PaatError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                    PaatError::LengthMismatch { .. }
                    | PaatError::EmptyInput
                    | PaatError::UnsortedTimestamps { .. } => {
                        ("INVALID_INPUT", "Samples must be non-empty and sorted by timestamp")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PaatCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            PaatCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct InfoReport<'a> {
    fields: &'a std::collections::BTreeMap<String, String>,
    samples: usize,
    first_sample_utc: Option<String>,
    last_sample_utc: Option<String>,
}
