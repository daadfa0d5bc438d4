//! hcx - Command-line interface for the Health Connect extractor
//!
//! Commands:
//! - extract: Pull Health Connect records from a connected device into a report
//! - sample: Write a synthetic sample manifest documenting record shapes
//! - doctor: Diagnose adb, device and Health Connect availability

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use env_logger::Env;
use log::warn;

use health_connect_extractor::bridge::{AdbBridge, BridgeError, DeviceBridge};
use health_connect_extractor::extractor::{DEFAULT_DAYS_BACK, DEFAULT_QUERY_TIMEOUT};
use health_connect_extractor::report::TypeSummary;
use health_connect_extractor::sample::seeded_fabricator;
use health_connect_extractor::{
    ExtractError, ExtractionContext, Extractor, ExtractorConfig, QueryOutcome, Report,
    ReportBuilder, SampleFabricator, SampleManifest, EXTRACTOR_VERSION, PRODUCER_NAME,
};

/// hcx - Extract Android Health Connect records over adb
#[derive(Parser)]
#[command(name = "hcx")]
#[command(version = EXTRACTOR_VERSION)]
#[command(about = "Extract Health Connect data from an Android device", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records from the connected device into a JSON report
    Extract {
        /// Days to look back (prompted for when omitted on a terminal)
        #[arg(long)]
        days: Option<u32>,

        /// Device serial (defaults to the first attached device)
        #[arg(long)]
        device: Option<String>,

        /// Path to the adb binary
        #[arg(long, default_value = "adb")]
        adb: PathBuf,

        /// Per-type query timeout in seconds
        #[arg(long, default_value_t = DEFAULT_QUERY_TIMEOUT.as_secs())]
        timeout: u64,

        /// Report file path (defaults to a timestamped name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a synthetic sample manifest
    Sample {
        /// Manifest file path (defaults to a timestamped name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for reproducible values
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Diagnose adb, device and Health Connect availability
    Doctor {
        /// Path to the adb binary
        #[arg(long, default_value = "adb")]
        adb: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!("\nInterrupted");
        std::process::exit(1);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

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

fn run(cli: Cli) -> Result<(), HcxCliError> {
    match cli.command {
        Commands::Extract {
            days,
            device,
            adb,
            timeout,
            output,
        } => cmd_extract(
            days,
            device,
            &adb,
            Duration::from_secs(timeout),
            output.as_deref(),
        ),

        Commands::Sample { output, seed } => cmd_sample(output.as_deref(), seed),

        Commands::Doctor { adb, json } => cmd_doctor(&adb, json),
    }
}

fn cmd_extract(
    days: Option<u32>,
    device: Option<String>,
    adb: &Path,
    timeout: Duration,
    output: Option<&Path>,
) -> Result<(), HcxCliError> {
    let config = ExtractorConfig {
        query_timeout: timeout,
        ..ExtractorConfig::default()
    };
    let extractor = Extractor::with_config(AdbBridge::new(adb), config);

    let device_id = match device {
        Some(id) => id,
        None => extractor.connect()?,
    };
    extractor.check_health_connect(&device_id)?;

    let days_back = match days {
        Some(days) => days,
        None => prompt_days_back()?,
    };

    let ctx = ExtractionContext::new(device_id, days_back);
    let run = extractor.extract_all(&ctx);

    println!("Extraction");
    println!("==========");
    for (data_type, outcome) in &run.outcomes {
        let status = match outcome {
            QueryOutcome::Records(count) => format!("{} records", count),
            QueryOutcome::NoData => "no data or no permission".to_string(),
            QueryOutcome::TimedOut => "timed out".to_string(),
            QueryOutcome::Failed(reason) => format!("failed ({})", reason),
        };
        println!("  {:<22} {}", data_type, status);
    }

    let report = ReportBuilder::build(&ctx, run.records);

    println!("\nSummary");
    println!("=======");
    println!("Device:           {}", ctx.device_id);
    println!("Days back:        {}", ctx.days_back);
    println!("Total records:    {}", report.total_records());
    println!(
        "Types with data:  {}/{}",
        report.successful_types(),
        report.statistics.len()
    );
    for entry in report.summary() {
        if let Some(line) = summary_line(&entry)? {
            println!("{}", line);
        }
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(Report::default_file_name()));
    let bytes = report.write_to(&path)?;
    println!("\nReport saved: {} ({} bytes)", path.display(), bytes);

    Ok(())
}

/// Count, latest timestamp and latest value; `None` for types without data
fn summary_line(entry: &TypeSummary<'_>) -> Result<Option<String>, serde_json::Error> {
    let Some(latest) = entry.latest else {
        return Ok(None);
    };
    Ok(Some(format!(
        "  {:<22} {:>6}  latest {} {}",
        entry.data_type,
        entry.count,
        latest.timestamp,
        serde_json::to_string(&latest.value)?
    )))
}

/// Ask for the look-back window when attached to a terminal
fn prompt_days_back() -> Result<u32, HcxCliError> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(DEFAULT_DAYS_BACK);
    }

    print!("How many days back to extract? (default {}): ", DEFAULT_DAYS_BACK);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(parse_days_back(&line))
}

fn parse_days_back(input: &str) -> u32 {
    input.trim().parse().unwrap_or(DEFAULT_DAYS_BACK)
}

fn cmd_sample(output: Option<&Path>, seed: Option<u64>) -> Result<(), HcxCliError> {
    let manifest = match seed {
        Some(seed) => seeded_fabricator(Utc::now(), seed).manifest(),
        None => SampleFabricator::new().manifest(),
    };

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(SampleManifest::default_file_name()));
    let bytes = manifest.write_to(&path)?;

    println!("Sample Manifest");
    println!("===============");
    for (data_type, set) in &manifest.data_types {
        println!("  {:<22} {} samples", data_type, set.samples.len());
    }
    println!("\nSample data saved: {} ({} bytes)", path.display(), bytes);
    println!("Note: values are synthetic; real data requires a device with Health Connect");

    Ok(())
}

fn cmd_doctor(adb: &Path, json: bool) -> Result<(), HcxCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "extractor_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Extractor version {}", EXTRACTOR_VERSION),
    });

    let extractor = Extractor::new(AdbBridge::new(adb));

    match extractor.bridge().list_devices() {
        Ok(devices) => {
            checks.push(DoctorCheck {
                name: "adb".to_string(),
                status: CheckStatus::Ok,
                message: format!("{} is available", adb.display()),
            });

            match devices.first() {
                Some(device_id) => {
                    checks.push(DoctorCheck {
                        name: "device".to_string(),
                        status: if devices.len() > 1 {
                            CheckStatus::Warning
                        } else {
                            CheckStatus::Ok
                        },
                        message: if devices.len() > 1 {
                            format!("{} devices attached, using {}", devices.len(), device_id)
                        } else {
                            format!("Device {} attached", device_id)
                        },
                    });
                    checks.push(health_connect_check(&extractor, device_id));
                }
                None => checks.push(DoctorCheck {
                    name: "device".to_string(),
                    status: CheckStatus::Error,
                    message: "No device attached".to_string(),
                }),
            }
        }
        Err(BridgeError::ToolMissing(path)) => checks.push(DoctorCheck {
            name: "adb".to_string(),
            status: CheckStatus::Error,
            message: format!("{} not found", path.display()),
        }),
        Err(e) => checks.push(DoctorCheck {
            name: "adb".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (days back will be prompted for)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: format!("stdin is not a TTY (days back defaults to {})", DEFAULT_DAYS_BACK),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: EXTRACTOR_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("hcx Doctor Report");
        println!("=================");
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
        Err(HcxCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn health_connect_check<B: DeviceBridge>(extractor: &Extractor<B>, device_id: &str) -> DoctorCheck {
    match extractor.check_health_connect(device_id) {
        Ok(()) => DoctorCheck {
            name: "health_connect".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} installed", extractor.config().package),
        },
        Err(e) => DoctorCheck {
            name: "health_connect".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    }
}

// Error handling

#[derive(Debug)]
enum HcxCliError {
    Extract(ExtractError),
    Io(io::Error),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<ExtractError> for HcxCliError {
    fn from(e: ExtractError) -> Self {
        HcxCliError::Extract(e)
    }
}

impl From<io::Error> for HcxCliError {
    fn from(e: io::Error) -> Self {
        HcxCliError::Io(e)
    }
}

impl From<serde_json::Error> for HcxCliError {
    fn from(e: serde_json::Error) -> Self {
        HcxCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HcxCliError> for CliError {
    fn from(e: HcxCliError) -> Self {
        match e {
            HcxCliError::Extract(e) => {
                let (code, hint) = match &e {
                    ExtractError::NoDevice => (
                        "NO_DEVICE",
                        Some("Connect a device with USB debugging enabled and authorize this computer"),
                    ),
                    ExtractError::HealthConnectMissing(_) => (
                        "HEALTH_CONNECT_MISSING",
                        Some("Install Health Connect from Google Play"),
                    ),
                    ExtractError::Bridge(BridgeError::ToolMissing(_)) => (
                        "ADB_NOT_FOUND",
                        Some("Install Android SDK Platform Tools or pass --adb"),
                    ),
                    ExtractError::Bridge(_) => {
                        ("BRIDGE_ERROR", Some("Run 'hcx doctor' to check the connection"))
                    }
                    ExtractError::MalformedNumber { .. } => ("PARSE_ERROR", None),
                    ExtractError::JsonError(_) => ("JSON_ERROR", None),
                    ExtractError::Io(_) => {
                        ("IO_ERROR", Some("Check file paths and permissions"))
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
            HcxCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HcxCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            HcxCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

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
