//! evibundle - Package incident evidence into a verifiable bundle.

use clap::{Parser, Subcommand, ValueEnum};
use evibundle_common::Error;
use evibundle_packager::bundle;
use evibundle_packager::config::{resolve_case, CaseFile, CaseOverrides, PackConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "evibundle")]
#[command(
    author,
    version,
    about = "Package incident evidence into a verifiable forensic bundle"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash an evidence directory and write a bundle
    Pack {
        /// Evidence directory
        input_dir: PathBuf,

        /// Output bundle file path
        #[arg(long, short, default_value = "evidence_bundle.zip")]
        output: PathBuf,

        /// Case identifier [default: IR-0000]
        #[arg(long)]
        case_id: Option<String>,

        /// Analyst name [default: Unknown]
        #[arg(long)]
        analyst: Option<String>,

        /// Evidence source [default: SOC]
        #[arg(long)]
        source: Option<String>,

        /// Free-form case notes
        #[arg(long)]
        notes: Option<String>,

        /// YAML file with case fields; flags take precedence
        #[arg(long)]
        case_file: Option<PathBuf>,

        /// Replace an existing bundle at the output path
        #[arg(long)]
        force: bool,
    },

    /// Check a bundle's documents against its archived evidence
    Verify {
        /// Bundle file path
        bundle: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            let (kind, code) = match err.downcast_ref::<Error>() {
                Some(e) => (e.kind(), e.exit_code()),
                None => ("Error", 1),
            };
            error!("{}: {:#}", kind, err);
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (text, json) = match format {
        LogFormat::Text => (
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(text)
        .with(json)
        .with(filter)
        .init();
}

fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Pack {
            input_dir,
            output,
            case_id,
            analyst,
            source,
            notes,
            case_file,
            force,
        } => {
            let file = case_file.as_deref().map(CaseFile::load).transpose()?;
            let case = resolve_case(
                file,
                CaseOverrides {
                    case_id,
                    analyst,
                    source,
                    notes,
                },
            )?;

            let config = PackConfig {
                source_dir: input_dir,
                output,
                case,
                overwrite: force,
            };
            let report = evibundle_packager::package_evidence(&config)?;

            println!("Created bundle: {}", report.output.display());
            println!("Files packaged: {}", report.file_count);
        }

        Commands::Verify { bundle } => {
            info!("Validating bundle: {:?}", bundle);
            let result = bundle::validate_bundle_file(&bundle)?;

            if result.valid {
                println!("Bundle is valid");
            } else {
                println!("Bundle validation failed:");
                for error in &result.errors {
                    println!("  - {}", error);
                }
            }

            if !result.warnings.is_empty() {
                println!("Warnings:");
                for warning in &result.warnings {
                    println!("  - {}", warning);
                }
            }

            if !result.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
