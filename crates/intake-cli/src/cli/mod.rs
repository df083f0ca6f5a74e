//! CLI for the intake-form extraction pipeline.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use intake_core::config::{self, IntakeConfig};
use std::path::PathBuf;

use commands::{run_pipeline, run_status, run_vocab};

#[derive(Debug, Parser)]
#[command(name = "intake")]
#[command(about = "Extract wildlife intake-form records into a CSV table", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Process every image in the input directory not yet recorded for this run.
    Run {
        /// Resume this run id (YYYYMMDD_HHMM), or `latest`. Omit to start a new run.
        #[arg(long, value_name = "ID")]
        run_id: Option<String>,
        /// Maximum number of extraction calls in flight (overrides config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Directory of scanned forms (overrides config).
        #[arg(long, value_name = "DIR")]
        input_dir: Option<PathBuf>,
        /// Directory for output tables and progress files (overrides config).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Show processed/pending counts for a run without calling the service.
    Status {
        /// Run id to inspect; defaults to `latest`.
        #[arg(long, value_name = "ID")]
        run_id: Option<String>,
        /// Directory of scanned forms (overrides config).
        #[arg(long, value_name = "DIR")]
        input_dir: Option<PathBuf>,
        /// Directory for output tables and progress files (overrides config).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Print the species found in the previous years' reference report.
    Vocab {
        /// Also print the conditions listed in the report.
        #[arg(long)]
        conditions: bool,
        /// Reference report CSV to read (overrides config).
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
}

/// Config file values, then environment, then command-line flags.
fn effective_config(input_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Result<IntakeConfig> {
    let mut cfg = config::load_or_init()?;
    cfg.apply_env(|k| std::env::var(k).ok())?;
    if let Some(dir) = input_dir {
        cfg.input_dir = dir;
    }
    if let Some(dir) = output_dir {
        cfg.output_dir = dir;
    }
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                run_id,
                jobs,
                input_dir,
                output_dir,
            } => {
                let mut cfg = effective_config(input_dir, output_dir)?;
                if let Some(n) = jobs {
                    cfg.concurrency_limit = n.clamp(1, intake_core::scheduler::MAX_LIMIT);
                }
                tracing::debug!("effective config: {:?}", cfg);
                run_pipeline(&cfg, run_id.as_deref()).await?;
            }
            CliCommand::Status {
                run_id,
                input_dir,
                output_dir,
            } => {
                let cfg = effective_config(input_dir, output_dir)?;
                run_status(&cfg, run_id.as_deref())?;
            }
            CliCommand::Vocab { conditions, report } => {
                let mut cfg = effective_config(None, None)?;
                if report.is_some() {
                    cfg.reference_report = report;
                }
                run_vocab(&cfg, conditions)?;
            }
        }

        Ok(())
    }
}
