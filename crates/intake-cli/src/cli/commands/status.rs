//! `intake status` – processed/pending counts for a run.

use anyhow::{Context, Result};
use intake_core::config::IntakeConfig;
use intake_core::runs;
use intake_core::scheduler;

pub fn run_status(cfg: &IntakeConfig, requested_run: Option<&str>) -> Result<()> {
    let requested = requested_run.unwrap_or(runs::LATEST);
    let run_id = runs::resolve_run_id(&cfg.output_dir, Some(requested), &chrono::Local::now())?;
    let ctx = scheduler::context_from_config(cfg, &run_id);
    let status = scheduler::run_status(&cfg.input_dir, &ctx)
        .with_context(|| format!("status of run {run_id}"))?;

    println!(
        "Run {}: {} / {} processed, {} pending",
        status.run_id,
        status.processed,
        status.total_documents,
        status.pending.len()
    );
    if status.unknown > 0 {
        println!("  {} recorded id(s) have no matching input file", status.unknown);
    }
    for id in &status.pending {
        println!("  pending: {id}");
    }
    Ok(())
}
