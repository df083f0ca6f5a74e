//! `intake run` – extract every pending form of a run instance.

use anyhow::{bail, Context, Result};
use intake_core::config::IntakeConfig;
use intake_core::extract::OpenAiClient;
use intake_core::runs;
use intake_core::scheduler::{self, RunSummary};
use std::sync::Arc;
use std::time::Duration;

const API_KEY_VAR: &str = "OPENAI_API_KEY";

pub async fn run_pipeline(cfg: &IntakeConfig, requested_run: Option<&str>) -> Result<()> {
    let api_key = match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => bail!("{API_KEY_VAR} is not set"),
    };
    let client = OpenAiClient::new(
        cfg.api_base.clone(),
        api_key,
        cfg.extraction_model.clone(),
        Duration::from_secs(cfg.request_timeout_secs),
    );
    tracing::info!(model = client.model(), "extraction client ready");

    let run_id = runs::resolve_run_id(&cfg.output_dir, requested_run, &chrono::Local::now())
        .context("cannot start run")?;
    let ctx = scheduler::context_from_config(cfg, &run_id);
    if requested_run.is_some() && !ctx.progress_path.exists() {
        tracing::warn!(run_id = %run_id, "no progress file for requested run; starting it fresh");
    }
    println!("Run {run_id}: output {}", ctx.output_path.display());

    let summary = scheduler::run_batch(cfg, &ctx, Arc::new(client))
        .await
        .context("cannot start run")?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    if summary.nothing_to_do() {
        println!(
            "All {} document(s) already processed; nothing to do.",
            summary.total_documents
        );
        return;
    }
    println!(
        "Attempted {}, succeeded {}, failed {} ({} row(s) appended, {} already processed).",
        summary.attempted,
        summary.succeeded,
        summary.failed,
        summary.rows_appended,
        summary.already_processed
    );
    println!(
        "  {:.1}s elapsed, {:.2} docs/s, peak {} in flight",
        summary.elapsed_secs,
        summary.docs_per_sec(),
        summary.peak_in_flight
    );
    if !summary.failures.is_empty() {
        println!("Failed documents (rerun with the same --run-id to retry):");
        for f in &summary.failures {
            println!("  {}: {}", f.id, f.error);
        }
    }
}
