//! Assemble a run from configuration: every fatal check happens here, before
//! any extraction call is scheduled.

use std::path::Path;
use std::sync::Arc;

use crate::config::IntakeConfig;
use crate::error::StartupError;
use crate::extract::ExtractionClient;
use crate::inputs;
use crate::progress::{ProgressFile, ProgressStore};
use crate::reference::ReferenceContext;
use crate::sink::{CsvSink, OutputSchema};

use super::orchestrator::{Orchestrator, RunContext};
use super::summary::RunSummary;

/// Run context for `run_id` with tuning taken from `cfg`.
pub fn context_from_config(cfg: &IntakeConfig, run_id: &str) -> RunContext {
    RunContext::new(&cfg.output_dir, run_id)
        .with_concurrency_limit(cfg.concurrency_limit)
        .with_commit_order(cfg.commit_order)
        .with_retry(cfg.retry_policy())
}

/// Reference vocabulary for the configured report (empty hints if none configured).
pub fn load_reference(cfg: &IntakeConfig) -> Result<ReferenceContext, StartupError> {
    match &cfg.reference_report {
        Some(path) => ReferenceContext::load(path, cfg.target_year.clone()),
        None => Ok(ReferenceContext::new(cfg.target_year.clone())),
    }
}

/// Run one batch end to end.
///
/// Order of fatal checks: input directory, output template, reference report,
/// output table header, progress file. Per-document failures never surface
/// as `Err`; they are in the returned summary.
pub async fn run_batch(
    cfg: &IntakeConfig,
    ctx: &RunContext,
    client: Arc<dyn ExtractionClient>,
) -> Result<RunSummary, StartupError> {
    let documents = inputs::list(&cfg.input_dir)?;
    tracing::info!(count = documents.len(), dir = %cfg.input_dir.display(), "found images to process");

    let schema = OutputSchema::from_template(&cfg.template_path)?;
    let reference = Arc::new(load_reference(cfg)?);
    let sink = Arc::new(CsvSink::initialize(&ctx.output_path, schema)?);
    let progress = Arc::new(ProgressFile::new(&ctx.progress_path));

    tracing::info!(
        run_id = %ctx.run_id,
        output = %ctx.output_path.display(),
        progress = %ctx.progress_path.display(),
        "run initialized"
    );

    let orchestrator = Orchestrator::new(client, reference, progress, sink, ctx);
    orchestrator.run(documents).await
}

/// Counts for a run without calling the extraction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub run_id: String,
    pub total_documents: usize,
    pub processed: usize,
    /// Progress entries with no matching input file (e.g. inputs moved away).
    pub unknown: usize,
    pub pending: Vec<String>,
}

/// Fails with [`StartupError::UnknownRun`] when the run has no progress file.
pub fn run_status(input_dir: &Path, ctx: &RunContext) -> Result<RunStatus, StartupError> {
    if !ctx.progress_path.exists() {
        return Err(StartupError::UnknownRun {
            run_id: ctx.run_id.clone(),
            path: ctx.progress_path.clone(),
        });
    }
    let documents = inputs::list(input_dir)?;
    let processed = ProgressFile::new(&ctx.progress_path)
        .load()
        .map_err(StartupError::Progress)?;
    let pending: Vec<String> = documents
        .iter()
        .filter(|d| !processed.contains(&d.id))
        .map(|d| d.id.clone())
        .collect();
    let known = documents.len() - pending.len();
    Ok(RunStatus {
        run_id: ctx.run_id.clone(),
        total_documents: documents.len(),
        processed: known,
        unknown: processed.len().saturating_sub(known),
        pending,
    })
}
