//! Drive one run: compute remaining work, schedule document tasks under the
//! extraction budget, commit results, and aggregate the outcome.
//!
//! Per document: `Pending → InFlight → {Completed | Failed}`. Completed means
//! the records are in the output table and the identifier is in the progress
//! set. Failed documents are logged and left out of the progress set so the
//! next run picks them up. All spawned tasks are drained before returning.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::CommitOrder;
use crate::error::{DocumentError, StartupError};
use crate::extract::{ExtractionClient, ExtractionError};
use crate::inputs::DocumentRef;
use crate::progress::ProgressStore;
use crate::reference::ReferenceContext;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::runs;
use crate::sink::ResultSink;

use super::budget::{ExtractionBudget, MAX_LIMIT};
use super::summary::{DocumentFailure, RunSummary};

/// Everything that identifies and tunes one run instance.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub output_path: PathBuf,
    pub progress_path: PathBuf,
    pub concurrency_limit: usize,
    pub commit_order: CommitOrder,
    pub retry: RetryPolicy,
}

impl RunContext {
    /// Context for `run_id` under `output_dir`, with default tuning.
    pub fn new(output_dir: &Path, run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            output_path: runs::output_path(output_dir, run_id),
            progress_path: runs::progress_path(output_dir, run_id),
            concurrency_limit: 5,
            commit_order: CommitOrder::default(),
            retry: RetryPolicy::single_attempt(),
        }
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    pub fn with_commit_order(mut self, order: CommitOrder) -> Self {
        self.commit_order = order;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Shared, read-only pieces a document task needs.
struct TaskDeps {
    client: Arc<dyn ExtractionClient>,
    reference: Arc<ReferenceContext>,
    progress: Arc<dyn ProgressStore>,
    sink: Arc<dyn ResultSink>,
    commit_order: CommitOrder,
    retry: RetryPolicy,
}

pub struct Orchestrator {
    deps: Arc<TaskDeps>,
    budget: Arc<ExtractionBudget>,
}

impl Orchestrator {
    /// `sink` must already be initialized; `progress` may be empty.
    pub fn new(
        client: Arc<dyn ExtractionClient>,
        reference: Arc<ReferenceContext>,
        progress: Arc<dyn ProgressStore>,
        sink: Arc<dyn ResultSink>,
        ctx: &RunContext,
    ) -> Self {
        Self {
            deps: Arc::new(TaskDeps {
                client,
                reference,
                progress,
                sink,
                commit_order: ctx.commit_order,
                retry: ctx.retry,
            }),
            budget: Arc::new(ExtractionBudget::new(ctx.concurrency_limit)),
        }
    }

    pub fn budget(&self) -> &ExtractionBudget {
        &self.budget
    }

    /// Process every listed document not yet in the progress set.
    ///
    /// Only a progress-file read failure is fatal here; per-document failures
    /// are counted in the summary.
    pub async fn run(&self, documents: Vec<DocumentRef>) -> Result<RunSummary, StartupError> {
        let start = Instant::now();
        let processed = self.deps.progress.load().map_err(StartupError::Progress)?;

        let total_documents = documents.len();
        let remaining: Vec<DocumentRef> = documents
            .into_iter()
            .filter(|d| !processed.contains(&d.id))
            .collect();
        let already_processed = total_documents - remaining.len();

        tracing::info!(
            total = total_documents,
            already_processed,
            remaining = remaining.len(),
            "progress loaded"
        );

        let mut summary = RunSummary {
            total_documents,
            already_processed,
            attempted: remaining.len(),
            ..RunSummary::default()
        };
        if remaining.is_empty() {
            tracing::info!("all documents already processed");
            return Ok(summary);
        }

        tracing::info!(limit = self.budget.limit(), "starting concurrent extraction");
        let mut join_set = tokio::task::JoinSet::new();
        for doc in remaining {
            let deps = Arc::clone(&self.deps);
            let budget = Arc::clone(&self.budget);
            join_set.spawn(async move {
                let id = doc.id.clone();
                let result = run_document(deps, budget, doc).await;
                (id, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((id, Ok(rows))) => {
                    summary.succeeded += 1;
                    summary.rows_appended += rows;
                    tracing::info!(doc = %id, rows, "completed document");
                }
                Ok((id, Err(e))) => {
                    summary.failed += 1;
                    tracing::error!(doc = %id, error = %e, "failed to process document");
                    summary.failures.push(DocumentFailure {
                        id,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(error = %e, "document task join failed");
                    summary.failures.push(DocumentFailure {
                        id: "<unknown>".to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        summary.failures.sort_by(|a, b| a.id.cmp(&b.id));
        summary.peak_in_flight = self.budget.peak();
        summary.elapsed_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            rows = summary.rows_appended,
            "processing completed"
        );
        Ok(summary)
    }
}

/// Acquire a permit, then run the blocking extract-and-commit step while holding it.
async fn run_document(
    deps: Arc<TaskDeps>,
    budget: Arc<ExtractionBudget>,
    doc: DocumentRef,
) -> Result<usize, DocumentError> {
    let _permit = budget
        .acquire()
        .await
        .map_err(|e| DocumentError::Task(e.to_string()))?;
    tokio::task::spawn_blocking(move || process_document(&deps, &doc))
        .await
        .map_err(|e| DocumentError::Task(e.to_string()))?
}

/// Read, extract (with the configured retry policy), then commit in the
/// configured order. Returns the number of rows appended.
fn process_document(deps: &TaskDeps, doc: &DocumentRef) -> Result<usize, DocumentError> {
    tracing::info!(doc = %doc.id, "processing document");
    let document = doc.load().map_err(ExtractionError::ReadDocument)?;

    let records = run_with_retry(&deps.retry, |attempt| {
        if attempt > 1 {
            tracing::info!(doc = %doc.id, attempt, "retrying extraction");
        }
        deps.client.submit(&document, &deps.reference)
    })?;
    tracing::debug!(doc = %doc.id, records = records.len(), "received records");

    let rows = match deps.commit_order {
        CommitOrder::AppendThenRecord => {
            let rows = deps.sink.append(&records)?;
            deps.progress.record(&doc.id)?;
            rows
        }
        CommitOrder::RecordThenAppend => {
            deps.progress.record(&doc.id)?;
            deps.sink.append(&records)?
        }
    };
    Ok(rows)
}
