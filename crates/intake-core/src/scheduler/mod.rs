//! Batch scheduler.
//!
//! Coordinates the pipeline: inputs → (minus progress) → budget-gated task →
//! extraction client → output table + progress file → run summary.

mod batch;
mod budget;
mod orchestrator;
mod summary;

pub use batch::{context_from_config, load_reference, run_batch, run_status, RunStatus};
pub use budget::{BudgetPermit, ExtractionBudget, MAX_LIMIT};
pub use orchestrator::{Orchestrator, RunContext};
pub use summary::{DocumentFailure, RunSummary};
