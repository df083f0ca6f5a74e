//! Error taxonomy for a batch run.
//!
//! - [`StartupError`]: fatal, raised before any document is scheduled.
//! - [`DocumentError`]: isolated to one document; counted, never fatal.
//! - [`PersistenceError`]: progress file or output table write failure. Surfaces
//!   as a [`DocumentError`] for the document whose task hit it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::extract::ExtractionError;

/// Failure that aborts the run before any extraction call is made.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("input directory {}: {source}", .path.display())]
    InputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output template {} has no header row", .path.display())]
    EmptyTemplate { path: PathBuf },

    #[error("output template {} has unknown column `{column}`", .path.display())]
    UnknownColumn { path: PathBuf, column: String },

    #[error(
        "existing output {} has header {found:?}, template expects {expected:?}",
        .path.display()
    )]
    SchemaMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("output table {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reference report {}: {source}", .path.display())]
    Reference {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("progress state: {0}")]
    Progress(#[source] PersistenceError),

    #[error("no previous run found in {}", .0.display())]
    NoPreviousRun(PathBuf),

    #[error("invalid run id `{0}` (expected YYYYMMDD_HHMM)")]
    InvalidRunId(String),

    #[error("no run {run_id}: {} does not exist", .path.display())]
    UnknownRun { run_id: String, path: PathBuf },
}

/// Failure writing or reading durable state (progress file, output table).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("progress file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PersistenceError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistenceError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Why one document did not complete. The document stays out of the
/// progress set and is picked up again by the next run.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("document task failed: {0}")]
    Task(String),
}
