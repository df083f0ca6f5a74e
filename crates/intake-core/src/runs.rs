//! Run instances: one output table and one progress file per run id.
//!
//! A run id is a local timestamp `YYYYMMDD_HHMM`. Reusing a run id resumes
//! that run; a fresh id starts a new output table.

use chrono::{DateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M";
const PROGRESS_PREFIX: &str = "progress_";
const PROGRESS_SUFFIX: &str = ".json";

/// Keyword accepted wherever a run id is, meaning "newest existing run".
pub const LATEST: &str = "latest";

pub fn new_run_id<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(RUN_ID_FORMAT).to_string()
}

/// True for ids of the form `YYYYMMDD_HHMM` naming a real calendar minute.
pub fn is_valid_run_id(id: &str) -> bool {
    id.len() == 13 && chrono::NaiveDateTime::parse_from_str(id, RUN_ID_FORMAT).is_ok()
}

pub fn output_path(output_dir: &Path, run_id: &str) -> PathBuf {
    output_dir.join(format!("output_{run_id}.csv"))
}

pub fn progress_path(output_dir: &Path, run_id: &str) -> PathBuf {
    output_dir.join(format!("{PROGRESS_PREFIX}{run_id}{PROGRESS_SUFFIX}"))
}

/// Run ids with a progress file in `output_dir`, oldest first.
pub fn list_run_ids(output_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(output_dir) else {
        return Vec::new();
    };
    let mut ids: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_owned))
        .filter_map(|name| {
            name.strip_prefix(PROGRESS_PREFIX)
                .and_then(|rest| rest.strip_suffix(PROGRESS_SUFFIX))
                .filter(|id| !id.is_empty())
                .map(str::to_owned)
        })
        .collect();
    ids.sort();
    ids
}

/// Resolve a requested run id: `None` mints a new one, `latest` picks the
/// newest existing run, anything else must be a well-formed run id.
pub fn resolve_run_id(
    output_dir: &Path,
    requested: Option<&str>,
    now: &DateTime<chrono::Local>,
) -> Result<String, StartupError> {
    match requested {
        None => Ok(new_run_id(now)),
        Some(LATEST) => list_run_ids(output_dir)
            .pop()
            .ok_or_else(|| StartupError::NoPreviousRun(output_dir.to_path_buf())),
        Some(id) if is_valid_run_id(id) => Ok(id.to_string()),
        Some(id) => Err(StartupError::InvalidRunId(id.to_string())),
    }
}
