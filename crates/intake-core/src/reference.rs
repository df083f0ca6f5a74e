//! Vocabulary hints from a previous years' report.
//!
//! The extraction prompt lists the conditions and species seen in earlier
//! reports so new records follow the same wording.

use std::path::Path;

use crate::error::StartupError;
use crate::sink::csv::parse_records;

const CONDITION_COLUMN: &str = "Condition";
const SPECIES_COLUMN: &str = "Species";

/// Read-only context shared by every extraction call in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceContext {
    /// Two-digit year for identifiers and dates.
    pub target_year: String,
    /// Distinct conditions, in first-seen order.
    pub conditions: Vec<String>,
    /// Distinct species, in first-seen order.
    pub species: Vec<String>,
}

impl ReferenceContext {
    /// Context with no vocabulary hints.
    pub fn new(target_year: impl Into<String>) -> Self {
        Self {
            target_year: target_year.into(),
            ..Self::default()
        }
    }

    /// Build from report CSV text. Missing columns yield empty lists.
    pub fn from_report_text(text: &str, target_year: impl Into<String>) -> Self {
        let rows = parse_records(text);
        let Some((header, body)) = rows.split_first() else {
            return Self::new(target_year);
        };
        let column = |name: &str| header.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        Self {
            target_year: target_year.into(),
            conditions: distinct(body, column(CONDITION_COLUMN)),
            species: distinct(body, column(SPECIES_COLUMN)),
        }
    }

    pub fn load(report: &Path, target_year: impl Into<String>) -> Result<Self, StartupError> {
        let text = std::fs::read_to_string(report).map_err(|source| StartupError::Reference {
            path: report.to_path_buf(),
            source,
        })?;
        let ctx = Self::from_report_text(&text, target_year);
        tracing::debug!(
            report = %report.display(),
            conditions = ctx.conditions.len(),
            species = ctx.species.len(),
            "loaded reference vocabulary"
        );
        Ok(ctx)
    }
}

fn distinct(rows: &[Vec<String>], column: Option<usize>) -> Vec<String> {
    let Some(idx) = column else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    rows.iter()
        .filter_map(|r| r.get(idx))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}
