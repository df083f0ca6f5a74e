use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::scheduler::MAX_LIMIT;

/// Retry policy parameters (optional section in config.toml).
/// When the section is absent each document gets exactly one extraction attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per document (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    /// Policy for these parameters. A base delay that is not a representable
    /// duration (`inf`, `nan`, overflow) falls back to `max_delay_secs`.
    pub fn to_policy(&self) -> RetryPolicy {
        let max_delay = Duration::from_secs(self.max_delay_secs);
        let base_delay =
            Duration::try_from_secs_f64(self.base_delay_secs.max(0.0)).unwrap_or(max_delay);
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }
}

/// Which durable step happens first once a document's records come back.
///
/// `AppendThenRecord` can duplicate rows if the process dies between the two
/// steps (the document is reprocessed on rerun). `RecordThenAppend` can lose
/// that document's rows instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOrder {
    #[default]
    AppendThenRecord,
    RecordThenAppend,
}

/// Global configuration loaded from `~/.config/intake/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Model identifier passed to the extraction service.
    pub extraction_model: String,
    /// Two-digit year used in identifier and date hints (e.g. "24").
    pub target_year: String,
    /// Maximum number of extraction calls in flight at once.
    pub concurrency_limit: usize,
    /// Directory holding the scanned form images.
    pub input_dir: PathBuf,
    /// Directory receiving output tables and progress files.
    pub output_dir: PathBuf,
    /// CSV whose header row fixes the output schema.
    pub template_path: PathBuf,
    /// Previous years' report used for condition/species vocabulary hints.
    #[serde(default)]
    pub reference_report: Option<PathBuf>,
    /// Base URL of the extraction API.
    pub api_base: String,
    /// Per-request timeout for the extraction call, in seconds.
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub commit_order: CommitOrder,
    /// Optional retry policy; if missing, failed documents wait for the next run.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            extraction_model: "gpt-4o".to_string(),
            target_year: "24".to_string(),
            concurrency_limit: 5,
            input_dir: PathBuf::from("inputs/images"),
            output_dir: PathBuf::from("outputs"),
            template_path: PathBuf::from("outputs/output.template.csv"),
            reference_report: Some(PathBuf::from(
                "inputs/previous_years_reports/DNR-2020.csv",
            )),
            api_base: "https://api.openai.com/v1".to_string(),
            request_timeout_secs: 120,
            commit_order: CommitOrder::AppendThenRecord,
            retry: None,
        }
    }
}

impl IntakeConfig {
    /// Retry policy in effect: the configured one, or a single attempt.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_else(RetryPolicy::single_attempt)
    }

    /// Apply environment overrides on top of file values.
    ///
    /// Recognized: `INTAKE_EXTRACTION_MODEL` (or `OPENAI_MODEL`),
    /// `INTAKE_TARGET_YEAR` (or `YEAR`), `INTAKE_CONCURRENCY_LIMIT`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| lookup(k).filter(|v| !v.trim().is_empty()))
        };
        if let Some(model) = first(&["INTAKE_EXTRACTION_MODEL", "OPENAI_MODEL"]) {
            self.extraction_model = model.trim().to_string();
        }
        if let Some(year) = first(&["INTAKE_TARGET_YEAR", "YEAR"]) {
            self.target_year = year.trim().to_string();
        }
        if let Some(limit) = first(&["INTAKE_CONCURRENCY_LIMIT"]) {
            let n: usize = limit
                .trim()
                .parse()
                .with_context(|| format!("INTAKE_CONCURRENCY_LIMIT is not a number: {limit}"))?;
            self.concurrency_limit = n.clamp(1, MAX_LIMIT);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("intake")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<IntakeConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = IntakeConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: IntakeConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
