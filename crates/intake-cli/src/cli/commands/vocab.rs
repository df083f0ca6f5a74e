//! `intake vocab` – print the reference vocabulary the prompt is built from.

use anyhow::{bail, Result};
use intake_core::config::IntakeConfig;
use intake_core::reference::ReferenceContext;
use intake_core::scheduler;
use std::io::Write;

pub fn run_vocab(cfg: &IntakeConfig, conditions: bool) -> Result<()> {
    let Some(path) = &cfg.reference_report else {
        bail!("no reference_report configured");
    };
    tracing::debug!(path = %path.display(), "loading reference report");
    let reference = scheduler::load_reference(cfg)?;
    write_vocab(&mut std::io::stdout().lock(), &reference, conditions)?;
    Ok(())
}

/// Species one per line, then conditions under a heading when requested.
fn write_vocab<W: Write>(
    out: &mut W,
    reference: &ReferenceContext,
    conditions: bool,
) -> std::io::Result<()> {
    for s in &reference.species {
        writeln!(out, "{s}")?;
    }
    if conditions {
        writeln!(out)?;
        writeln!(out, "Conditions:")?;
        for c in &reference.conditions {
            writeln!(out, "{c}")?;
        }
    }
    Ok(())
}
