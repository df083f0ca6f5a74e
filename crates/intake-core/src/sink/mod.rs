//! Append-only output table.
//!
//! The header is fixed when the table is created and never rewritten.
//! Each `append` writes whole rows with `O_APPEND` and syncs before
//! returning, under one lock so concurrent appends never interleave.

pub mod csv;
mod schema;

pub use schema::{fold_rescuer, Column, OutputSchema, CANONICAL_COLUMNS, WIDE_SEPARATOR};

use std::fs;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{PersistenceError, StartupError};
use crate::extract::ExtractedRecord;

/// Durable, append-only destination for extracted records.
pub trait ResultSink: Send + Sync {
    /// Append one row per record; returns the number of rows written.
    fn append(&self, records: &[ExtractedRecord]) -> Result<usize, PersistenceError>;
}

/// CSV output table.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    schema: OutputSchema,
    lock: Mutex<()>,
}

impl CsvSink {
    /// Create the table with the schema's header, or reuse an existing table
    /// whose header matches. Idempotent.
    pub fn initialize(path: &Path, schema: OutputSchema) -> Result<Self, StartupError> {
        let out_err = |source| StartupError::Output {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(out_err)?;
        }

        let expected: Vec<String> = schema.header().iter().map(|s| s.to_string()).collect();
        let mut file = fs::OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(out_err)?;
        let len = file.metadata().map_err(out_err)?.len();

        if len == 0 {
            file.write_all(csv::format_row(&expected).as_bytes())
                .map_err(out_err)?;
            file.sync_all().map_err(out_err)?;
            tracing::info!(path = %path.display(), "created output table");
        } else {
            let mut first_line = String::new();
            BufReader::new(&mut file)
                .read_line(&mut first_line)
                .map_err(out_err)?;
            let found = csv::parse_records(&first_line)
                .into_iter()
                .next()
                .unwrap_or_default();
            let found: Vec<String> = found.iter().map(|s| s.trim().to_string()).collect();
            if found != expected {
                return Err(StartupError::SchemaMismatch {
                    path: path.to_path_buf(),
                    expected,
                    found,
                });
            }
            terminate_last_line(&mut file, len).map_err(out_err)?;
            tracing::info!(path = %path.display(), "reusing output table");
        }

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }
}

/// A table last saved by another tool may lack the final newline; add it so
/// the next row does not run into the previous one.
fn terminate_last_line(file: &mut fs::File, len: u64) -> std::io::Result<()> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    Ok(())
}

impl ResultSink for CsvSink {
    fn append(&self, records: &[ExtractedRecord]) -> Result<usize, PersistenceError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut buf = String::new();
        for record in records {
            buf.push_str(&csv::format_row(&self.schema.row(record)));
        }

        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| PersistenceError::io("open output", &self.path, e))?;
        file.write_all(buf.as_bytes())
            .map_err(|e| PersistenceError::io("append output", &self.path, e))?;
        file.sync_data()
            .map_err(|e| PersistenceError::io("fsync output", &self.path, e))?;
        Ok(records.len())
    }
}
