//! Shared fixtures: fake extraction clients and fault-injecting stores.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use intake_core::error::PersistenceError;
use intake_core::extract::{ExtractedRecord, ExtractionClient, ExtractionError};
use intake_core::inputs::Document;
use intake_core::progress::{ProgressFile, ProgressStore};
use intake_core::reference::ReferenceContext;
use intake_core::sink::{csv, CsvSink, OutputSchema, ResultSink, CANONICAL_COLUMNS};

/// How a fake client fails a given document.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Always fails with a malformed response.
    Permanent,
    /// Fails with HTTP 503 this many times, then succeeds.
    Transient(u32),
}

/// Scripted extraction client that counts calls and concurrent calls.
#[derive(Default)]
pub struct FakeClient {
    delay: Duration,
    records_per_doc: HashMap<String, usize>,
    failures: Mutex<HashMap<String, Failure>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_records(mut self, id: &str, n: usize) -> Self {
        self.records_per_doc.insert(id.to_string(), n);
        self
    }

    pub fn failing(self, id: &str, failure: Failure) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(id.to_string(), failure);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn take_failure(&self, id: &str) -> Option<ExtractionError> {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(id) {
            Some(Failure::Permanent) => Some(ExtractionError::MalformedResponse(
                "unparseable output".into(),
            )),
            Some(Failure::Transient(n)) if *n > 0 => {
                *n -= 1;
                Some(ExtractionError::Http {
                    status: 503,
                    body: "overloaded".into(),
                })
            }
            _ => None,
        }
    }
}

/// Records for a document: ids differ, every other field is shared.
pub fn records_for(doc_id: &str, n: usize) -> Vec<ExtractedRecord> {
    (0..n)
        .map(|k| {
            let mut r = ExtractedRecord::new(format!("{doc_id}#{k}"), "Mallard", "orphan", "05.01.24");
            r.rescuer_name = Some("Pat Doe".into());
            r.rescuer_city = Some("Indpls".into());
            r.county_found = Some("Marion".into());
            r
        })
        .collect()
}

impl ExtractionClient for FakeClient {
    fn submit(
        &self,
        document: &Document,
        _reference: &ReferenceContext,
    ) -> Result<Vec<ExtractedRecord>, ExtractionError> {
        self.calls.lock().unwrap().push(document.id.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let result = match self.take_failure(&document.id) {
            Some(e) => Err(e),
            None => {
                let n = self.records_per_doc.get(&document.id).copied().unwrap_or(1);
                Ok(records_for(&document.id, n))
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Progress store whose `record` fails for chosen identifiers.
pub struct FailingProgress {
    pub inner: ProgressFile,
    pub fail_ids: HashSet<String>,
}

impl ProgressStore for FailingProgress {
    fn load(&self) -> Result<BTreeSet<String>, PersistenceError> {
        self.inner.load()
    }

    fn record(&self, id: &str) -> Result<(), PersistenceError> {
        if self.fail_ids.contains(id) {
            return Err(PersistenceError::Io {
                op: "write progress",
                path: self.inner.path().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.record(id)
    }
}

/// Sink whose `append` fails when any record came from a chosen document.
pub struct FailingSink {
    pub inner: CsvSink,
    pub fail_doc_ids: HashSet<String>,
}

impl ResultSink for FailingSink {
    fn append(&self, records: &[ExtractedRecord]) -> Result<usize, PersistenceError> {
        let hit = records.iter().any(|r| {
            r.id_number
                .split('#')
                .next()
                .map(|doc| self.fail_doc_ids.contains(doc))
                .unwrap_or(false)
        });
        if hit {
            return Err(PersistenceError::Io {
                op: "append output",
                path: self.inner.path().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.append(records)
    }
}

/// Workspace with `inputs/images`, an output template, and an `outputs` dir.
pub struct Workspace {
    pub root: tempfile::TempDir,
}

impl Workspace {
    pub fn new(doc_count: usize) -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("inputs/images")).unwrap();
        std::fs::create_dir_all(root.path().join("outputs")).unwrap();
        std::fs::write(
            root.path().join("outputs/output.template.csv"),
            CANONICAL_COLUMNS.join(",") + "\n",
        )
        .unwrap();
        let ws = Self { root };
        for i in 0..doc_count {
            ws.add_image(&doc_name(i));
        }
        ws
    }

    pub fn add_image(&self, name: &str) {
        std::fs::write(self.input_dir().join(name), b"\xff\xd8\xff fake jpeg").unwrap();
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.path().join("inputs/images")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("outputs")
    }

    pub fn template(&self) -> PathBuf {
        self.output_dir().join("output.template.csv")
    }

    pub fn sink(&self, output: &Path) -> CsvSink {
        CsvSink::initialize(output, OutputSchema::canonical()).unwrap()
    }
}

pub fn doc_name(i: usize) -> String {
    format!("form_{i:03}.jpg")
}

/// Data rows (header excluded) of an output table.
pub fn data_rows(path: &Path) -> Vec<Vec<String>> {
    let mut rows = csv::parse_records(&std::fs::read_to_string(path).unwrap());
    rows.remove(0);
    rows
}

/// Document identifier a row came from.
pub fn row_doc(row: &[String]) -> String {
    row[0].split('#').next().unwrap_or_default().to_string()
}
