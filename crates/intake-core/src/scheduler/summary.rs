//! Run outcome reporting: attempted / succeeded / failed, plus what failed.

/// One document that did not complete, with enough detail to find and rerun it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of one run over a batch.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Documents listed in the input directory.
    pub total_documents: usize,
    /// Documents skipped because a previous run completed them.
    pub already_processed: usize,
    /// Documents scheduled in this run.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Rows appended to the output table in this run.
    pub rows_appended: usize,
    /// Highest number of extraction calls in flight at once.
    pub peak_in_flight: usize,
    /// Wall-clock time of the run (seconds).
    pub elapsed_secs: f64,
    /// Failed documents, sorted by identifier.
    pub failures: Vec<DocumentFailure>,
}

impl RunSummary {
    /// True when there was nothing left to do at start.
    pub fn nothing_to_do(&self) -> bool {
        self.attempted == 0
    }

    /// True when every listed document is now in the progress set.
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.already_processed + self.succeeded >= self.total_documents
    }

    /// Documents per second over the run (0 if elapsed is 0).
    pub fn docs_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.succeeded as f64 / self.elapsed_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_counts_previous_runs() {
        let s = RunSummary {
            total_documents: 10,
            already_processed: 7,
            attempted: 3,
            succeeded: 3,
            ..RunSummary::default()
        };
        assert!(s.is_complete());
        assert!(!s.nothing_to_do());

        let partial = RunSummary {
            failed: 1,
            succeeded: 2,
            ..s
        };
        assert!(!partial.is_complete());
    }

    #[test]
    fn rate_is_zero_without_elapsed_time() {
        assert_eq!(RunSummary::default().docs_per_sec(), 0.0);
        let s = RunSummary {
            succeeded: 10,
            elapsed_secs: 2.0,
            ..RunSummary::default()
        };
        assert!((s.docs_per_sec() - 5.0).abs() < 1e-9);
    }
}
