//! Extraction budget: bounds how many extraction calls run at once.
//!
//! Each document task acquires a permit before calling the extraction service
//! and holds it until the document is committed or has failed. The permit is
//! released on drop, so every exit path (success, error, panic unwinding,
//! task cancellation) gives it back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Largest permit count the underlying semaphore supports.
pub const MAX_LIMIT: usize = Semaphore::MAX_PERMITS;

/// Shared pool of `limit` permits. Acquisition order is not a completion order.
#[derive(Debug)]
pub struct ExtractionBudget {
    limit: usize,
    semaphore: Arc<Semaphore>,
    counters: Arc<Counters>,
}

impl ExtractionBudget {
    /// Create a budget with the given permit count, clamped to `1..=MAX_LIMIT`.
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, MAX_LIMIT);
        Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of permits currently held.
    pub fn in_use(&self) -> usize {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    /// Available permits (limit - in_use).
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Highest number of permits held at the same time so far.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::Acquire)
    }

    /// Wait until a permit is free.
    pub async fn acquire(&self) -> Result<BudgetPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        let now = self.counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.counters.peak.fetch_max(now, Ordering::AcqRel);
        Ok(BudgetPermit {
            counters: Arc::clone(&self.counters),
            _permit: permit,
        })
    }
}

/// Releases its permit when dropped.
#[derive(Debug)]
pub struct BudgetPermit {
    counters: Arc<Counters>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for BudgetPermit {
    fn drop(&mut self) {
        // Runs before `_permit` is dropped, so in_use never exceeds the limit.
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn permits_are_returned_on_drop() {
        let budget = ExtractionBudget::new(2);
        assert_eq!(budget.available(), 2);
        let a = budget.acquire().await.unwrap();
        let b = budget.acquire().await.unwrap();
        assert_eq!(budget.in_use(), 2);
        assert_eq!(budget.available(), 0);
        drop(a);
        assert_eq!(budget.in_use(), 1);
        assert_eq!(budget.available(), 1);
        drop(b);
        assert_eq!(budget.available(), 2);
        assert_eq!(budget.peak(), 2);
    }

    #[tokio::test]
    async fn acquire_waits_for_a_release() {
        let budget = Arc::new(ExtractionBudget::new(1));
        let held = budget.acquire().await.unwrap();

        let waiter = {
            let budget = Arc::clone(&budget);
            tokio::spawn(async move { budget.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(budget.in_use(), 0);
    }

    #[tokio::test]
    async fn zero_limit_is_clamped() {
        let budget = ExtractionBudget::new(0);
        assert_eq!(budget.limit(), 1);
        let _p = budget.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn oversized_limit_is_clamped() {
        let budget = ExtractionBudget::new(usize::MAX);
        assert_eq!(budget.limit(), MAX_LIMIT);
        let _p = budget.acquire().await.unwrap();
        assert_eq!(budget.in_use(), 1);
    }
}
