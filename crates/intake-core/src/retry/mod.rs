//! Retry and backoff policy for extraction calls.
//!
//! Classifies extraction failures (timeouts, throttling, connection failures,
//! malformed responses) and makes exponential backoff decisions. The default
//! policy is a single attempt; failed documents are then left for the next run.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
