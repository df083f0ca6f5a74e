pub mod config;
pub mod error;
pub mod logging;

pub mod extract;
pub mod inputs;
pub mod progress;
pub mod reference;
pub mod retry;
pub mod runs;
pub mod scheduler;
pub mod sink;
