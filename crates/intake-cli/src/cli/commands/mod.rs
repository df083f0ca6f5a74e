//! CLI command handlers, one file per command.

mod run;
mod status;
mod vocab;

pub use run::run_pipeline;
pub use status::run_status;
pub use vocab::run_vocab;
