//! Extraction service boundary.
//!
//! [`ExtractionClient`] is the seam between the pipeline and whatever turns a
//! scanned form into records. Responses are validated against a strict
//! [`ExtractedRecord`] schema here; nothing partially parsed gets past it.

mod error;
mod openai;
mod parse;
mod prompt;
mod types;

pub use error::ExtractionError;
pub use openai::OpenAiClient;
pub use parse::{parse_records, parse_response_body};
pub use prompt::{record_schema, system_prompt};
pub use types::{ExtractedRecord, IntakeForms};

use crate::inputs::Document;
use crate::reference::ReferenceContext;

/// Submits one document to the extraction service.
///
/// Blocking; the scheduler calls it from `spawn_blocking`. Any timeout is the
/// implementation's own responsibility.
pub trait ExtractionClient: Send + Sync {
    fn submit(
        &self,
        document: &Document,
        reference: &ReferenceContext,
    ) -> Result<Vec<ExtractedRecord>, ExtractionError>;
}
