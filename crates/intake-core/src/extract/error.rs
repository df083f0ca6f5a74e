use thiserror::Error;

/// Per-document extraction failure.
///
/// Transport and HTTP failures may be transient (see `retry::classify`);
/// everything describing the response content is permanent.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("read document: {0}")]
    ReadDocument(#[source] std::io::Error),

    #[error("transport: {0}")]
    Transport(#[from] curl::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u32, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("response violates record schema: {0}")]
    SchemaViolation(String),

    #[error("extraction refused: {0}")]
    Refused(String),
}
