//! Classify HTTP status and curl errors into retry policy error kinds.

use crate::extract::ExtractionError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify an extraction error into an ErrorKind.
/// Anything about the response content (bad JSON, schema, refusal) is permanent.
pub fn classify(e: &ExtractionError) -> ErrorKind {
    match e {
        ExtractionError::Transport(ce) => classify_curl_error(ce),
        ExtractionError::Http { status, .. } => classify_http_status(*status),
        ExtractionError::ReadDocument(_)
        | ExtractionError::MalformedResponse(_)
        | ExtractionError::SchemaViolation(_)
        | ExtractionError::Refused(_) => ErrorKind::Other,
    }
}
