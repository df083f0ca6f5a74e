//! Extraction over the OpenAI Responses API.
//!
//! Uses the curl crate (libcurl) for a single JSON POST per document. Runs in
//! the current thread; the scheduler calls it from `spawn_blocking`.

use base64::Engine as _;
use serde_json::{json, Value};
use std::time::Duration;

use super::error::ExtractionError;
use super::parse::parse_response_body;
use super::prompt::{record_schema, system_prompt};
use super::types::ExtractedRecord;
use super::ExtractionClient;
use crate::inputs::Document;
use crate::reference::ReferenceContext;

/// Longest error body kept in an `ExtractionError::Http`.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_base: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.api_base.trim_end_matches('/'))
    }

    /// Request body: system prompt, the image as a data URL, strict output schema.
    pub fn request_body(&self, document: &Document, reference: &ReferenceContext) -> Value {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&document.bytes);
        let data_url = format!("data:{};base64,{}", document.media_type, encoded);
        json!({
            "model": self.model,
            "input": [
                {"role": "system", "content": system_prompt(reference)},
                {"role": "user", "content": [
                    {"type": "input_text", "text": "Extract every intake record on this form."},
                    {"type": "input_image", "image_url": data_url}
                ]}
            ],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "intake_forms",
                    "strict": true,
                    "schema": record_schema()
                }
            }
        })
    }

    fn post(&self, payload: &[u8]) -> Result<(u32, Vec<u8>), ExtractionError> {
        let mut response = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.endpoint())?;
        easy.post(true)?;
        easy.post_fields_copy(payload)?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(self.timeout)?;

        let mut list = curl::easy::List::new();
        list.append("Content-Type: application/json")?;
        list.append(&format!("Authorization: Bearer {}", self.api_key))?;
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        Ok((code, response))
    }
}

impl ExtractionClient for OpenAiClient {
    fn submit(
        &self,
        document: &Document,
        reference: &ReferenceContext,
    ) -> Result<Vec<ExtractedRecord>, ExtractionError> {
        let payload = serde_json::to_vec(&self.request_body(document, reference))
            .map_err(|e| ExtractionError::MalformedResponse(format!("encode request: {e}")))?;

        let (code, body) = self.post(&payload)?;
        let body = String::from_utf8_lossy(&body);
        if !(200..300).contains(&code) {
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(ExtractionError::Http { status: code, body });
        }

        let records = parse_response_body(&body)?;
        tracing::debug!(doc = %document.id, records = records.len(), "extraction response parsed");
        Ok(records)
    }
}
