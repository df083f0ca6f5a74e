//! Parse and validate extraction responses.

use serde_json::Value;

use super::error::ExtractionError;
use super::types::{ExtractedRecord, IntakeForms};

/// Parse the records JSON produced by the model.
///
/// Not JSON at all is `MalformedResponse`; JSON of the wrong shape (unknown or
/// missing fields, wrong types, blank required values) is `SchemaViolation`.
pub fn parse_records(text: &str) -> Result<Vec<ExtractedRecord>, ExtractionError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| ExtractionError::MalformedResponse(format!("records are not JSON: {e}")))?;
    let forms: IntakeForms = serde_json::from_value(value)
        .map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;
    for record in &forms.list_of_intake_forms {
        record.validate().map_err(ExtractionError::SchemaViolation)?;
    }
    Ok(forms.list_of_intake_forms)
}

/// Parse a full Responses API body: find the message output text (or refusal)
/// and hand it to [`parse_records`].
pub fn parse_response_body(body: &str) -> Result<Vec<ExtractedRecord>, ExtractionError> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::MalformedResponse(format!("response is not JSON: {e}")))?;

    if let Some(text) = root.get("output_text").and_then(Value::as_str) {
        return parse_records(text);
    }

    let output = root
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::MalformedResponse("missing `output` array".into()))?;

    let mut text = String::new();
    for item in output {
        if item.get("type").and_then(Value::as_str) != Some("message") {
            continue;
        }
        let Some(content) = item.get("content").and_then(Value::as_array) else {
            continue;
        };
        for part in content {
            match part.get("type").and_then(Value::as_str) {
                Some("output_text") => {
                    if let Some(t) = part.get("text").and_then(Value::as_str) {
                        text.push_str(t);
                    }
                }
                Some("refusal") => {
                    let reason = part
                        .get("refusal")
                        .and_then(Value::as_str)
                        .unwrap_or("no reason given");
                    return Err(ExtractionError::Refused(reason.to_string()));
                }
                _ => {}
            }
        }
    }

    if text.trim().is_empty() {
        return Err(ExtractionError::MalformedResponse(
            "response has no output text".into(),
        ));
    }
    parse_records(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_json(id: &str) -> Value {
        json!({
            "id_number": id,
            "species": "Mallard",
            "condition": "orphan",
            "intake_date": "05.02.24",
            "rescuer_name": "Pat Doe",
            "rescuer_city": "Indpls",
            "county_found": "Marion",
            "final_disposition": "R",
            "county_released": "Marion",
            "disposition_date": null
        })
    }

    fn response_with_text(text: &str) -> String {
        json!({
            "id": "resp_1",
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [{"type": "output_text", "text": text}]}
            ]
        })
        .to_string()
    }

    #[test]
    fn parses_multi_record_form() {
        let text = json!({"list_of_intake_forms": [
            record_json("24-0081"),
            record_json("24-0082"),
            record_json("24-0083")
        ]})
        .to_string();
        let records = parse_response_body(&response_with_text(&text)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].id_number, "24-0083");
        assert_eq!(records[0].rescuer_city.as_deref(), Some("Indpls"));
        assert!(records[0].disposition_date.is_none());
    }

    #[test]
    fn empty_list_is_valid() {
        let records = parse_records(r#"{"list_of_intake_forms": []}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_required_field_is_schema_violation() {
        let mut rec = record_json("24-0001");
        rec.as_object_mut().unwrap().remove("species");
        let text = json!({"list_of_intake_forms": [rec]}).to_string();
        let err = parse_records(&text).unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)), "{err}");
    }

    #[test]
    fn unknown_field_is_schema_violation() {
        let mut rec = record_json("24-0001");
        rec["weight_grams"] = json!(120);
        let text = json!({"list_of_intake_forms": [rec]}).to_string();
        assert!(matches!(
            parse_records(&text),
            Err(ExtractionError::SchemaViolation(_))
        ));
    }

    #[test]
    fn blank_required_field_is_schema_violation() {
        let mut rec = record_json("24-0001");
        rec["condition"] = json!("   ");
        let text = json!({"list_of_intake_forms": [rec]}).to_string();
        assert!(matches!(
            parse_records(&text),
            Err(ExtractionError::SchemaViolation(_))
        ));
    }

    #[test]
    fn non_json_text_is_malformed() {
        let err = parse_response_body(&response_with_text("Sure! Here are the forms")).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse(_)));
    }

    #[test]
    fn refusal_is_reported() {
        let body = json!({"output": [{"type": "message", "content": [
            {"type": "refusal", "refusal": "I can't read this image"}
        ]}]})
        .to_string();
        match parse_response_body(&body) {
            Err(ExtractionError::Refused(reason)) => assert!(reason.contains("can't read")),
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[test]
    fn missing_output_is_malformed() {
        assert!(matches!(
            parse_response_body(r#"{"id": "resp_1"}"#),
            Err(ExtractionError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response_body(r#"{"output": []}"#),
            Err(ExtractionError::MalformedResponse(_))
        ));
    }
}
