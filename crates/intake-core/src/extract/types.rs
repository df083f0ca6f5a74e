use serde::{Deserialize, Serialize};

/// One intake record pulled from a form. A single form may list several
/// animals (e.g. an ID range), each becoming its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractedRecord {
    pub id_number: String,
    pub species: String,
    pub condition: String,
    pub intake_date: String,
    pub rescuer_name: Option<String>,
    pub rescuer_city: Option<String>,
    pub county_found: Option<String>,
    pub final_disposition: Option<String>,
    pub county_released: Option<String>,
    pub disposition_date: Option<String>,
}

impl ExtractedRecord {
    /// Record with the required fields set and every optional field empty.
    pub fn new(
        id_number: impl Into<String>,
        species: impl Into<String>,
        condition: impl Into<String>,
        intake_date: impl Into<String>,
    ) -> Self {
        Self {
            id_number: id_number.into(),
            species: species.into(),
            condition: condition.into(),
            intake_date: intake_date.into(),
            rescuer_name: None,
            rescuer_city: None,
            county_found: None,
            final_disposition: None,
            county_released: None,
            disposition_date: None,
        }
    }

    /// Required fields must be present and non-blank.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("id_number", &self.id_number),
            ("species", &self.species),
            ("condition", &self.condition),
            ("intake_date", &self.intake_date),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("record {:?}: `{name}` is blank", self.id_number));
            }
        }
        Ok(())
    }
}

/// Envelope the extraction service fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeForms {
    pub list_of_intake_forms: Vec<ExtractedRecord>,
}
