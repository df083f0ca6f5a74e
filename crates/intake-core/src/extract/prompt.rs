//! Prompt and response schema sent with every extraction request.

use serde_json::{json, Value};

use crate::reference::ReferenceContext;

/// JSON schema for the `IntakeForms` envelope, in the strict form the
/// structured-output API expects (every property listed as required,
/// optional ones nullable, no additional properties).
pub fn record_schema() -> Value {
    let required_str = json!({"type": "string"});
    let optional_str = json!({"type": ["string", "null"]});
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["list_of_intake_forms"],
        "properties": {
            "list_of_intake_forms": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": [
                        "id_number", "species", "condition", "intake_date",
                        "rescuer_name", "rescuer_city", "county_found",
                        "final_disposition", "county_released", "disposition_date"
                    ],
                    "properties": {
                        "id_number": required_str,
                        "species": required_str,
                        "condition": required_str,
                        "intake_date": required_str,
                        "rescuer_name": optional_str,
                        "rescuer_city": optional_str,
                        "county_found": optional_str,
                        "final_disposition": optional_str,
                        "county_released": optional_str,
                        "disposition_date": optional_str
                    }
                }
            }
        }
    })
}

fn bullet_list(values: &[String]) -> String {
    if values.is_empty() {
        return "  (none available)".to_string();
    }
    values
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt carrying the form conventions and the reference vocabulary.
pub fn system_prompt(reference: &ReferenceContext) -> String {
    let year = &reference.target_year;
    format!(
        "You transcribe handwritten wildlife intake forms into structured records.\n\
         \n\
         A single form can cover one ID or a range of IDs. Return one record per ID; \
         records from the same form share every value the form does not list separately.\n\
         IDs run from {year}-0001 to {year}-2000. A range such as 081-084 expands to \
         {year}-0081, {year}-0082, {year}-0083 and {year}-0084.\n\
         \n\
         Conventions:\n\
         - Dates are written MM.DD.YY and fall in 20{year} (e.g. 11.30.{year}).\n\
         - Abbreviations: CAGO = Canada Goose, GHOW = Great Horned Owl, RTH = Red-Tailed Hawk. \
         A plain \"duck\" is a Mallard; a hatchling is a Songbird.\n\
         - Write Indianapolis or Indy as Indpls. Counties and cities are in Indiana; \
         \"Brown Co\" becomes \"Brown\", \"unk\" becomes \"Unknown\", blank stays blank.\n\
         - If the city is Indianapolis but no county is listed, make a best guess at the \
         county from the city or other location notes.\n\
         - Form labels: \"Co Found\" = county_found, \"Co Rel\" = county_released, \
         \"Final Disp\" = final_disposition, \"DT\" = disposition_date.\n\
         - final_disposition is one of D, R, E, DOA, T, P. When it is D or E, \
         county_released is N/A.\n\
         - Rescuer name: the main person only; use NoLastName when no surname is given.\n\
         - Conditions spread over several lines are joined with commas. Gosling, duckling \
         and similar become \"orphan\".\n\
         \n\
         Follow the style of these conditions from earlier reports:\n{conditions}\n\
         \n\
         The species should be one of:\n{species}\n",
        conditions = bullet_list(&reference.conditions),
        species = bullet_list(&reference.species),
    )
}
