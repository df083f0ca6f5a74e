//! Output table schema: which record field lands in which column.

use std::path::Path;

use super::csv::parse_records;
use crate::error::StartupError;
use crate::extract::ExtractedRecord;

/// Column order used when no template says otherwise.
pub const CANONICAL_COLUMNS: [&str; 9] = [
    "id_number",
    "species",
    "condition",
    "intake_date",
    "rescuer_name",
    "county_found",
    "final_disposition",
    "county_released",
    "disposition_date",
];

/// Run of spaces between rescuer name and city when both share one cell;
/// wide enough that spreadsheet viewers wrap the city onto its own line.
pub const WIDE_SEPARATOR: &str = "                         ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    IdNumber,
    Species,
    Condition,
    IntakeDate,
    RescuerName,
    RescuerCity,
    CountyFound,
    FinalDisposition,
    CountyReleased,
    DispositionDate,
}

impl Column {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "id_number" => Column::IdNumber,
            "species" => Column::Species,
            "condition" => Column::Condition,
            "intake_date" => Column::IntakeDate,
            "rescuer_name" => Column::RescuerName,
            "rescuer_city" => Column::RescuerCity,
            "county_found" => Column::CountyFound,
            "final_disposition" => Column::FinalDisposition,
            "county_released" => Column::CountyReleased,
            "disposition_date" => Column::DispositionDate,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Column::IdNumber => "id_number",
            Column::Species => "species",
            Column::Condition => "condition",
            Column::IntakeDate => "intake_date",
            Column::RescuerName => "rescuer_name",
            Column::RescuerCity => "rescuer_city",
            Column::CountyFound => "county_found",
            Column::FinalDisposition => "final_disposition",
            Column::CountyReleased => "county_released",
            Column::DispositionDate => "disposition_date",
        }
    }
}

/// Fixed column layout of an output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    columns: Vec<Column>,
}

impl OutputSchema {
    pub fn canonical() -> Self {
        Self {
            columns: CANONICAL_COLUMNS
                .iter()
                .filter_map(|n| Column::from_name(n))
                .collect(),
        }
    }

    /// Build from header names; returns the first unknown name on failure.
    pub fn from_header<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        let columns = names
            .iter()
            .map(|n| {
                let n = n.as_ref().trim();
                Column::from_name(n).ok_or_else(|| n.to_string())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns })
    }

    /// Read the header row of a template CSV.
    pub fn from_template(path: &Path) -> Result<Self, StartupError> {
        let text = std::fs::read_to_string(path).map_err(|source| StartupError::Template {
            path: path.to_path_buf(),
            source,
        })?;
        let header = parse_records(&text)
            .into_iter()
            .next()
            .ok_or_else(|| StartupError::EmptyTemplate {
                path: path.to_path_buf(),
            })?;
        Self::from_header(&header).map_err(|column| StartupError::UnknownColumn {
            path: path.to_path_buf(),
            column,
        })
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// True when the city shares the `rescuer_name` cell (no `rescuer_city` column).
    pub fn folds_city(&self) -> bool {
        !self.columns.contains(&Column::RescuerCity)
    }

    /// Cells for one record, in column order. Missing optional values are empty.
    pub fn row(&self, record: &ExtractedRecord) -> Vec<String> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        self.columns
            .iter()
            .map(|col| match col {
                Column::IdNumber => record.id_number.clone(),
                Column::Species => record.species.clone(),
                Column::Condition => record.condition.clone(),
                Column::IntakeDate => record.intake_date.clone(),
                Column::RescuerName if self.folds_city() => fold_rescuer(
                    record.rescuer_name.as_deref(),
                    record.rescuer_city.as_deref(),
                ),
                Column::RescuerName => opt(&record.rescuer_name),
                Column::RescuerCity => opt(&record.rescuer_city),
                Column::CountyFound => opt(&record.county_found),
                Column::FinalDisposition => opt(&record.final_disposition),
                Column::CountyReleased => opt(&record.county_released),
                Column::DispositionDate => opt(&record.disposition_date),
            })
            .collect()
    }
}

/// `name<WIDE_SEPARATOR>city`; the separator is kept even without a name so
/// the city still wraps to the second line.
pub fn fold_rescuer(name: Option<&str>, city: Option<&str>) -> String {
    match city.filter(|c| !c.is_empty()) {
        Some(city) => format!("{}{}{}", name.unwrap_or(""), WIDE_SEPARATOR, city),
        None => name.unwrap_or("").to_string(),
    }
}
