use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formula::FormulaError;

/// Names the benchmark table a lookup was made against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkTable {
    AutomationPotential,
    Industry,
    CompanySize,
    Readiness,
    Location,
    ProcessType,
    RdCredit,
    PeerRoic,
    YearSchedule,
}

impl BenchmarkTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutomationPotential => "automation_potential",
            Self::Industry => "industry",
            Self::CompanySize => "company_size",
            Self::Readiness => "readiness",
            Self::Location => "location",
            Self::ProcessType => "process_type",
            Self::RdCredit => "rd_credit",
            Self::PeerRoic => "peer_roic",
            Self::YearSchedule => "year_schedule",
        }
    }
}

impl fmt::Display for BenchmarkTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no `{table}` benchmark entry for `{key}` and no fallback is declared")]
    UnknownKey { table: BenchmarkTable, key: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

impl EngineError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Lookup(_) => {
                "One of the selected categories is not recognised. Pick a listed option and try again."
            }
            Self::InvalidInput(_) => "The inputs could not be processed. Check values and try again.",
            Self::Formula(_) => "The workbook model could not be assembled.",
        }
    }
}

/// A single field-level problem with archetype inputs. Collected, never thrown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{BenchmarkTable, EngineError, LookupError, ValidationError};

    #[test]
    fn lookup_error_names_table_and_key() {
        let error =
            LookupError::UnknownKey { table: BenchmarkTable::Industry, key: "Mining".to_owned() };

        assert_eq!(
            error.to_string(),
            "no `industry` benchmark entry for `Mining` and no fallback is declared"
        );
    }

    #[test]
    fn lookup_error_converts_into_engine_error_with_safe_message() {
        let error = EngineError::from(LookupError::UnknownKey {
            table: BenchmarkTable::CompanySize,
            key: "Galactic".to_owned(),
        });

        assert!(matches!(error, EngineError::Lookup(_)));
        assert_eq!(
            error.user_message(),
            "One of the selected categories is not recognised. Pick a listed option and try again."
        );
    }

    #[test]
    fn validation_error_displays_field_and_message() {
        let error = ValidationError::new("pagesPerDoc", "must be at most 500");
        assert_eq!(error.to_string(), "pagesPerDoc: must be at most 500");
    }
}
