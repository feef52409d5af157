//! Error taxonomy for the BRR movement engine

use chrono::NaiveDate;
use thiserror::Error;

/// A ledger row whose stored identifier does not match the one derived
/// from its type, tag and complement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMismatch {
    pub row: usize,
    pub stored: String,
    pub expected: String,
}

#[derive(Error, Debug)]
pub enum BrrError {
    #[error("Schema error in column '{column}': {reason}")]
    Schema { column: String, reason: String },

    #[error("Duplicated asset identifiers: {}", .ius.join(", "))]
    DuplicateIdentifier { ius: Vec<String> },

    #[error("{} asset identifier(s) do not match type-tag-complement (first: '{}' should be '{}')",
        .mismatches.len(),
        .mismatches.first().map(|m| m.stored.as_str()).unwrap_or(""),
        .mismatches.first().map(|m| m.expected.as_str()).unwrap_or(""))]
    MalformedIdentifier { mismatches: Vec<IdentifierMismatch> },

    #[error("Invalid price index series: {reason}")]
    InvalidSeries { reason: String },

    #[error("Date {date} is outside the index coverage [{first}, {last}]")]
    OutOfRange {
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },

    #[error("Cash flow of {periods} period(s) has no real rate of return above -100%")]
    NoValidRoot { periods: usize },

    #[error("Invalid date '{value}' (expected yyyy-mm-dd or dd/mm/yyyy)")]
    InvalidDate { value: String },

    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrrError {
    pub(crate) fn schema(column: &str, reason: impl Into<String>) -> Self {
        BrrError::Schema {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

pub type BrrResult<T> = Result<T, BrrError>;
