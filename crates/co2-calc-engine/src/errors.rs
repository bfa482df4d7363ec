//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use chrono::NaiveDate;
use thiserror::Error;

use crate::model::Source;

pub type Result<T> = std::result::Result<T, CalcEngineError>;

#[derive(Debug, Error)]
pub enum CalcEngineError {
    #[error("source {energy} has {found} daily rows but {expected} were expected")]
    ShapeMismatch {
        energy: Source,
        expected: usize,
        found: usize,
    },
    #[error("source {energy} does not cover the same dates as {reference}")]
    DateMismatch { energy: Source, reference: Source },
    #[error("generation data has no column for source {0}")]
    MissingSource(Source),
    #[error("rows are not in strictly increasing date order: {previous} is followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },
    #[error("generation table has no rows")]
    EmptyTable,
    #[error("no emission factor configured for source {0}")]
    MissingFactor(Source),
    #[error("emission factor for {energy} must be finite and non-negative, got {value}")]
    InvalidFactor { energy: Source, value: f64 },
    #[error("baseline requires at least 2 daily rows, table has {rows}")]
    InsufficientData { rows: usize },
    #[error("trailing baseline sums to zero (latest total {total_present}); variation is undefined")]
    DivisionByZero { total_present: f64 },
    #[error("variation is not a finite number (baseline total {total_past}, latest total {total_present})")]
    NonFiniteVariation { total_past: f64, total_present: f64 },
    #[error("unknown energy source identifier '{0}'")]
    UnknownSource(String),
    #[error("invalid date key '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("source {energy} has more than one value for {date}")]
    DuplicateDate { energy: Source, date: NaiveDate },
    #[error("source {0} appears in more than one column")]
    DuplicateSource(Source),
    #[error("input has no '{0}' column")]
    MissingColumn(String),
    #[error("row {row}, column {column}: '{raw}' is not a number")]
    InvalidValue {
        row: usize,
        column: String,
        raw: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
