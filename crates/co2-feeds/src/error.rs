//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Grid operator data providers and bulletin publishing sinks."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use chrono::NaiveDate;
use co2_calc_engine::CalcEngineError;

/// Errors raised by data providers and publishing sinks.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The daily report for a date could not be retrieved.
    #[error("fetch failed for {date}: {reason}")]
    FetchFailed { date: NaiveDate, reason: String },
    /// The daily report was retrieved but lacks an expected field.
    #[error("daily balance for {date} has no field '{field}'")]
    MissingField { date: NaiveDate, field: String },
    /// A field of the daily report is not a decimal number.
    #[error("daily balance for {date}: field '{field}' holds '{raw}', not a number")]
    InvalidNumber {
        date: NaiveDate,
        field: String,
        raw: String,
    },
    /// The provider returned a table that does not cover the requested window.
    #[error(
        "fetched {rows} rows for {first}..{last}, expected {expected_rows} rows for {expected_first}..{expected_last}"
    )]
    IncompleteWindow {
        expected_first: NaiveDate,
        expected_last: NaiveDate,
        expected_rows: usize,
        first: NaiveDate,
        last: NaiveDate,
        rows: usize,
    },
    /// The sink rejected or could not receive the bulletin.
    #[error("publish failed: {reason}")]
    PublishFailed { status: Option<u16>, reason: String },
    /// A credential expected in the environment is absent.
    #[error("environment variable {0} with the publishing token is not set")]
    MissingCredential(String),
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
    /// Fetched values do not form a valid table.
    #[error(transparent)]
    Table(#[from] CalcEngineError),
}
