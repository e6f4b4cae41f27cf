//! Structured error types for the pipeline stages.
//!
//! Every stage fails fast with one of these variants. They are designed to
//! be displayable as-is by a presentation layer (CLI or otherwise); the core
//! never retries or substitutes data on failure.

use chrono::NaiveDate;
use thiserror::Error;

use crate::forecast::BackendError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing required column '{column}' (found: {found})")]
    Schema { column: String, found: String },

    #[error("cannot parse date '{value}' on row {row} ({bad_rows} row(s) with unparseable dates)")]
    DateParse {
        row: usize,
        value: String,
        bad_rows: usize,
    },

    #[error("invalid value '{value}' in column '{column}' on row {row}: {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error(
        "not enough data to forecast: {distinct_dates} distinct date(s), need at least {required}"
    )]
    InsufficientData {
        distinct_dates: usize,
        required: usize,
    },

    #[error("forecast backend '{backend}' is unavailable")]
    BackendUnavailable { backend: String },

    #[error("forecast failed: {0}")]
    Forecast(#[from] BackendError),

    #[error("cannot format {column} for {date}: value {value} is not finite")]
    Format {
        date: NaiveDate,
        column: String,
        value: f64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
