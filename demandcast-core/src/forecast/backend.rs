//! The forecasting capability as a trait, plus the built-in backend registry.
//!
//! A backend is a pure `fit_predict(history, future) -> RawForecast`
//! function: no model object escapes, so callers never manage fit state.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::holt::HoltLinear;
use super::linear::LinearTrend;
use super::naive::NaiveLast;
use crate::error::PipelineError;

/// Raw output column names.
pub const YHAT: &str = "yhat";
pub const YHAT_LOWER: &str = "yhat_lower";
pub const YHAT_UPPER: &str = "yhat_upper";

/// Names accepted by [`backend_by_name`].
pub const BACKEND_NAMES: &[&str] = &["linear", "holt", "naive"];

/// Errors raised by a forecasting backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("insufficient history: need {required} points, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("malformed backend output: {0}")]
    MalformedOutput(String),
}

/// One historical observation in the shape backends consume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Backend output: a table keyed by `ds` with named numeric columns.
///
/// `yhat` is mandatory; `yhat_lower` / `yhat_upper` may be absent.
/// Rows cover the historical (fitted) dates followed by the future dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawForecast {
    pub ds: Vec<NaiveDate>,
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl RawForecast {
    pub fn new(ds: Vec<NaiveDate>) -> Self {
        Self {
            ds,
            columns: BTreeMap::new(),
        }
    }

    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Self {
        self.columns.insert(name.to_string(), values);
        self
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }
}

/// A black-box time-series forecasting capability.
pub trait ForecastBackend: Send + Sync {
    /// Short name used in configuration and reports.
    fn name(&self) -> &str;

    /// Whether the backend can currently be invoked.
    fn is_available(&self) -> bool {
        true
    }

    /// Fit on `history` (chronological, unique dates) and predict every
    /// historical date plus each date in `future`.
    fn fit_predict(
        &self,
        history: &[SeriesPoint],
        future: &[NaiveDate],
    ) -> Result<RawForecast, BackendError>;
}

/// Tunables for the built-in backends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Width of the prediction interval, in (0, 1).
    pub interval_width: f64,
    /// Holt level smoothing factor, in (0, 1].
    pub holt_alpha: f64,
    /// Holt trend smoothing factor, in (0, 1].
    pub holt_beta: f64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            interval_width: 0.8,
            holt_alpha: 0.5,
            holt_beta: 0.3,
        }
    }
}

/// Build a built-in backend by name.
///
/// Unknown names fail with `BackendUnavailable`, the same way a missing
/// forecasting dependency would.
pub fn backend_by_name(
    name: &str,
    settings: &BackendSettings,
) -> Result<Box<dyn ForecastBackend>, PipelineError> {
    match name {
        "linear" => Ok(Box::new(LinearTrend::new(settings.interval_width))),
        "holt" => Ok(Box::new(HoltLinear::new(
            settings.holt_alpha,
            settings.holt_beta,
            settings.interval_width,
        ))),
        "naive" => Ok(Box::new(NaiveLast)),
        other => Err(PipelineError::BackendUnavailable {
            backend: other.to_string(),
        }),
    }
}
