//! Request runner: wires filter, aggregation, forecast and alerts.
//!
//! Two entry points, one per presentation view:
//! - `run_trend()`: recent-sales daily totals, no minimum-dates check.
//! - `run_forecast()`: full pass through the forecast adapter and alerts.
//!
//! Both take a loaded `Dataset` by reference and never mutate it.

use std::num::NonZeroU32;

use demandcast_core::forecast::{backend_by_name, ForecastAdapter};
use demandcast_core::loader::REVENUE_COLUMN;
use demandcast_core::{
    aggregate, aggregate_unchecked, alert, filter, Alert, DailyAggregate, Dataset, FilterCriteria,
    ForecastField, ForecastTable, Measure, PipelineError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, PipelineConfig};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Current schema version for persisted forecast manifests.
pub const SCHEMA_VERSION: u32 = 1;

/// One forecast request from the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub criteria: FilterCriteria,
    pub horizon_days: NonZeroU32,
    pub measure: Measure,
    pub backend: String,
    pub threshold: Option<f64>,
    pub alert_field: ForecastField,
}

impl ForecastRequest {
    /// A request using the configured defaults.
    pub fn from_config(config: &PipelineConfig, criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            horizon_days: config.horizon_days,
            measure: config.measure,
            backend: config.backend.clone(),
            threshold: config.alerts.threshold,
            alert_field: config.alerts.field,
        }
    }
}

/// Everything a presentation layer needs to render one forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOutcome {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub dataset_fingerprint: String,
    pub request: ForecastRequest,
    /// Aggregated history the backend was fitted on.
    pub history: Vec<DailyAggregate>,
    pub table: ForecastTable,
    /// Alerts over the future rows only; empty when no threshold was set.
    pub alerts: Vec<Alert>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ForecastOutcome {
    pub fn future_rows(&self) -> &[demandcast_core::ForecastRow] {
        self.table.future_rows()
    }
}

/// Daily totals for the recent-sales view.
///
/// Unlike the forecast path, a single date (or none) is a valid result.
pub fn run_trend(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<DailyAggregate> {
    let records = filter::apply(&dataset.records, criteria);
    aggregate_unchecked(&records)
}

/// Run one forecast request against a loaded dataset.
pub fn run_forecast(
    dataset: &Dataset,
    request: &ForecastRequest,
    config: &PipelineConfig,
) -> Result<ForecastOutcome, RunError> {
    config.validate()?;
    if let Some(t) = request.threshold {
        if !t.is_finite() {
            return Err(ConfigError::Invalid(format!("threshold must be finite, got {t}")).into());
        }
    }

    if request.measure == Measure::Revenue && !dataset.has_revenue {
        return Err(PipelineError::Schema {
            column: REVENUE_COLUMN.to_string(),
            found: "dataset has no revenue column".to_string(),
        }
        .into());
    }

    let backend = backend_by_name(&request.backend, &config.backend_settings())?;

    let records = filter::apply(&dataset.records, &request.criteria);
    let history = aggregate(&records)?;
    let table = ForecastAdapter::new(backend.as_ref())
        .with_measure(request.measure)
        .forecast(&history, request.horizon_days)?;

    let alerts = match request.threshold {
        Some(threshold) => {
            alert::evaluate_field(table.future_rows(), threshold, request.alert_field)
        }
        None => Vec::new(),
    };

    info!(
        dataset = %&dataset.fingerprint[..dataset.fingerprint.len().min(12)],
        history = history.len(),
        horizon = request.horizon_days.get(),
        alerts = alerts.len(),
        "forecast request complete"
    );

    Ok(ForecastOutcome {
        schema_version: SCHEMA_VERSION,
        dataset_fingerprint: dataset.fingerprint.clone(),
        request: request.clone(),
        history,
        table,
        alerts,
    })
}
