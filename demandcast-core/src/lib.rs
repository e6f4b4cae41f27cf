//! DemandCast Core: sales data preparation and forecast extraction.
//!
//! This crate contains the pipeline stages, leaf first:
//! - Dataset loading with column and date validation
//! - Region/category and trailing-window filtering
//! - Per-date aggregation of units and revenue
//! - Forecast adapter over a pluggable black-box backend
//! - Threshold alerts over forecast rows
//! - CSV, text and Markdown export
//!
//! Every stage takes borrowed input and returns new values, so one
//! intermediate can feed several consumers within a request.

pub mod aggregate;
pub mod alert;
pub mod domain;
pub mod error;
pub mod export;
pub mod filter;
pub mod forecast;
pub mod loader;

pub use aggregate::{aggregate, aggregate_unchecked, MIN_FORECAST_DATES};
pub use domain::{Alert, DailyAggregate, Dataset, ForecastField, ForecastRow, Measure, SalesRecord};
pub use error::{PipelineError, Result};
pub use filter::FilterCriteria;
pub use forecast::{
    backend_by_name, BackendError, BackendSettings, ForecastAdapter, ForecastBackend,
    ForecastTable, RawForecast, SeriesPoint,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline types can cross threads.
    ///
    /// A presentation layer may hand a finished request to a render thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<SalesRecord>();
        require_sync::<SalesRecord>();
        require_send::<Dataset>();
        require_sync::<Dataset>();
        require_send::<FilterCriteria>();
        require_sync::<FilterCriteria>();
        require_send::<DailyAggregate>();
        require_sync::<DailyAggregate>();
        require_send::<ForecastRow>();
        require_sync::<ForecastRow>();
        require_send::<ForecastTable>();
        require_sync::<ForecastTable>();
        require_send::<Alert>();
        require_sync::<Alert>();
        require_send::<PipelineError>();
        require_sync::<PipelineError>();

        require_send::<forecast::linear::LinearTrend>();
        require_sync::<forecast::linear::LinearTrend>();
        require_send::<forecast::holt::HoltLinear>();
        require_sync::<forecast::holt::HoltLinear>();
        require_send::<forecast::naive::NaiveLast>();
        require_sync::<forecast::naive::NaiveLast>();
        require_send::<Box<dyn ForecastBackend>>();
        require_sync::<Box<dyn ForecastBackend>>();
    }

    /// Architecture contract: backends see only the projected series.
    ///
    /// `fit_predict` takes `&[SeriesPoint]` and the future dates, never raw
    /// records or aggregates, so no backend can depend on dataset columns.
    #[test]
    fn backend_trait_takes_only_projected_series() {
        fn _check_trait_object_builds(
            backend: &dyn ForecastBackend,
            history: &[SeriesPoint],
            future: &[chrono::NaiveDate],
        ) -> std::result::Result<RawForecast, BackendError> {
            backend.fit_predict(history, future)
        }
    }
}
