//! Forecast adapter: projects daily aggregates into a `(date, value)`
//! series, invokes a [`ForecastBackend`], and normalizes its raw output.
//!
//! Bound fallback: when a backend omits `yhat_lower` / `yhat_upper`, both
//! bounds are set to the point estimate and the table is marked with
//! `bounds_supplied = false`. Exports use that flag to drop the bound
//! columns instead of presenting the fallback as a real interval.

pub mod backend;
pub mod holt;
pub mod interval;
pub mod linear;
pub mod naive;

use std::num::NonZeroU32;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::ensure_forecastable;
use crate::domain::{DailyAggregate, ForecastRow, Measure};
use crate::error::{PipelineError, Result};
use crate::export::CsvColumn;

pub use backend::{
    backend_by_name, BackendError, BackendSettings, ForecastBackend, RawForecast, SeriesPoint,
    BACKEND_NAMES, YHAT, YHAT_LOWER, YHAT_UPPER,
};

/// Normalized forecast output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    pub backend: String,
    pub measure: Measure,
    /// Number of historical dates the backend was fitted on.
    pub history_len: usize,
    /// Requested number of future days.
    pub horizon: usize,
    /// False when the backend omitted bound columns and the point estimate
    /// was substituted.
    pub bounds_supplied: bool,
    /// Fitted rows for history dates followed by `horizon` future rows.
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    /// The trailing `horizon` rows: the forecast proper.
    pub fn future_rows(&self) -> &[ForecastRow] {
        self.tail(self.horizon)
    }

    /// The trailing `n` rows (all rows if `n` exceeds the table length).
    pub fn tail(&self, n: usize) -> &[ForecastRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    /// Columns worth exporting for this table.
    pub fn csv_columns(&self) -> &'static [CsvColumn] {
        if self.bounds_supplied {
            CsvColumn::ALL
        } else {
            CsvColumn::POINT_ONLY
        }
    }
}

/// The `horizon` calendar days following `last`, with no gaps.
///
/// Fails before allocating when the final day would fall past the
/// representable calendar.
pub fn future_dates(last: NaiveDate, horizon: NonZeroU32) -> Result<Vec<NaiveDate>> {
    let days = i64::from(horizon.get());
    if last.checked_add_signed(Duration::days(days)).is_none() {
        return Err(PipelineError::Forecast(BackendError::InvalidParameter(
            format!("horizon of {days} days from {last} runs past the calendar limit"),
        )));
    }
    Ok(last.iter_days().skip(1).take(days as usize).collect())
}

/// Project aggregates onto the configured measure.
pub fn project(history: &[DailyAggregate], measure: Measure) -> Vec<SeriesPoint> {
    history
        .iter()
        .map(|d| SeriesPoint {
            date: d.date,
            value: d.value(measure),
        })
        .collect()
}

/// Couples a backend with the measure it forecasts.
pub struct ForecastAdapter<'a> {
    backend: &'a dyn ForecastBackend,
    measure: Measure,
}

impl<'a> ForecastAdapter<'a> {
    pub fn new(backend: &'a dyn ForecastBackend) -> Self {
        Self {
            backend,
            measure: Measure::default(),
        }
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measure = measure;
        self
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    /// Fit on `history` and forecast `horizon_days` beyond its last date.
    ///
    /// The returned table holds at least `horizon_days` rows; the trailing
    /// `horizon_days` rows are the consecutive days after the last
    /// historical date. Failures are not retried.
    pub fn forecast(
        &self,
        history: &[DailyAggregate],
        horizon_days: NonZeroU32,
    ) -> Result<ForecastTable> {
        ensure_forecastable(history)?;

        let backend_name = self.backend.name().to_string();
        if !self.backend.is_available() {
            return Err(PipelineError::BackendUnavailable {
                backend: backend_name,
            });
        }

        let series = project(history, self.measure);
        let last = series[series.len() - 1].date;
        let future = future_dates(last, horizon_days)?;

        debug!(
            backend = %backend_name,
            measure = %self.measure,
            history = series.len(),
            horizon = future.len(),
            "invoking forecast backend"
        );

        let raw = self
            .backend
            .fit_predict(&series, &future)
            .map_err(|e| match e {
                BackendError::Unavailable(_) => PipelineError::BackendUnavailable {
                    backend: backend_name.clone(),
                },
                other => PipelineError::Forecast(other),
            })?;

        let (rows, bounds_supplied) = normalize(&raw, &future)?;
        if !bounds_supplied {
            warn!(
                backend = %backend_name,
                "backend returned no bound columns; bounds set to the point estimate"
            );
        }

        info!(
            backend = %backend_name,
            rows = rows.len(),
            first_future = %future[0],
            "forecast complete"
        );

        Ok(ForecastTable {
            backend: backend_name,
            measure: self.measure,
            history_len: series.len(),
            horizon: future.len(),
            bounds_supplied,
            rows,
        })
    }
}

/// Map raw backend columns onto [`ForecastRow`]s, validating shape.
fn normalize(raw: &RawForecast, future: &[NaiveDate]) -> Result<(Vec<ForecastRow>, bool)> {
    let malformed = |msg: String| PipelineError::Forecast(BackendError::MalformedOutput(msg));

    let yhat = raw
        .column(YHAT)
        .ok_or_else(|| malformed(format!("missing '{YHAT}' column")))?;
    let n = raw.ds.len();
    if yhat.len() != n {
        return Err(malformed(format!(
            "'{YHAT}' has {} values for {n} dates",
            yhat.len()
        )));
    }

    let lower = raw.column(YHAT_LOWER);
    let upper = raw.column(YHAT_UPPER);
    for (name, col) in [(YHAT_LOWER, lower), (YHAT_UPPER, upper)] {
        if let Some(col) = col {
            if col.len() != n {
                return Err(malformed(format!(
                    "'{name}' has {} values for {n} dates",
                    col.len()
                )));
            }
        }
    }

    if raw.ds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(malformed("dates are not strictly increasing".into()));
    }
    if n < future.len() || raw.ds[n - future.len()..] != *future {
        return Err(malformed(
            "trailing rows do not match the requested future dates".into(),
        ));
    }

    let rows = (0..n)
        .map(|i| {
            let point = yhat[i];
            ForecastRow {
                date: raw.ds[i],
                point_estimate: point,
                lower_bound: lower.map_or(point, |c| c[i]),
                upper_bound: upper.map_or(point, |c| c[i]),
            }
        })
        .collect();

    Ok((rows, lower.is_some() && upper.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn history(values: &[(u32, f64)]) -> Vec<DailyAggregate> {
        values
            .iter()
            .map(|&(day, units)| DailyAggregate {
                date: d(day),
                units_sold_total: units,
                revenue_total: units * 10.0,
            })
            .collect()
    }

    fn horizon(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    struct Broken;

    impl ForecastBackend for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn fit_predict(
            &self,
            _: &[SeriesPoint],
            _: &[NaiveDate],
        ) -> std::result::Result<RawForecast, BackendError> {
            Err(BackendError::Numerical("optimizer failed".into()))
        }
    }

    struct Offline;

    impl ForecastBackend for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        fn is_available(&self) -> bool {
            false
        }

        fn fit_predict(
            &self,
            _: &[SeriesPoint],
            _: &[NaiveDate],
        ) -> std::result::Result<RawForecast, BackendError> {
            unreachable!("unavailable backends are never invoked")
        }
    }

    /// Returns only the future rows, with a one-day gap.
    struct Gappy;

    impl ForecastBackend for Gappy {
        fn name(&self) -> &str {
            "gappy"
        }

        fn fit_predict(
            &self,
            _: &[SeriesPoint],
            future: &[NaiveDate],
        ) -> std::result::Result<RawForecast, BackendError> {
            let ds: Vec<NaiveDate> = future.iter().map(|f| *f + Duration::days(1)).collect();
            let n = ds.len();
            Ok(RawForecast::new(ds).with_column(YHAT, vec![1.0; n]))
        }
    }

    #[test]
    fn two_day_history_forecasts_seven_days() {
        let backend = linear::LinearTrend::new(0.8);
        let table = ForecastAdapter::new(&backend)
            .forecast(&history(&[(1, 10.0), (2, 12.0)]), horizon(7))
            .unwrap();

        assert!(table.rows.len() >= 7);
        let future = table.future_rows();
        assert_eq!(future.len(), 7);
        assert_eq!(future[0].date, d(3));
        assert_eq!(future[6].date, d(9));
        for w in future.windows(2) {
            assert_eq!(w[1].date - w[0].date, Duration::days(1));
        }
        // Exact line through (1,10),(2,12): Jan 3 -> 14.
        assert!((future[0].point_estimate - 14.0).abs() < 1e-9);
        assert!(table.bounds_supplied);
    }

    #[test]
    fn single_date_is_insufficient() {
        let backend = linear::LinearTrend::new(0.8);
        let err = ForecastAdapter::new(&backend)
            .forecast(&history(&[(1, 5.0)]), horizon(7))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { .. }));
    }

    #[test]
    fn revenue_measure_is_projected() {
        let hist = history(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let series = project(&hist, Measure::Revenue);
        assert_eq!(series[2].value, 30.0);

        let backend = linear::LinearTrend::new(0.8);
        let table = ForecastAdapter::new(&backend)
            .with_measure(Measure::Revenue)
            .forecast(&hist, horizon(1))
            .unwrap();
        assert_eq!(table.measure, Measure::Revenue);
        assert!((table.future_rows()[0].point_estimate - 40.0).abs() < 1e-9);
    }

    #[test]
    fn missing_bounds_fall_back_to_point() {
        let table = ForecastAdapter::new(&naive::NaiveLast)
            .forecast(&history(&[(1, 3.0), (2, 8.0)]), horizon(2))
            .unwrap();
        assert!(!table.bounds_supplied);
        for row in &table.rows {
            assert_eq!(row.lower_bound, row.point_estimate);
            assert_eq!(row.upper_bound, row.point_estimate);
        }
        assert_eq!(table.csv_columns(), CsvColumn::POINT_ONLY);
    }

    #[test]
    fn backend_failure_is_wrapped() {
        let err = ForecastAdapter::new(&Broken)
            .forecast(&history(&[(1, 1.0), (2, 2.0)]), horizon(3))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Forecast(BackendError::Numerical(_))));
    }

    #[test]
    fn unavailable_backend_is_not_invoked() {
        let err = ForecastAdapter::new(&Offline)
            .forecast(&history(&[(1, 1.0), (2, 2.0)]), horizon(3))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::BackendUnavailable { ref backend } if backend == "offline"
        ));
    }

    #[test]
    fn mismatched_future_dates_are_malformed() {
        let err = ForecastAdapter::new(&Gappy)
            .forecast(&history(&[(1, 1.0), (2, 2.0)]), horizon(3))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Forecast(BackendError::MalformedOutput(_))
        ));
    }

    #[test]
    fn future_dates_cross_month_boundary() {
        let dates = future_dates(d(30), horizon(3)).unwrap();
        let feb = |day| NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        assert_eq!(dates, vec![d(31), feb(1), feb(2)]);
    }

    #[test]
    fn horizon_past_calendar_limit_is_invalid() {
        let err = future_dates(d(1), horizon(u32::MAX)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Forecast(BackendError::InvalidParameter(_))
        ));

        let near_end = NaiveDate::MAX - Duration::days(2);
        assert_eq!(future_dates(near_end, horizon(2)).unwrap().len(), 2);
        assert!(future_dates(near_end, horizon(3)).is_err());
    }

    #[test]
    fn adapter_rejects_horizon_past_calendar_limit() {
        let backend = linear::LinearTrend::new(0.8);
        let err = ForecastAdapter::new(&backend)
            .forecast(&history(&[(1, 1.0), (2, 2.0)]), horizon(u32::MAX))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Forecast(BackendError::InvalidParameter(_))
        ));
    }

    #[test]
    fn tail_clamps_to_table_length() {
        let backend = linear::LinearTrend::new(0.8);
        let table = ForecastAdapter::new(&backend)
            .forecast(&history(&[(1, 1.0), (2, 2.0)]), horizon(1))
            .unwrap();
        assert_eq!(table.tail(100).len(), table.rows.len());
    }
}
