//! Last-value-carried-forward baseline. Emits no bound columns.

use chrono::NaiveDate;

use super::backend::{BackendError, ForecastBackend, RawForecast, SeriesPoint, YHAT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaiveLast;

impl ForecastBackend for NaiveLast {
    fn name(&self) -> &str {
        "naive"
    }

    fn fit_predict(
        &self,
        history: &[SeriesPoint],
        future: &[NaiveDate],
    ) -> Result<RawForecast, BackendError> {
        let Some(last) = history.last() else {
            return Err(BackendError::InsufficientHistory {
                required: 1,
                actual: 0,
            });
        };

        // In-sample: each date is predicted by the previous observation.
        let mut yhat: Vec<f64> = std::iter::once(history[0].value)
            .chain(history.iter().map(|p| p.value))
            .take(history.len())
            .collect();
        yhat.extend(std::iter::repeat(last.value).take(future.len()));

        let ds = history
            .iter()
            .map(|p| p.date)
            .chain(future.iter().copied())
            .collect();

        Ok(RawForecast::new(ds).with_column(YHAT, yhat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::backend::YHAT_LOWER;

    #[test]
    fn carries_last_value_forward_without_bounds() {
        let history = vec![
            SeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                value: 4.0,
            },
            SeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                value: 9.0,
            },
        ];
        let future = vec![NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()];
        let raw = NaiveLast.fit_predict(&history, &future).unwrap();

        assert_eq!(raw.column(YHAT).unwrap(), &[4.0, 4.0, 9.0]);
        assert!(raw.column(YHAT_LOWER).is_none());
    }
}
