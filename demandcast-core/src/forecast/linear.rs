//! Ordinary least squares trend over calendar-day offsets.
//!
//! Fits `y = intercept + slope * t` where `t` is the number of days since
//! the first historical date, so gaps in the history are respected.

use chrono::NaiveDate;

use super::backend::{
    BackendError, ForecastBackend, RawForecast, SeriesPoint, YHAT, YHAT_LOWER, YHAT_UPPER,
};
use super::interval;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    interval_width: f64,
}

/// Fitted coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    pub origin: NaiveDate,
}

impl LinearFit {
    pub fn predict(&self, date: NaiveDate) -> f64 {
        let t = (date - self.origin).num_days() as f64;
        self.intercept + self.slope * t
    }
}

impl LinearTrend {
    pub fn new(interval_width: f64) -> Self {
        Self { interval_width }
    }

    pub fn fit(history: &[SeriesPoint]) -> Result<LinearFit, BackendError> {
        let Some(first) = history.first() else {
            return Err(BackendError::InsufficientHistory {
                required: 2,
                actual: 0,
            });
        };
        if history.len() < 2 {
            return Err(BackendError::InsufficientHistory {
                required: 2,
                actual: history.len(),
            });
        }

        let origin = first.date;
        let n = history.len() as f64;
        let ts: Vec<f64> = history
            .iter()
            .map(|p| (p.date - origin).num_days() as f64)
            .collect();

        let sum_t: f64 = ts.iter().sum();
        let sum_y: f64 = history.iter().map(|p| p.value).sum();
        let sum_t2: f64 = ts.iter().map(|t| t * t).sum();
        let sum_ty: f64 = ts.iter().zip(history).map(|(t, p)| t * p.value).sum();

        let denominator = n * sum_t2 - sum_t * sum_t;
        if denominator.abs() < 1e-10 {
            return Err(BackendError::Numerical(
                "singular design: history dates are not distinct".into(),
            ));
        }

        let slope = (n * sum_ty - sum_t * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_t) / n;

        if !slope.is_finite() || !intercept.is_finite() {
            return Err(BackendError::Numerical("non-finite coefficients".into()));
        }

        Ok(LinearFit {
            intercept,
            slope,
            origin,
        })
    }
}

impl ForecastBackend for LinearTrend {
    fn name(&self) -> &str {
        "linear"
    }

    fn fit_predict(
        &self,
        history: &[SeriesPoint],
        future: &[NaiveDate],
    ) -> Result<RawForecast, BackendError> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(BackendError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }

        let fit = Self::fit(history)?;
        let residuals: Vec<f64> = history
            .iter()
            .map(|p| p.value - fit.predict(p.date))
            .collect();
        let std_dev = interval::residual_std(&residuals);
        let z = interval::z_score(self.interval_width);
        let last = history[history.len() - 1].date;

        let mut ds = Vec::with_capacity(history.len() + future.len());
        let mut yhat = Vec::with_capacity(ds.capacity());
        let mut lower = Vec::with_capacity(ds.capacity());
        let mut upper = Vec::with_capacity(ds.capacity());

        let dates = history.iter().map(|p| p.date).chain(future.iter().copied());
        for date in dates {
            let point = fit.predict(date);
            let steps_ahead = (date - last).num_days().max(0);
            let (lo, hi) = interval::bounds(point, std_dev, z, steps_ahead);
            ds.push(date);
            yhat.push(point);
            lower.push(lo);
            upper.push(hi);
        }

        Ok(RawForecast::new(ds)
            .with_column(YHAT, yhat)
            .with_column(YHAT_LOWER, lower)
            .with_column(YHAT_UPPER, upper))
    }
}
