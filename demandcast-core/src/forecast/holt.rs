//! Holt's linear (double) exponential smoothing.
//!
//! Smoothing runs over the observed sequence. Future values extrapolate the
//! final trend by calendar days past the last observation, so one trend
//! unit is treated as one day.

use chrono::NaiveDate;

use super::backend::{
    BackendError, ForecastBackend, RawForecast, SeriesPoint, YHAT, YHAT_LOWER, YHAT_UPPER,
};
use super::interval;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoltLinear {
    alpha: f64,
    beta: f64,
    interval_width: f64,
}

/// Smoothed state after the last observation, plus one-step-ahead fits.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltState {
    pub level: f64,
    pub trend: f64,
    pub fitted: Vec<f64>,
}

impl HoltLinear {
    pub fn new(alpha: f64, beta: f64, interval_width: f64) -> Self {
        Self {
            alpha,
            beta,
            interval_width,
        }
    }

    fn validate(&self) -> Result<(), BackendError> {
        let unit = |v: f64| v > 0.0 && v <= 1.0;
        if !unit(self.alpha) || !unit(self.beta) {
            return Err(BackendError::InvalidParameter(format!(
                "smoothing factors must be in (0, 1], got alpha={} beta={}",
                self.alpha, self.beta
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(BackendError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        Ok(())
    }

    pub fn smooth(&self, values: &[f64]) -> Result<HoltState, BackendError> {
        if values.len() < 2 {
            return Err(BackendError::InsufficientHistory {
                required: 2,
                actual: values.len(),
            });
        }

        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut fitted = Vec::with_capacity(values.len());
        fitted.push(values[0]);

        for &y in &values[1..] {
            fitted.push(level + trend);
            let prev_level = level;
            level = self.alpha * y + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
        }

        if !level.is_finite() || !trend.is_finite() {
            return Err(BackendError::Numerical("smoothing diverged".into()));
        }

        Ok(HoltState {
            level,
            trend,
            fitted,
        })
    }
}

impl ForecastBackend for HoltLinear {
    fn name(&self) -> &str {
        "holt"
    }

    fn fit_predict(
        &self,
        history: &[SeriesPoint],
        future: &[NaiveDate],
    ) -> Result<RawForecast, BackendError> {
        self.validate()?;

        let values: Vec<f64> = history.iter().map(|p| p.value).collect();
        let state = self.smooth(&values)?;
        let residuals: Vec<f64> = values
            .iter()
            .zip(&state.fitted)
            .map(|(y, f)| y - f)
            .collect();
        let std_dev = interval::residual_std(&residuals);
        let z = interval::z_score(self.interval_width);
        let last = history[history.len() - 1].date;

        let mut ds: Vec<NaiveDate> = history.iter().map(|p| p.date).collect();
        let mut yhat = state.fitted.clone();
        let (mut lower, mut upper): (Vec<f64>, Vec<f64>) = state
            .fitted
            .iter()
            .map(|&f| interval::bounds(f, std_dev, z, 0))
            .unzip();

        for &date in future {
            let h = (date - last).num_days();
            let point = state.level + state.trend * h as f64;
            let (lo, hi) = interval::bounds(point, std_dev, z, h);
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
