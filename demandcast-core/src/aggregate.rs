//! Per-date aggregation of sales records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{DailyAggregate, SalesRecord};
use crate::error::{PipelineError, Result};

/// Minimum number of distinct dates needed to fit a trend.
pub const MIN_FORECAST_DATES: usize = 2;

/// Group records by date and sum units and revenue.
///
/// Fails with `InsufficientData` when fewer than [`MIN_FORECAST_DATES`]
/// distinct dates remain.
pub fn aggregate(records: &[SalesRecord]) -> Result<Vec<DailyAggregate>> {
    let daily = aggregate_unchecked(records);
    ensure_forecastable(&daily)?;
    Ok(daily)
}

/// Same grouping as [`aggregate`] without the minimum-dates check.
///
/// Dates with no records are omitted; output is chronological.
pub fn aggregate_unchecked(records: &[SalesRecord]) -> Vec<DailyAggregate> {
    let mut by_date: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for r in records {
        let totals = by_date.entry(r.date).or_insert((0.0, 0.0));
        totals.0 += r.units_sold;
        totals.1 += r.revenue;
    }

    let daily: Vec<DailyAggregate> = by_date
        .into_iter()
        .map(|(date, (units, revenue))| DailyAggregate {
            date,
            units_sold_total: units,
            revenue_total: revenue,
        })
        .collect();

    debug!(records = records.len(), dates = daily.len(), "aggregated by date");
    daily
}

/// Check that an aggregated history has enough distinct dates to forecast.
pub fn ensure_forecastable(history: &[DailyAggregate]) -> Result<()> {
    if history.len() < MIN_FORECAST_DATES {
        return Err(PipelineError::InsufficientData {
            distinct_dates: history.len(),
            required: MIN_FORECAST_DATES,
        });
    }
    Ok(())
}
