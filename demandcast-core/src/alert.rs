//! Threshold alerts over forecast rows.

use crate::domain::{Alert, ForecastField, ForecastRow};

/// Every row whose point estimate is strictly above `threshold`, in order.
///
/// Any threshold is legal; zero or negative values flag every non-negative row.
pub fn evaluate(rows: &[ForecastRow], threshold: f64) -> Vec<Alert> {
    evaluate_field(rows, threshold, ForecastField::PointEstimate)
}

/// Like [`evaluate`], comparing `field` instead of the point estimate.
///
/// NaN values never exceed a threshold.
pub fn evaluate_field(rows: &[ForecastRow], threshold: f64, field: ForecastField) -> Vec<Alert> {
    rows.iter()
        .filter_map(|row| {
            let value = row.field(field);
            (value > threshold).then_some(Alert {
                date: row.date,
                point_estimate: row.point_estimate,
                threshold,
                field,
                value,
            })
        })
        .collect()
}
