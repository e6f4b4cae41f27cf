//! Residual-based prediction intervals shared by the built-in backends.

/// Approximate two-sided z-score for an interval width.
pub fn z_score(interval_width: f64) -> f64 {
    match interval_width {
        w if w >= 0.99 => 2.576,
        w if w >= 0.95 => 1.96,
        w if w >= 0.90 => 1.645,
        w if w >= 0.80 => 1.282,
        w if w >= 0.68 => 0.994,
        w if w >= 0.50 => 0.674,
        _ => 0.253,
    }
}

/// Population standard deviation of residuals (0 for an empty slice).
pub fn residual_std(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let variance = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Lower/upper bounds around `point`, widening with the square root of
/// `steps_ahead` (use 0 for in-sample rows).
pub fn bounds(point: f64, std_dev: f64, z: f64, steps_ahead: i64) -> (f64, f64) {
    let scale = (steps_ahead.max(1) as f64).sqrt();
    let half = z * std_dev * scale;
    (point - half, point + half)
}
