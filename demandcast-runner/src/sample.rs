//! Synthetic sales data for demos and tests.
//!
//! Output is a regular sales CSV (`Date,Region,Product_Category,Units_Sold,Revenue`)
//! that round-trips through the loader. Generation is deterministic in
//! the seed string: the RNG is seeded from its BLAKE3 digest.

use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ConfigError;
use crate::runner::RunError;

pub const SAMPLE_REGIONS: [&str; 4] = ["North", "South", "East", "West"];

/// Categories with their unit price.
pub const SAMPLE_CATEGORIES: [(&str, f64); 3] =
    [("Electronics", 199.0), ("Clothing", 35.0), ("Home", 60.0)];

#[derive(Debug, Clone, PartialEq)]
pub struct SampleOptions {
    pub start: NaiveDate,
    pub days: u32,
    pub seed: String,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            days: 90,
            seed: "demandcast".to_string(),
        }
    }
}

/// Generate one row per (date, region, category).
///
/// Units follow a per-series base level plus a slow upward trend, a
/// weekend bump and uniform noise, floored at zero.
pub fn generate_sample_csv(opts: &SampleOptions) -> Result<Vec<u8>, RunError> {
    let seed: [u8; 32] = *blake3::hash(opts.seed.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", "Region", "Product_Category", "Units_Sold", "Revenue"])
        .map_err(csv_to_io)?;

    // Base level per series, drawn once so each series keeps its own scale.
    let mut bases = Vec::with_capacity(SAMPLE_REGIONS.len() * SAMPLE_CATEGORIES.len());
    for _ in 0..SAMPLE_REGIONS.len() * SAMPLE_CATEGORIES.len() {
        bases.push(rng.gen_range(20.0..80.0_f64));
    }

    if opts.days > 0
        && opts
            .start
            .checked_add_signed(Duration::days(i64::from(opts.days - 1)))
            .is_none()
    {
        return Err(RunError::Config(ConfigError::Invalid(format!(
            "{} sample days from {} run past the calendar limit",
            opts.days, opts.start
        ))));
    }

    for (day, date) in (0..opts.days).zip(opts.start.iter_days()) {
        let weekend = date.weekday().number_from_monday() >= 6;
        let mut series = 0;
        for region in SAMPLE_REGIONS {
            for (category, price) in SAMPLE_CATEGORIES {
                let trend = 0.15 * f64::from(day);
                let seasonal = if weekend { 12.0 } else { 0.0 };
                let noise = rng.gen_range(-6.0..6.0_f64);
                let units = (bases[series] + trend + seasonal + noise).round().max(0.0) as u64;
                series += 1;

                wtr.write_record([
                    date.format("%Y-%m-%d").to_string(),
                    region.to_string(),
                    category.to_string(),
                    units.to_string(),
                    format!("{:.2}", units as f64 * price),
                ])
                .map_err(csv_to_io)?;
            }
        }
    }

    wtr.into_inner().map_err(|e| RunError::Io(e.into_error()))
}

/// Generate a sample dataset and write it to `path`.
pub fn write_sample_csv(path: &Path, opts: &SampleOptions) -> Result<(), RunError> {
    let bytes = generate_sample_csv(opts)?;
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), days = opts.days, "sample dataset written");
    Ok(())
}

fn csv_to_io(e: csv::Error) -> RunError {
    RunError::Io(e.into())
}
