//! Domain types shared by every pipeline stage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One row of the sales dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub region: String,
    pub product_category: String,
    pub units_sold: f64,
    pub revenue: f64,
}

/// Per-date totals after filtering. Dates need not be contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub units_sold_total: f64,
    pub revenue_total: f64,
}

impl DailyAggregate {
    /// The total for the given measure.
    pub fn value(&self, measure: Measure) -> f64 {
        match measure {
            Measure::UnitsSold => self.units_sold_total,
            Measure::Revenue => self.revenue_total,
        }
    }
}

/// Normalized forecast output for one date.
///
/// `lower_bound <= point_estimate <= upper_bound` is expected but not
/// enforced: the bounds come from the forecasting backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastRow {
    pub fn field(&self, field: ForecastField) -> f64 {
        match field {
            ForecastField::PointEstimate => self.point_estimate,
            ForecastField::LowerBound => self.lower_bound,
            ForecastField::UpperBound => self.upper_bound,
        }
    }
}

/// A forecast row whose evaluated field exceeded the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub threshold: f64,
    /// Column that was compared against `threshold`.
    pub field: ForecastField,
    /// Value of `field` on this row.
    pub value: f64,
}

/// Which aggregated measure feeds the forecast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    #[default]
    UnitsSold,
    Revenue,
}

impl Measure {
    pub fn label(&self) -> &'static str {
        match self {
            Measure::UnitsSold => "Units Sold",
            Measure::Revenue => "Revenue",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "units" | "units_sold" | "units-sold" => Ok(Measure::UnitsSold),
            "revenue" => Ok(Measure::Revenue),
            other => Err(format!("unknown measure '{other}' (expected units_sold or revenue)")),
        }
    }
}

/// Which forecast column alert thresholds are compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastField {
    #[default]
    PointEstimate,
    LowerBound,
    UpperBound,
}

impl ForecastField {
    pub fn label(&self) -> &'static str {
        match self {
            ForecastField::PointEstimate => "Forecast",
            ForecastField::LowerBound => "Lower Bound",
            ForecastField::UpperBound => "Upper Bound",
        }
    }
}

impl FromStr for ForecastField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" | "point_estimate" | "forecast" => Ok(ForecastField::PointEstimate),
            "lower" | "lower_bound" => Ok(ForecastField::LowerBound),
            "upper" | "upper_bound" => Ok(ForecastField::UpperBound),
            other => Err(format!(
                "unknown forecast field '{other}' (expected point, lower or upper)"
            )),
        }
    }
}

/// A loaded, read-only sales dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Records sorted ascending by date.
    pub records: Vec<SalesRecord>,
    /// Whether the source had a `Revenue` column.
    pub has_revenue: bool,
    /// BLAKE3 hex digest of the source bytes.
    pub fingerprint: String,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct regions, sorted.
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct product categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.product_category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First and last date, or `None` for an empty dataset.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}
