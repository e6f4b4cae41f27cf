//! Forecast export: CSV bytes, plain-text report lines, Markdown summary.
//!
//! Dates are written as ISO 8601 (`YYYY-MM-DD`) and numbers with two
//! decimals. Non-finite values are reported as `Format` errors rather than
//! written out or coerced.

use serde::{Deserialize, Serialize};

use crate::domain::{Alert, ForecastRow};
use crate::error::{PipelineError, Result};
use crate::forecast::ForecastTable;

pub const CSV_MIME: &str = "text/csv";
pub const DEFAULT_CSV_FILENAME: &str = "forecast.csv";
pub const ALT_CSV_FILENAME: &str = "forecast_result.csv";

/// A column of the exported forecast CSV. `Date` is always written first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CsvColumn {
    Forecast,
    LowerBound,
    UpperBound,
}

impl CsvColumn {
    pub const ALL: &'static [CsvColumn] = &[
        CsvColumn::Forecast,
        CsvColumn::LowerBound,
        CsvColumn::UpperBound,
    ];
    pub const POINT_ONLY: &'static [CsvColumn] = &[CsvColumn::Forecast];

    pub fn header(&self) -> &'static str {
        match self {
            CsvColumn::Forecast => "Forecast",
            CsvColumn::LowerBound => "Lower Bound",
            CsvColumn::UpperBound => "Upper Bound",
        }
    }

    fn value(&self, row: &ForecastRow) -> f64 {
        match self {
            CsvColumn::Forecast => row.point_estimate,
            CsvColumn::LowerBound => row.lower_bound,
            CsvColumn::UpperBound => row.upper_bound,
        }
    }
}

/// Format with two decimals, rejecting NaN and infinities.
fn fixed2(row: &ForecastRow, column: &str, value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(PipelineError::Format {
            date: row.date,
            column: column.to_string(),
            value,
        });
    }
    Ok(format!("{value:.2}"))
}

/// CSV with header `Date,Forecast,Lower Bound,Upper Bound`.
pub fn to_csv(rows: &[ForecastRow]) -> Result<Vec<u8>> {
    to_csv_with_columns(rows, CsvColumn::ALL)
}

/// CSV with `Date` followed by the given columns.
pub fn to_csv_with_columns(rows: &[ForecastRow], columns: &[CsvColumn]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["Date"];
    header.extend(columns.iter().map(CsvColumn::header));
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(row.date.format("%Y-%m-%d").to_string());
        for col in columns {
            record.push(fixed2(row, col.header(), col.value(row))?);
        }
        wtr.write_record(&record)?;
    }

    wtr.into_inner().map_err(|e| PipelineError::Io(e.into_error()))
}

/// One line per row: `<date> - Predicted: <point estimate>`.
pub fn to_report_text(rows: &[ForecastRow]) -> Result<Vec<String>> {
    rows.iter()
        .map(|row| {
            let point = fixed2(row, "Forecast", row.point_estimate)?;
            Ok(format!("{} - Predicted: {point}", row.date.format("%Y-%m-%d")))
        })
        .collect()
}

/// Markdown summary of a forecast and its alerts.
pub fn to_markdown_report(table: &ForecastTable, alerts: &[Alert]) -> Result<String> {
    let future = table.future_rows();
    let mut md = String::with_capacity(1024);

    md.push_str("# Demand Forecast Report\n\n");

    md.push_str("## Summary\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Backend | {} |\n", table.backend));
    md.push_str(&format!("| Measure | {} |\n", table.measure));
    md.push_str(&format!("| History (dates) | {} |\n", table.history_len));
    md.push_str(&format!("| Horizon (days) | {} |\n", table.horizon));
    if let (Some(first), Some(last)) = (future.first(), future.last()) {
        md.push_str(&format!("| Forecast Period | {} to {} |\n", first.date, last.date));
    }
    if !table.bounds_supplied {
        md.push_str("| Bounds | **not provided by backend** |\n");
    }
    md.push('\n');

    md.push_str("## Forecast\n\n");
    if table.bounds_supplied {
        md.push_str("| Date | Forecast | Lower Bound | Upper Bound |\n");
        md.push_str("| --- | ---: | ---: | ---: |\n");
        for row in future {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                row.date,
                fixed2(row, "Forecast", row.point_estimate)?,
                fixed2(row, "Lower Bound", row.lower_bound)?,
                fixed2(row, "Upper Bound", row.upper_bound)?,
            ));
        }
    } else {
        md.push_str("| Date | Forecast |\n");
        md.push_str("| --- | ---: |\n");
        for row in future {
            md.push_str(&format!(
                "| {} | {} |\n",
                row.date,
                fixed2(row, "Forecast", row.point_estimate)?
            ));
        }
    }
    md.push('\n');

    md.push_str("## Alerts\n\n");
    if alerts.is_empty() {
        md.push_str("No forecast values exceed the threshold.\n");
    } else {
        for alert in alerts {
            md.push_str(&format!(
                "- {}: {} {:.2} > {:.2}\n",
                alert.date,
                alert.field.label(),
                alert.value,
                alert.threshold
            ));
        }
    }

    Ok(md)
}
