//! Dataset loading: CSV parsing, column validation, date parsing.
//!
//! Required columns are `Date`, `Region`, `Product_Category` and
//! `Units_Sold`; `Revenue` is optional. Extra columns are ignored. Header
//! names match exactly after trimming surrounding whitespace.

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::{Dataset, SalesRecord};
use crate::error::{PipelineError, Result};

pub const DATE_COLUMN: &str = "Date";
pub const REGION_COLUMN: &str = "Region";
pub const CATEGORY_COLUMN: &str = "Product_Category";
pub const UNITS_COLUMN: &str = "Units_Sold";
pub const REVENUE_COLUMN: &str = "Revenue";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Column positions resolved from the header row.
struct ColumnIndex {
    date: usize,
    region: usize,
    category: usize,
    units: usize,
    revenue: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| PipelineError::Schema {
                column: name.to_string(),
                found: headers.iter().map(str::trim).collect::<Vec<_>>().join(", "),
            })
        };

        Ok(Self {
            date: require(DATE_COLUMN)?,
            region: require(REGION_COLUMN)?,
            category: require(CATEGORY_COLUMN)?,
            units: require(UNITS_COLUMN)?,
            revenue: find(REVENUE_COLUMN),
        })
    }
}

/// Load a dataset from a file path.
pub fn load_path(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read dataset file");
    load_bytes(&bytes)
}

/// Load a dataset from any reader (e.g. an upload stream).
pub fn load_reader<R: Read>(mut reader: R) -> Result<Dataset> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    load_bytes(&bytes)
}

/// Load a dataset from in-memory CSV bytes.
///
/// Records are returned sorted ascending by date. The sort is stable, so
/// rows sharing a date keep their file order.
pub fn load_bytes(bytes: &[u8]) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let columns = ColumnIndex::resolve(rdr.headers()?)?;

    let mut records = Vec::new();
    let mut first_bad_date: Option<(usize, String)> = None;
    let mut bad_dates = 0usize;

    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let row_no = i + 1;
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();

        let raw_date = field(columns.date);
        let Some(date) = parse_date(raw_date) else {
            bad_dates += 1;
            if first_bad_date.is_none() {
                first_bad_date = Some((row_no, raw_date.to_string()));
            }
            continue;
        };

        // A date failure earlier in the file takes precedence over value errors.
        let numbers = parse_amount(field(columns.units), UNITS_COLUMN, row_no).and_then(|units| {
            let revenue = match columns.revenue {
                Some(idx) => parse_amount(field(idx), REVENUE_COLUMN, row_no)?,
                None => 0.0,
            };
            Ok((units, revenue))
        });
        let (units_sold, revenue) = match numbers {
            Ok(n) => n,
            Err(e) if first_bad_date.is_none() => return Err(e),
            Err(_) => continue,
        };

        records.push(SalesRecord {
            date,
            region: field(columns.region).to_string(),
            product_category: field(columns.category).to_string(),
            units_sold,
            revenue,
        });
    }

    if let Some((row, value)) = first_bad_date {
        return Err(PipelineError::DateParse {
            row,
            value,
            bad_rows: bad_dates,
        });
    }

    records.sort_by_key(|r| r.date);

    let dataset = Dataset {
        records,
        has_revenue: columns.revenue.is_some(),
        fingerprint: blake3::hash(bytes).to_hex().to_string(),
    };

    if let Some((first, last)) = dataset.date_range() {
        debug!(
            records = dataset.len(),
            %first,
            %last,
            has_revenue = dataset.has_revenue,
            "loaded sales dataset"
        );
    }

    Ok(dataset)
}

/// Parse a calendar date in one of the accepted formats.
///
/// Datetimes are accepted and truncated to their date part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_amount(raw: &str, column: &str, row: usize) -> Result<f64> {
    let invalid = |reason: &str| PipelineError::InvalidValue {
        row,
        column: column.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    if raw.is_empty() {
        return Err(invalid("empty cell"));
    }
    let value: f64 = raw.parse().map_err(|_| invalid("not a number"))?;
    if !value.is_finite() {
        return Err(invalid("not finite"));
    }
    if value < 0.0 {
        return Err(invalid("negative"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn loads_and_sorts_by_date() {
        let csv = "Date,Region,Product_Category,Units_Sold,Revenue\n\
                   2024-01-03,West,Toys,5,50.0\n\
                   2024-01-01,East,Books,3,30.5\n\
                   2024-01-02,West,Books,4,40\n";
        let ds = load_bytes(csv.as_bytes()).unwrap();

        assert_eq!(ds.len(), 3);
        assert!(ds.has_revenue);
        assert_eq!(ds.records[0].date, d(2024, 1, 1));
        assert_eq!(ds.records[0].region, "East");
        assert_eq!(ds.records[0].revenue, 30.5);
        assert_eq!(ds.records[2].date, d(2024, 1, 3));
        assert!(!ds.fingerprint.is_empty());
    }

    #[test]
    fn sort_is_stable_within_a_date() {
        let csv = "Date,Region,Product_Category,Units_Sold\n\
                   2024-01-02,B,X,1\n\
                   2024-01-01,A,X,1\n\
                   2024-01-02,C,X,1\n";
        let ds = load_bytes(csv.as_bytes()).unwrap();
        let regions: Vec<_> = ds.records.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions, vec!["A", "B", "C"]);
    }

    #[test]
    fn revenue_column_is_optional() {
        let csv = "Date,Region,Product_Category,Units_Sold\n2024-01-01,West,Toys,2\n";
        let ds = load_bytes(csv.as_bytes()).unwrap();
        assert!(!ds.has_revenue);
        assert_eq!(ds.records[0].revenue, 0.0);
    }

    #[test]
    fn extra_columns_and_padded_headers_are_accepted() {
        let csv = " Date , Region ,Product_Category,Units_Sold,Store_Id\n\
                   2024-01-01,West,Toys,2,17\n";
        let ds = load_bytes(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn missing_required_column_is_schema_error() {
        let csv = "Date,Region,Units_Sold\n2024-01-01,West,2\n";
        let err = load_bytes(csv.as_bytes()).unwrap_err();
        match err {
            PipelineError::Schema { column, .. } => assert_eq!(column, CATEGORY_COLUMN),
            other => panic!("expected Schema, got {other:?}"),
        }
    }

    #[test]
    fn header_match_is_case_sensitive() {
        let csv = "date,Region,Product_Category,Units_Sold\n2024-01-01,West,Toys,2\n";
        assert!(matches!(
            load_bytes(csv.as_bytes()),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn bad_dates_are_counted() {
        let csv = "Date,Region,Product_Category,Units_Sold\n\
                   2024-01-01,West,Toys,2\n\
                   yesterday,West,Toys,2\n\
                   2024-13-45,West,Toys,2\n";
        let err = load_bytes(csv.as_bytes()).unwrap_err();
        match err {
            PipelineError::DateParse {
                row,
                value,
                bad_rows,
            } => {
                assert_eq!(row, 2);
                assert_eq!(value, "yesterday");
                assert_eq!(bad_rows, 2);
            }
            other => panic!("expected DateParse, got {other:?}"),
        }
    }

    #[test]
    fn negative_units_are_rejected() {
        let csv = "Date,Region,Product_Category,Units_Sold\n2024-01-01,West,Toys,-3\n";
        let err = load_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidValue { row: 1, .. }));
    }

    #[test]
    fn empty_units_cell_is_not_coerced_to_zero() {
        let csv = "Date,Region,Product_Category,Units_Sold\n2024-01-01,West,Toys,\n";
        let err = load_bytes(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("empty cell"));
    }

    #[test]
    fn date_error_wins_over_later_value_error() {
        let csv = "Date,Region,Product_Category,Units_Sold\n\
                   bad,West,Toys,1\n\
                   2024-01-02,West,Toys,abc\n";
        assert!(matches!(
            load_bytes(csv.as_bytes()),
            Err(PipelineError::DateParse { .. })
        ));
    }

    #[test]
    fn parse_date_accepts_common_formats() {
        assert_eq!(parse_date("2024-02-29"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("2024/02/29"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("02/29/2024"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29 13:45:00"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29T00:00:00"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn same_bytes_give_same_fingerprint() {
        let csv = "Date,Region,Product_Category,Units_Sold\n2024-01-01,West,Toys,2\n";
        let a = load_bytes(csv.as_bytes()).unwrap();
        let b = load_reader(csv.as_bytes()).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }
}
