//! Record filtering by region, category and trailing date window.

use std::collections::BTreeSet;
use std::num::NonZeroU32;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::SalesRecord;

/// Per-request filter settings.
///
/// For each categorical dimension, `None` means "no restriction" while
/// `Some(empty set)` means "nothing selected" and matches no record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub regions: Option<BTreeSet<String>>,
    #[serde(default)]
    pub categories: Option<BTreeSet<String>>,
    #[serde(default)]
    pub window_days: Option<NonZeroU32>,
}

impl FilterCriteria {
    /// Criteria that keep every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_window_days(mut self, days: NonZeroU32) -> Self {
        self.window_days = Some(days);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.regions.is_none() && self.categories.is_none() && self.window_days.is_none()
    }

    fn matches(&self, record: &SalesRecord) -> bool {
        let region_ok = self
            .regions
            .as_ref()
            .map_or(true, |set| set.contains(&record.region));
        let category_ok = self
            .categories
            .as_ref()
            .map_or(true, |set| set.contains(&record.product_category));
        region_ok && category_ok
    }
}

/// Apply `criteria` to `records`, returning the matching records in input order.
///
/// Categorical filters run first; the trailing window is then anchored on
/// the latest date among the surviving records and is inclusive:
/// `date >= max_date - window_days`. No match yields an empty vector.
pub fn apply(records: &[SalesRecord], criteria: &FilterCriteria) -> Vec<SalesRecord> {
    let mut kept: Vec<SalesRecord> = records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();

    if let Some(days) = criteria.window_days {
        if let Some(max_date) = kept.iter().map(|r| r.date).max() {
            // A window reaching past the calendar start keeps everything.
            if let Some(cutoff) =
                max_date.checked_sub_signed(Duration::days(i64::from(days.get())))
            {
                kept.retain(|r| r.date >= cutoff);
            }
        }
    }

    debug!(
        input = records.len(),
        kept = kept.len(),
        window_days = criteria.window_days.map(NonZeroU32::get),
        "filtered records"
    );
    kept
}
