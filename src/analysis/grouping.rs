//! Month/year grouping and period-over-period trend classification.

use crate::core::{Month, Record, Result, StoreError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Fatalities summed over every record sharing a (year, month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupedRecord {
    pub year: i32,
    pub month: Month,
    pub fatalities: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Increase,
    Decrease,
    #[serde(rename = "No Change")]
    NoChange,
}

impl Trend {
    pub fn from_change(change: i64) -> Self {
        match change {
            c if c > 0 => Trend::Increase,
            c if c < 0 => Trend::Decrease,
            _ => Trend::NoChange,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Increase => f.write_str("Increase"),
            Trend::Decrease => f.write_str("Decrease"),
            Trend::NoChange => f.write_str("No Change"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendRecord {
    pub year: i32,
    pub month: Month,
    pub fatalities: u64,
    pub change: i64,
    pub trend: Trend,
}

/// Groups by (year, month) and sorts by year, then calendar month.
///
/// `Month` orders by calendar position, so the map's key order is already the
/// required output order. A group total that does not fit in `u64` is an
/// `Overflow` error.
pub fn group_by_period(records: &[Record]) -> Result<Vec<GroupedRecord>> {
    let mut groups: BTreeMap<(i32, Month), u64> = BTreeMap::new();
    for record in records {
        let total = groups.entry((record.year, record.month)).or_insert(0);
        *total = total.checked_add(record.fatalities).ok_or_else(|| {
            StoreError::Overflow(format!(
                "fatalities for {} {} exceed {}",
                record.month,
                record.year,
                u64::MAX
            ))
        })?;
    }
    Ok(groups
        .into_iter()
        .map(|((year, month), fatalities)| GroupedRecord {
            year,
            month,
            fatalities,
        })
        .collect())
}

/// Annotates an already sorted grouping with the change from the previous
/// row. The first row has change 0.
pub fn classify_trends(grouped: &[GroupedRecord]) -> Result<Vec<TrendRecord>> {
    let mut previous: Option<u64> = None;
    let mut trends = Vec::with_capacity(grouped.len());
    for group in grouped {
        let change = match previous {
            Some(prev) => i64::try_from(i128::from(group.fatalities) - i128::from(prev))
                .map_err(|_| {
                    StoreError::Overflow(format!(
                        "change from {} to {} in {} {} does not fit in i64",
                        prev, group.fatalities, group.month, group.year
                    ))
                })?,
            None => 0,
        };
        previous = Some(group.fatalities);
        trends.push(TrendRecord {
            year: group.year,
            month: group.month,
            fatalities: group.fatalities,
            change,
            trend: Trend::from_change(change),
        });
    }
    Ok(trends)
}

pub fn trend_report(records: &[Record]) -> Result<Vec<TrendRecord>> {
    classify_trends(&group_by_period(records)?)
}
