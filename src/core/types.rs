use super::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_YEAR: i32 = 1000;
pub const MAX_YEAR: i32 = 9999;
/// Largest per-record fatality count; keeps differences representable as `i64`.
pub const MAX_FATALITIES: u64 = i64::MAX as u64;

/// Canonical English month. Declaration order is calendar order, so the
/// derived `Ord` sorts January before February rather than alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Zero-based calendar position (January = 0).
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Month::ALL
            .iter()
            .copied()
            .find(|month| month.name() == s)
            .ok_or_else(|| {
                StoreError::validation(format!(
                    "month must be a full English month name (January..December), got '{}'",
                    s
                ))
            })
    }
}

/// Checks the four-digit calendar year range.
pub fn check_year(year: i32) -> Result<i32> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(StoreError::validation(format!(
            "year must be a four-digit calendar year, got {}",
            year
        )))
    }
}

pub fn check_fatalities(fatalities: u64) -> Result<u64> {
    if fatalities <= MAX_FATALITIES {
        Ok(fatalities)
    } else {
        Err(StoreError::validation(format!(
            "fatalities must be at most {}, got {}",
            MAX_FATALITIES, fatalities
        )))
    }
}

/// Parses a year from its textual form (`"2020"`). Exactly four digits.
pub fn parse_year(raw: &str) -> Result<i32> {
    let trimmed = raw.trim();
    if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StoreError::validation(format!(
            "year must be a four-digit calendar year, got '{}'",
            raw
        )));
    }
    let year = trimmed
        .parse::<i32>()
        .map_err(|e| StoreError::validation(format!("invalid year '{}': {}", raw, e)))?;
    check_year(year)
}

/// One stored fatality observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub year: i32,
    pub month: Month,
    pub fatalities: u64,
}

/// Validated create candidate. The id is always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub year: i32,
    pub month: Month,
    pub fatalities: u64,
}

impl NewRecord {
    pub fn new(year: i32, month: Month, fatalities: u64) -> Result<Self> {
        Ok(Self {
            year: check_year(year)?,
            month,
            fatalities: check_fatalities(fatalities)?,
        })
    }

    pub(crate) fn with_id(self, id: u64) -> Record {
        Record {
            id,
            year: self.year,
            month: self.month,
            fatalities: self.fatalities,
        }
    }
}

/// Validated partial update. Only these three fields are mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub year: Option<i32>,
    pub month: Option<Month>,
    pub fatalities: Option<u64>,
}

impl RecordPatch {
    pub fn has_changes(&self) -> bool {
        self.year.is_some() || self.month.is_some() || self.fatalities.is_some()
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn month(mut self, month: Month) -> Self {
        self.month = Some(month);
        self
    }

    pub fn fatalities(mut self, fatalities: u64) -> Self {
        self.fatalities = Some(fatalities);
        self
    }

    pub(crate) fn apply(&self, record: &mut Record) {
        if let Some(year) = self.year {
            record.year = year;
        }
        if let Some(month) = self.month {
            record.month = month;
        }
        if let Some(fatalities) = self.fatalities {
            record.fatalities = fatalities;
        }
    }
}

/// One row of the external population table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub year: i32,
    pub population_in_thousands: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_order_is_calendar_order() {
        let mut months = vec![Month::March, Month::January, Month::December, Month::April];
        months.sort();
        assert_eq!(
            months,
            vec![Month::January, Month::March, Month::April, Month::December]
        );
        assert_eq!(Month::January.position(), 0);
        assert_eq!(Month::December.position(), 11);
    }

    #[test]
    fn month_parse_is_exact() {
        assert_eq!("September".parse::<Month>().unwrap(), Month::September);
        assert!("Sep".parse::<Month>().is_err());
        assert!("september".parse::<Month>().is_err());
        assert!("Septembre".parse::<Month>().is_err());
    }

    #[test]
    fn month_serializes_as_name() {
        let json = serde_json::to_string(&Month::February).unwrap();
        assert_eq!(json, "\"February\"");
    }

    #[test]
    fn year_parsing() {
        assert_eq!(parse_year("2020").unwrap(), 2020);
        assert_eq!(parse_year(" 2021 ").unwrap(), 2021);
        assert!(parse_year("20").is_err());
        assert!(parse_year("-2020").is_err());
        assert!(parse_year("2020.0").is_err());
        assert!(parse_year("").is_err());
        assert!(parse_year("02020").is_err());
        assert!(parse_year("0999").is_err());
    }

    #[test]
    fn fatalities_are_capped() {
        assert_eq!(check_fatalities(MAX_FATALITIES).unwrap(), MAX_FATALITIES);
        assert!(matches!(
            NewRecord::new(2020, Month::May, u64::MAX),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn patch_applies_only_supplied_fields() {
        let mut record = Record {
            id: 3,
            year: 2020,
            month: Month::May,
            fatalities: 12,
        };
        RecordPatch::default().fatalities(20).apply(&mut record);
        assert_eq!(record.year, 2020);
        assert_eq!(record.month, Month::May);
        assert_eq!(record.fatalities, 20);
        assert_eq!(record.id, 3);
    }
}
