//! Yearly fatality totals joined with population figures.

use crate::core::{PopulationRecord, Record, Result, StoreError};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FatalityAnalysis {
    pub year: i32,
    pub fatalities: u64,
    pub population_in_thousands: f64,
    pub fatalities_per_capita: f64,
    pub fatalities_per_100k: f64,
}

/// Years the inner join left out, per side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinDiagnostics {
    pub fatality_years_without_population: Vec<i32>,
    pub population_years_without_fatalities: Vec<i32>,
}

impl JoinDiagnostics {
    pub fn dropped_count(&self) -> usize {
        self.fatality_years_without_population.len() + self.population_years_without_fatalities.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerCapitaReport {
    pub rows: Vec<FatalityAnalysis>,
    pub diagnostics: JoinDiagnostics,
}

/// Fatalities per year, month discarded.
pub fn yearly_totals(records: &[Record]) -> Result<BTreeMap<i32, u64>> {
    let mut totals: BTreeMap<i32, u64> = BTreeMap::new();
    for record in records {
        let total = totals.entry(record.year).or_insert(0);
        *total = total.checked_add(record.fatalities).ok_or_else(|| {
            StoreError::Overflow(format!(
                "fatalities for {} exceed {}",
                record.year,
                u64::MAX
            ))
        })?;
    }
    Ok(totals)
}

/// Inner join of yearly totals and population on year, ascending by year.
///
/// Unmatched years on either side are left out of `rows` and listed in the
/// diagnostics. A non-positive population on a joined year is an error.
pub fn per_capita(records: &[Record], population: &[PopulationRecord]) -> Result<PerCapitaReport> {
    let totals = yearly_totals(records)?;
    let population: BTreeMap<i32, f64> = population
        .iter()
        .map(|p| (p.year, p.population_in_thousands))
        .collect();

    let mut rows = Vec::new();
    let mut diagnostics = JoinDiagnostics::default();

    for (&year, &fatalities) in &totals {
        let Some(&thousands) = population.get(&year) else {
            diagnostics.fatality_years_without_population.push(year);
            continue;
        };
        if !thousands.is_finite() || thousands <= 0.0 {
            return Err(StoreError::InvalidPopulation {
                year,
                population: thousands,
            });
        }

        let fatalities_per_capita = fatalities as f64 / (thousands * 1000.0);
        rows.push(FatalityAnalysis {
            year,
            fatalities,
            population_in_thousands: thousands,
            fatalities_per_capita,
            fatalities_per_100k: fatalities_per_capita * 100_000.0,
        });
    }

    diagnostics.population_years_without_fatalities = population
        .keys()
        .copied()
        .filter(|year| !totals.contains_key(year))
        .collect();

    if diagnostics.dropped_count() > 0 {
        warn!(
            dropped = diagnostics.dropped_count(),
            fatality_years = ?diagnostics.fatality_years_without_population,
            population_years = ?diagnostics.population_years_without_fatalities,
            "years without a match were left out of the per-capita analysis"
        );
    }

    Ok(PerCapitaReport { rows, diagnostics })
}
