//! Report files built from the record table: trend and per-capita analysis.
//!
//! Inputs are read without any self-healing write, and an output file is only
//! written once the whole report has been computed.

use super::grouping::{TrendRecord, trend_report};
use super::per_capita::{FatalityAnalysis, PerCapitaReport, per_capita};
use crate::core::Result;
use crate::storage::table::{load_population, read_records, write_csv};
use std::path::Path;
use tracing::info;

pub const TREND_HEADER: [&str; 5] = ["year", "month", "fatalities", "change", "trend"];
pub const ANALYSIS_HEADER: [&str; 5] = [
    "year",
    "fatalities",
    "population_in_thousands",
    "fatalities_per_capita",
    "fatalities_per_100k",
];

pub fn write_trend_report(rows: &[TrendRecord], path: &Path) -> Result<()> {
    write_csv(path, &TREND_HEADER, rows)
}

pub fn write_analysis_report(rows: &[FatalityAnalysis], path: &Path) -> Result<()> {
    write_csv(path, &ANALYSIS_HEADER, rows)
}

/// Reads `input`, computes the trend sequence, writes it to `output`.
pub fn build_trend_report(input: &Path, output: &Path) -> Result<Vec<TrendRecord>> {
    let table = read_records(input)?;
    let rows = trend_report(&table.records)?;
    write_trend_report(&rows, output)?;
    info!(rows = rows.len(), output = %output.display(), "trend report written");
    Ok(rows)
}

/// Reads the record and population tables, joins them, writes the analysis.
pub fn build_analysis_report(
    input: &Path,
    population: &Path,
    output: &Path,
) -> Result<PerCapitaReport> {
    let table = read_records(input)?;
    let population = load_population(population)?;
    let report = per_capita(&table.records, &population)?;
    write_analysis_report(&report.rows, output)?;
    info!(rows = report.rows.len(), output = %output.display(), "analysis report written");
    Ok(report)
}
