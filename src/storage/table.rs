//! Tabular file adapter: CSV backing files for records, the population
//! input, and the derived reports.

use super::persistence::{atomic_write, read_file};
use crate::core::types::{check_fatalities, parse_year};
use crate::core::{Month, PopulationRecord, Record, Result, StoreError};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub const RECORD_HEADER: [&str; 4] = ["id", "year", "month", "fatalities"];
pub const POPULATION_HEADER: [&str; 2] = ["year", "population_in_thousands"];

/// Records read from a backing file, before any self-healing write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTable {
    pub records: Vec<Record>,
    /// True when the file had no `id` column and ids were assigned 1..=n.
    pub ids_assigned: bool,
}

// ============================================================================
// Header resolution
// ============================================================================

struct ColumnMap {
    names: Vec<String>,
}

impl ColumnMap {
    fn new(headers: &csv::StringRecord) -> Self {
        Self {
            names: headers
                .iter()
                .map(|name| name.trim().to_ascii_lowercase())
                .collect(),
        }
    }

    fn find(&self, aliases: &[&str]) -> Option<usize> {
        self.names
            .iter()
            .position(|name| aliases.contains(&name.as_str()))
    }

    fn require(&self, path: &Path, aliases: &[&str]) -> Result<usize> {
        self.find(aliases).ok_or_else(|| {
            StoreError::malformed(
                path,
                format!(
                    "missing column '{}' (header was: {})",
                    aliases[0],
                    self.names.join(",")
                ),
            )
        })
    }

    /// Every column must be known, and each known column may appear once
    /// under any of its aliases.
    fn check_columns(&self, path: &Path, known: &[&[&str]]) -> Result<()> {
        let extra: Vec<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .filter(|name| !known.iter().any(|aliases| aliases.contains(name)))
            .collect();
        if !extra.is_empty() {
            return Err(StoreError::malformed(
                path,
                format!("unexpected columns: {}", extra.join(",")),
            ));
        }

        for aliases in known {
            let count = self
                .names
                .iter()
                .filter(|name| aliases.contains(&name.as_str()))
                .count();
            if count > 1 {
                return Err(StoreError::malformed(
                    path,
                    format!("duplicate column '{}'", aliases[0]),
                ));
            }
        }
        Ok(())
    }
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes)
}

fn line_of(row: &csv::StringRecord) -> u64 {
    row.position().map(|pos| pos.line()).unwrap_or(0)
}

fn field<'r>(row: &'r csv::StringRecord, idx: usize) -> &'r str {
    row.get(idx).unwrap_or("")
}

// ============================================================================
// Records
// ============================================================================

const ID: &[&str] = &["id"];
const YEAR: &[&str] = &["year"];
const MONTH: &[&str] = &["month"];
const FATALITIES: &[&str] = &["fatalities"];

/// Parses a record table without touching the file.
pub fn read_records(path: &Path) -> Result<RecordTable> {
    let bytes = read_file(path)?;
    let mut rdr = reader(&bytes);
    let headers = rdr
        .headers()
        .map_err(|e| StoreError::malformed(path, e.to_string()))?
        .clone();
    let columns = ColumnMap::new(&headers);
    columns.check_columns(path, &[ID, YEAR, MONTH, FATALITIES])?;
    let id_col = columns.find(ID);
    let year_col = columns.require(path, YEAR)?;
    let month_col = columns.require(path, MONTH)?;
    let fatalities_col = columns.require(path, FATALITIES)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for result in rdr.records() {
        let row = result.map_err(|e| StoreError::malformed(path, e.to_string()))?;
        let line = line_of(&row);
        let bad = |message: String| StoreError::malformed(path, format!("line {}: {}", line, message));

        let id = match id_col {
            Some(idx) => {
                let raw = field(&row, idx);
                let id = raw
                    .parse::<u64>()
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or_else(|| bad(format!("id must be a positive integer, got '{}'", raw)))?;
                if !seen.insert(id) {
                    return Err(bad(format!("duplicate id {}", id)));
                }
                id
            }
            None => records.len() as u64 + 1,
        };
        let year = parse_year(field(&row, year_col)).map_err(|e| bad(e.to_string()))?;
        let month = field(&row, month_col)
            .parse::<Month>()
            .map_err(|e| bad(e.to_string()))?;
        let raw = field(&row, fatalities_col);
        let fatalities = raw.parse::<u64>().map_err(|_| {
            bad(format!("fatalities must be a non-negative integer, got '{}'", raw))
        })?;
        let fatalities = check_fatalities(fatalities).map_err(|e| bad(e.to_string()))?;

        records.push(Record {
            id,
            year,
            month,
            fatalities,
        });
    }

    Ok(RecordTable {
        records,
        ids_assigned: id_col.is_none(),
    })
}

/// Loads a record table, persisting assigned ids when the file predates the
/// `id` column.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let table = read_records(path)?;
    if table.ids_assigned {
        info!(
            path = %path.display(),
            rows = table.records.len(),
            "backing file has no id column; assigned sequential ids"
        );
        save_records(&table.records, path)?;
    }
    Ok(table.records)
}

/// Rewrites the whole record table.
pub fn save_records(records: &[Record], path: &Path) -> Result<()> {
    write_csv(path, &RECORD_HEADER, records)
}

// ============================================================================
// Population
// ============================================================================

const POPULATION: &[&str] = &["population_in_thousands", "population (thousand)"];

pub fn load_population(path: &Path) -> Result<Vec<PopulationRecord>> {
    let bytes = read_file(path)?;
    let mut rdr = reader(&bytes);
    let headers = rdr
        .headers()
        .map_err(|e| StoreError::malformed(path, e.to_string()))?
        .clone();
    let columns = ColumnMap::new(&headers);
    columns.check_columns(path, &[YEAR, POPULATION])?;
    let year_col = columns.require(path, YEAR)?;
    let population_col = columns.require(path, POPULATION)?;

    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    for result in rdr.records() {
        let row = result.map_err(|e| StoreError::malformed(path, e.to_string()))?;
        let line = line_of(&row);
        let bad = |message: String| StoreError::malformed(path, format!("line {}: {}", line, message));

        let year = parse_year(field(&row, year_col)).map_err(|e| bad(e.to_string()))?;
        if !seen.insert(year) {
            return Err(bad(format!("duplicate year {}", year)));
        }
        let raw = field(&row, population_col);
        let population_in_thousands = raw
            .parse::<f64>()
            .map_err(|_| bad(format!("population must be a number, got '{}'", raw)))?;

        rows.push(PopulationRecord {
            year,
            population_in_thousands,
        });
    }
    Ok(rows)
}

// ============================================================================
// Writing
// ============================================================================

/// Serializes `rows` under an explicit header and writes the file atomically.
/// The header is written even when there are no rows.
pub fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(header)
        .map_err(|e| StoreError::io("Failed to encode header for", path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| StoreError::io("Failed to encode row for", path, e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::io("Failed to finish encoding", path, e))?;
    atomic_write(path, &bytes)
}
