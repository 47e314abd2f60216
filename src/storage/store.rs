//! The record store: an in-memory table owned together with its backing file.

use super::persistence::IdSequence;
use super::table::{load_records, save_records};
use crate::core::types::{check_fatalities, check_year};
use crate::core::{NewRecord, Record, RecordPatch, Result, StoreError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;
use tracing::{debug, info, warn};

// ============================================================================
// Id policy
// ============================================================================

/// How `create` picks the id of a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// `max(existing ids) + 1`, or 1 for an empty table. Deleting the highest
    /// record makes its id available again.
    #[default]
    ReuseMax,
    /// Strictly increasing ids backed by a `<table>.seq` sidecar file.
    /// An id is never handed out twice, even across restarts.
    Monotonic,
}

impl FromStr for IdPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "reuse-max" | "reuse_max" | "max" => Ok(Self::ReuseMax),
            "monotonic" | "sequence" => Ok(Self::Monotonic),
            _ => Err(StoreError::validation(
                "id policy must be one of: reuse-max, monotonic",
            )),
        }
    }
}

impl fmt::Display for IdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReuseMax => f.write_str("reuse-max"),
            Self::Monotonic => f.write_str("monotonic"),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

struct StoreState {
    records: Vec<Record>,
    sequence: Option<IdSequence>,
}

impl StoreState {
    fn max_id(&self) -> u64 {
        self.records.iter().map(|r| r.id).max().unwrap_or(0)
    }

    fn next_id(&self) -> Result<u64> {
        let max_id = self.max_id();
        let after_max = max_id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted(max_id))?;
        Ok(match &self.sequence {
            Some(sequence) => sequence.peek().max(after_max),
            None => after_max,
        })
    }

    fn position(&self, id: u64) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

/// File-backed table of fatality records.
///
/// Every mutation holds the write lock for the whole read-modify-persist
/// cycle, and the backing file is replaced atomically before the call
/// returns. If persisting fails the in-memory change is rolled back.
pub struct RecordStore {
    path: PathBuf,
    policy: IdPolicy,
    state: RwLock<StoreState>,
}

impl RecordStore {
    /// Loads the table at `path`, or starts empty if the file does not exist.
    /// A file that exists but cannot be parsed is an error.
    pub fn open<P: AsRef<Path>>(path: P, policy: IdPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = match load_records(&path) {
            Ok(records) => records,
            Err(StoreError::FileNotFound(_)) => {
                warn!(path = %path.display(), "backing file not found; starting with an empty store");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let mut state = StoreState {
            records,
            sequence: None,
        };
        if policy == IdPolicy::Monotonic {
            state.sequence = Some(IdSequence::open(&path, state.max_id().saturating_add(1))?);
        }

        info!(
            path = %path.display(),
            records = state.records.len(),
            id_policy = %policy,
            "record store opened"
        );

        Ok(Self {
            path,
            policy,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id_policy(&self) -> IdPolicy {
        self.policy
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.state.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All records in table order.
    pub fn list(&self) -> Result<Vec<Record>> {
        Ok(self.state.read()?.records.clone())
    }

    /// Point-in-time copy of the table for aggregation.
    pub fn snapshot(&self) -> Result<Vec<Record>> {
        self.list()
    }

    pub fn get(&self, id: u64) -> Result<Record> {
        let state = self.state.read()?;
        let idx = state.position(id)?;
        Ok(state.records[idx].clone())
    }

    pub fn create(&self, candidate: NewRecord) -> Result<Record> {
        check_year(candidate.year)?;
        check_fatalities(candidate.fatalities)?;

        let mut state = self.state.write()?;
        let id = state.next_id()?;
        if let Some(sequence) = state.sequence.as_mut() {
            sequence.commit(id)?;
        }

        let record = candidate.with_id(id);
        state.records.push(record.clone());
        if let Err(err) = save_records(&state.records, &self.path) {
            state.records.pop();
            return Err(err);
        }

        debug!(id, year = record.year, month = %record.month, "record created");
        Ok(record)
    }

    pub fn update(&self, id: u64, patch: RecordPatch) -> Result<Record> {
        if let Some(year) = patch.year {
            check_year(year)?;
        }
        if let Some(fatalities) = patch.fatalities {
            check_fatalities(fatalities)?;
        }

        let mut state = self.state.write()?;
        let idx = state.position(id)?;
        let previous = state.records[idx].clone();
        patch.apply(&mut state.records[idx]);
        if let Err(err) = save_records(&state.records, &self.path) {
            state.records[idx] = previous;
            return Err(err);
        }

        debug!(id, "record updated");
        Ok(state.records[idx].clone())
    }

    pub fn delete(&self, id: u64) -> Result<()> {
        let mut state = self.state.write()?;
        let idx = state.position(id)?;
        let removed = state.records.remove(idx);
        if let Err(err) = save_records(&state.records, &self.path) {
            state.records.insert(idx, removed);
            return Err(err);
        }

        debug!(id, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Month;
    use tempfile::TempDir;

    fn candidate(year: i32, month: Month, fatalities: u64) -> NewRecord {
        NewRecord::new(year, month, fatalities).unwrap()
    }

    #[test]
    fn open_missing_file_starts_empty_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        let store = RecordStore::open(&path, IdPolicy::ReuseMax).unwrap();
        assert!(store.is_empty().unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn first_id_is_one() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("r.csv"), IdPolicy::ReuseMax).unwrap();
        let record = store.create(candidate(2020, Month::January, 3)).unwrap();
        assert_eq!(record.id, 1);
    }

    #[test]
    fn update_rejects_out_of_range_year() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("r.csv"), IdPolicy::ReuseMax).unwrap();
        let record = store.create(candidate(2020, Month::January, 3)).unwrap();
        let err = store
            .update(record.id, RecordPatch::default().year(20))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.get(record.id).unwrap().year, 2020);
    }

    #[test]
    fn failed_persist_rolls_back() {
        let dir = TempDir::new().unwrap();
        // A directory where the table file should be makes every rename fail.
        let path = dir.path().join("blocked");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let store = RecordStore {
            path: path.clone(),
            policy: IdPolicy::ReuseMax,
            state: RwLock::new(StoreState {
                records: Vec::new(),
                sequence: None,
            }),
        };
        let err = store.create(candidate(2020, Month::May, 1)).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn id_policy_parses() {
        assert_eq!("reuse-max".parse::<IdPolicy>().unwrap(), IdPolicy::ReuseMax);
        assert_eq!("Monotonic".parse::<IdPolicy>().unwrap(), IdPolicy::Monotonic);
        assert!("random".parse::<IdPolicy>().is_err());
        assert_eq!(IdPolicy::default(), IdPolicy::ReuseMax);
    }
}
