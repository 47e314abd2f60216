pub mod error;
pub mod input;
pub mod types;

pub use error::{Result, StoreError};
pub use input::{parse_new_record, parse_record_patch};
pub use types::{Month, NewRecord, PopulationRecord, Record, RecordPatch};
