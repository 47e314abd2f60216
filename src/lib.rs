// ============================================================================
// roadstats library
// ============================================================================

pub mod analysis;
pub mod config;
pub mod core;
pub mod storage;
pub mod telemetry;
pub mod web;

// Re-export main types for convenience
pub use crate::core::{Month, NewRecord, PopulationRecord, Record, RecordPatch, Result, StoreError};
pub use analysis::{FatalityAnalysis, GroupedRecord, PerCapitaReport, Trend, TrendRecord};
pub use config::AppConfig;
pub use storage::{IdPolicy, RecordStore};
pub use web::{AppState, build_router};
