//! Aggregation engine. Everything here is a pure function of a record
//! snapshot (plus the population table for per-capita rates).

pub mod grouping;
pub mod per_capita;
pub mod report;

pub use grouping::{GroupedRecord, Trend, TrendRecord, classify_trends, group_by_period, trend_report};
pub use per_capita::{FatalityAnalysis, JoinDiagnostics, PerCapitaReport, per_capita, yearly_totals};
pub use report::{build_analysis_report, build_trend_report, write_analysis_report, write_trend_report};
