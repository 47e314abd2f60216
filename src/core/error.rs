use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record {0} not found")]
    NotFound(u64),

    #[error("File '{}' not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed input in '{}': {message}", path.display())]
    MalformedInput { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Aggregate overflow: {0}")]
    Overflow(String),

    #[error("Record ids exhausted: no id after {0}")]
    IdsExhausted(u64),

    #[error("Invalid population {population} for year {year}")]
    InvalidPopulation { year: i32, population: f64 },

    #[error("Lock error: {0}")]
    LockError(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn malformed(path: &Path, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn io(context: &str, path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io(format!("{} '{}': {}", context, path.display(), err))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
