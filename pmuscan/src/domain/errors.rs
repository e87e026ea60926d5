//! Structured error types for pmuscan
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Probe failures never show up here: they are folded into
//! [`crate::probe::Support::Unsupported`] where they happen.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("unknown event type category: {0}, try using \"pmuscan --help\"")]
    UnknownCategory(String),

    #[error("can't get device cpu info")]
    CpuModelsUnavailable,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read event table {path}: {source}")]
    TableRead { path: PathBuf, source: std::io::Error },

    #[error("Invalid event table {path}: {source}")]
    TableParse { path: PathBuf, source: serde_json::Error },

    #[error("Invalid event number {0:?} in event table")]
    InvalidEventNumber(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
