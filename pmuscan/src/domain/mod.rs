//! Domain model for pmuscan
//!
//! Core newtypes and errors shared by the catalog, probe and listing layers:
//! - Compile-time separation of CPU ids and thread ids
//! - Structured error handling for the failures that reach the operator

pub mod errors;
pub mod types;

pub use types::{Arch, CpuId, Tid};

pub use errors::{CatalogError, ListError};
