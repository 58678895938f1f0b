//! Shared types for the search-console performance store.
//!
//! Holds the typed records that flow between the importer, the storage
//! layer and the reporting commands, plus the crate-wide error type and
//! the command-line settings.

pub mod error;
pub mod models;
pub mod settings;

pub use error::{GscError, Result};
