//! Import, classification and lookup workflows over the gsc store.
//!
//! Discovers and parses daily detailed-web exports, loads them into the
//! store, rolls stored metrics up into user-defined classes and looks up
//! per-query totals.

pub mod classifier;
pub mod importer;
pub mod query;
pub mod reader;

pub use gsc_core as core;
