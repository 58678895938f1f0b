//! SQLite storage for search-console performance data.
//!
//! Two tables: a query dictionary mapping each distinct search term to a
//! surrogate key, and a results table holding one row per
//! (date, query, device, country) observation.

pub mod pattern;
pub mod store;

pub use store::{Batch, Store};
