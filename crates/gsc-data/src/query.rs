//! Ad-hoc per-query lookup.

use gsc_core::models::QueryStats;
use gsc_core::Result;
use gsc_store::Store;
use tracing::debug;

/// Top `limit` queries containing `needle`, by impressions descending.
pub fn run_query(store: &Store, needle: &str, limit: usize) -> Result<Vec<QueryStats>> {
    let rows = store.top_queries(needle, limit)?;
    debug!("{} queries match {:?}", rows.len(), needle);
    Ok(rows)
}

/// One tuple per line, in the order given.
pub fn render_rows(rows: &[QueryStats]) -> String {
    rows.iter()
        .map(|row| row.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
