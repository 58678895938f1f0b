//! Rolls stored metrics up into user-defined classes.
//!
//! A class file maps lowercase terms to class labels. Every term is matched
//! as a substring against stored queries and its totals are added to each
//! of its classes. Terms are independent: a query containing two terms of
//! the same class is counted once per term.

use std::collections::BTreeMap;
use std::path::Path;

use gsc_core::models::{ClassTotals, ClassificationResult, Granularity, Metrics, PeriodTotals};
use gsc_core::{GscError, Result};
use gsc_store::Store;
use serde::Serialize;
use tracing::{debug, info};

/// Lowercased term to every class label listed for it, in file order.
pub type TermClassMap = BTreeMap<String, Vec<String>>;

// ── Class file ────────────────────────────────────────────────────────────────

/// Read a `term,class` CSV. The first line is skipped as a header.
///
/// Terms are lowercased; a term listed on several lines keeps every class.
pub fn load_term_class_map(path: &Path) -> Result<TermClassMap> {
    let file = std::fs::File::open(path).map_err(|source| GscError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut map = TermClassMap::new();
    for record in reader.records() {
        let record = record.map_err(|source| GscError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let (Some(term), Some(class)) = (record.get(0), record.get(1)) else {
            return Err(crate::reader::malformed(
                path,
                &record,
                format!("expected term and class, found {} fields", record.len()),
            ));
        };
        map.entry(term.to_lowercase())
            .or_default()
            .push(class.to_string());
    }

    debug!("Loaded {} terms from {}", map.len(), path.display());
    Ok(map)
}

// ── Classifier ────────────────────────────────────────────────────────────────

/// Runs one aggregate query per term and merges the results per class.
pub struct Classifier<'a> {
    store: &'a Store,
}

impl<'a> Classifier<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Classify every term in `terms` at the given granularity.
    pub fn classify(
        &self,
        terms: &TermClassMap,
        granularity: Granularity,
    ) -> Result<ClassificationResult> {
        info!("This may take a while, get some fresh coffee ...");

        let mut classes = ClassificationResult::new();
        for (term, labels) in terms {
            debug!("{} {:?}", term, labels);
            for totals in self.store.aggregate(term, granularity)? {
                for label in labels {
                    merge_totals(&mut classes, label, &totals);
                }
            }
        }
        Ok(classes)
    }
}

/// Add one aggregate row to `label`'s running totals.
///
/// A single classify run never mixes shapes: either every row has a period
/// or none has.
pub fn merge_totals(classes: &mut ClassificationResult, label: &str, totals: &PeriodTotals) {
    let slot = classes.entry(label.to_string());
    match &totals.period {
        None => {
            if let ClassTotals::Total(m) =
                slot.or_insert_with(|| ClassTotals::Total(Metrics::default()))
            {
                m.add(totals.metrics);
            }
        }
        Some(period) => {
            if let ClassTotals::ByPeriod(periods) =
                slot.or_insert_with(|| ClassTotals::ByPeriod(BTreeMap::new()))
            {
                periods
                    .entry(period.clone())
                    .or_default()
                    .add(totals.metrics);
            }
        }
    }
}

/// Pretty JSON with sorted keys and four-space indentation.
pub fn render_json(classes: &ClassificationResult) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    classes.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| GscError::Other(e.into()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
