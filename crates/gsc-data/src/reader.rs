//! CSV export discovery and row parsing.
//!
//! Daily detailed-web exports live in monthly folders and carry a header
//! followed by rows of
//! `date, query, page, device, country, clicks, impressions, ctr, position`.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gsc_core::models::{ResultRow, DATE_FORMAT};
use gsc_core::{GscError, Result};
use tracing::{debug, warn};

/// File-name suffix marking a daily detailed-web export.
pub const EXPORT_SUFFIX: &str = "_detailed_web.csv";

/// Number of positional fields in one export row.
pub const EXPORT_FIELDS: usize = 9;

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all daily exports recursively under `root`, sorted by path.
///
/// Callers must not assume the order is chronological; file names decide it.
pub fn find_export_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(GscError::DataPathNotFound(root.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| name.ends_with(EXPORT_SUFFIX))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!("Found {} export files under {}", files.len(), root.display());
    Ok(files)
}

/// Open `path` as a CSV reader whose first record is always treated as the
/// header and skipped. Records may have any width; callers check it.
pub fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| GscError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// Map one positional export record to a [`ResultRow`].
///
/// Returns the reason on failure; the caller adds file and line.
pub fn parse_row(record: &csv::StringRecord) -> std::result::Result<ResultRow, String> {
    if record.len() != EXPORT_FIELDS {
        return Err(format!(
            "expected {} fields, found {}",
            EXPORT_FIELDS,
            record.len()
        ));
    }

    let field = |i: usize| record.get(i).unwrap_or_default();

    Ok(ResultRow {
        date: NaiveDate::parse_from_str(field(0), DATE_FORMAT)
            .map_err(|e| format!("invalid date {:?}: {}", field(0), e))?,
        query: field(1).to_string(),
        page: field(2).to_string(),
        device: field(3).to_string(),
        country: field(4).to_string(),
        clicks: parse_int("clicks", field(5))?,
        impressions: parse_int("impressions", field(6))?,
        ctr: parse_ctr(field(7))?,
        position: parse_float("position", field(8))?,
    })
}

/// Wrap a row-level failure into a [`GscError::MalformedRow`].
pub fn malformed(path: &Path, record: &csv::StringRecord, reason: String) -> GscError {
    GscError::MalformedRow {
        path: path.to_path_buf(),
        line: record.position().map(|p| p.line()).unwrap_or(0),
        reason,
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_int(name: &str, raw: &str) -> std::result::Result<i64, String> {
    raw.trim()
        .parse()
        .map_err(|e| format!("invalid {} {:?}: {}", name, raw, e))
}

fn parse_float(name: &str, raw: &str) -> std::result::Result<f64, String> {
    raw.trim()
        .parse()
        .map_err(|e| format!("invalid {} {:?}: {}", name, raw, e))
}

/// CTR is a fraction; percentage strings such as `"12.5%"` are converted.
fn parse_ctr(raw: &str) -> std::result::Result<f64, String> {
    match raw.trim().strip_suffix('%') {
        Some(percent) => parse_float("ctr", percent).map(|v| v / 100.0),
        None => parse_float("ctr", raw),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
