//! Loads daily exports into the store.

use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use gsc_core::{GscError, Result};
use gsc_store::Store;
use tracing::{info, warn};

use crate::reader::{malformed, open_csv, parse_row};

/// Counts produced by an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    /// Data rows read (headers excluded).
    pub rows: usize,
    pub inserted: usize,
    /// Rows whose (date, query, device, country) was already stored.
    pub duplicates: usize,
}

impl AddAssign for ImportSummary {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.rows += other.rows;
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
    }
}

/// Streams export files into a [`Store`].
pub struct Importer<'a> {
    store: &'a Store,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Import `paths` in order. The first malformed row aborts the run;
    /// files committed before it stay imported.
    pub fn import_all(&self, paths: &[PathBuf]) -> Result<ImportSummary> {
        if paths.is_empty() {
            warn!("No export files to import");
        }

        let mut total = ImportSummary::default();
        for path in paths {
            info!("{}", path.display());
            total += self.import_file(path)?;
        }

        info!(
            "Imported {} files: {} rows read, {} inserted, {} duplicates ignored",
            total.files, total.rows, total.inserted, total.duplicates
        );
        Ok(total)
    }

    /// Import one file inside a single transaction.
    ///
    /// The first record is skipped as a header whether or not it is one.
    pub fn import_file(&self, path: &Path) -> Result<ImportSummary> {
        let mut reader = open_csv(path)?;
        let batch = self.store.batch()?;
        let mut summary = ImportSummary {
            files: 1,
            ..Default::default()
        };

        for record in reader.records() {
            let record = record.map_err(|source| GscError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let row = parse_row(&record).map_err(|reason| malformed(path, &record, reason))?;

            let query_id = batch.upsert_query(&row.query)?;
            summary.rows += 1;
            if batch.insert_result(&row, query_id)? {
                summary.inserted += 1;
            } else {
                summary.duplicates += 1;
            }
        }

        batch.commit()?;
        Ok(summary)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::find_export_files;
    use gsc_core::models::{Granularity, Metrics};
    use tempfile::TempDir;

    const HEADER: &str = "Date,Query,Page,Device,Country,Clicks,Impressions,CTR,Position";

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.initialize().unwrap();
        store
    }

    fn write_export(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let mut content = String::from(HEADER);
        content.push('\n');
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_import_file_counts_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_export(
            dir.path(),
            "2023-07-01_detailed_web.csv",
            &[
                "2023-07-01,red shoes,https://e.com/a,MOBILE,usa,3,10,0.3,2",
                "2023-07-01,red shoes,https://e.com/b,MOBILE,usa,1,1,1,1",
                "2023-07-01,blue hat,https://e.com/c,DESKTOP,usa,0,4,0,8",
            ],
        );
        let store = store();

        let summary = Importer::new(&store).import_file(&path).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                files: 1,
                rows: 3,
                inserted: 2,
                duplicates: 1
            }
        );
        assert_eq!(store.result_count().unwrap(), 2);
        assert_eq!(store.query_count().unwrap(), 2);
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_export(
            dir.path(),
            "2023-07-01_detailed_web.csv",
            &[
                "2023-07-01,red shoes,https://e.com/,MOBILE,usa,3,10,0.3,2",
                "2023-07-02,red shoes,https://e.com/,MOBILE,usa,5,20,0.25,3",
            ],
        );
        let store = store();
        let importer = Importer::new(&store);

        importer.import_file(&path).unwrap();
        let once = store.result_count().unwrap();
        let second = importer.import_file(&path).unwrap();

        assert_eq!(store.result_count().unwrap(), once);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);
    }

    #[test]
    fn test_header_only_file_imports_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_export(dir.path(), "x_detailed_web.csv", &[]);
        let store = store();

        let summary = Importer::new(&store).import_file(&path).unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(store.result_count().unwrap(), 0);
    }

    #[test]
    fn test_first_line_is_always_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x_detailed_web.csv");
        std::fs::write(
            &path,
            "2023-07-01,lost row,https://e.com/,MOBILE,usa,1,1,1,1\n\
             2023-07-01,kept row,https://e.com/,MOBILE,usa,1,1,1,1\n",
        )
        .unwrap();
        let store = store();

        Importer::new(&store).import_file(&path).unwrap();
        assert!(store.top_queries("lost", 50).unwrap().is_empty());
        assert_eq!(store.top_queries("kept", 50).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_row_is_fatal_and_rolls_back_file() {
        let dir = TempDir::new().unwrap();
        let path = write_export(
            dir.path(),
            "x_detailed_web.csv",
            &[
                "2023-07-01,red shoes,https://e.com/,MOBILE,usa,3,10,0.3,2",
                "2023-07-02,broken",
            ],
        );
        let store = store();

        let err = Importer::new(&store).import_file(&path).unwrap_err();
        match err {
            GscError::MalformedRow { line, reason, .. } => {
                assert_eq!(line, 3);
                assert_eq!(reason, "expected 9 fields, found 2");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.result_count().unwrap(), 0);
    }

    #[test]
    fn test_import_all_walks_monthly_folders() {
        let dir = TempDir::new().unwrap();
        let july = dir.path().join("2023-07");
        let august = dir.path().join("2023-08");
        std::fs::create_dir_all(&july).unwrap();
        std::fs::create_dir_all(&august).unwrap();
        write_export(
            &july,
            "2023-07-15_detailed_web.csv",
            &["2023-07-15,red shoes,https://e.com/,MOBILE,usa,3,10,0.3,2"],
        );
        write_export(
            &august,
            "2023-08-01_detailed_web.csv",
            &["2023-08-01,red shoes,https://e.com/,MOBILE,usa,5,20,0.25,3"],
        );
        write_export(
            &august,
            "2023-08-01_other.csv",
            &["2023-08-01,ignored,https://e.com/,MOBILE,usa,50,200,0.25,3"],
        );
        let store = store();

        let files = find_export_files(dir.path()).unwrap();
        let summary = Importer::new(&store).import_all(&files).unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(summary.inserted, 2);
        let monthly = store.aggregate("shoes", Granularity::Monthly).unwrap();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[1].metrics, Metrics::new(5, 20));
    }

    #[test]
    fn test_import_all_without_files_is_ok() {
        let store = store();
        let summary = Importer::new(&store).import_all(&[]).unwrap();
        assert_eq!(summary, ImportSummary::default());
    }
}
