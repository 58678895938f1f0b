use gsc_core::models::{DateRange, Granularity, Metrics, PeriodTotals, QueryStats, ResultRow};
use gsc_core::settings::StoreConfig;
use gsc_core::{GscError, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::pattern::substring_pattern;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS gsc_queries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        query TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS gsc_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        query_id INTEGER NOT NULL REFERENCES gsc_queries(id),
        page TEXT NOT NULL,
        device TEXT NOT NULL,
        country TEXT NOT NULL,
        clicks INTEGER NOT NULL,
        impressions INTEGER NOT NULL,
        ctr REAL NOT NULL,
        position REAL NOT NULL,
        UNIQUE(date, query_id, device, country)
    );
    CREATE INDEX IF NOT EXISTS idx_gsc_results_date ON gsc_results(date);
    CREATE INDEX IF NOT EXISTS idx_gsc_results_query ON gsc_results(query_id);
";

// ── Store ──────────────────────────────────────────────────────────────────────

/// Single-connection handle on the persisted store.
///
/// Not safe for concurrent writers from several processes.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the store file named by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        debug!("Opening store {}", config.path.display());
        let conn = Connection::open(&config.path)?;
        Self::from_connection(conn)
    }

    /// Open a store that an earlier import already created.
    pub fn open_existing(config: &StoreConfig) -> Result<Self> {
        if !config.path.is_file() {
            return Err(GscError::StoreNotFound(config.path.clone()));
        }
        Self::open(config)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Create both tables and their indexes if absent.
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Return the key of `text`, inserting it first when unknown.
    pub fn upsert_query(&self, text: &str) -> Result<i64> {
        upsert_query_on(&self.conn, text)
    }

    /// Insert one result row. Returns `false` when a row with the same
    /// (date, query, device, country) already exists; nothing is written then.
    pub fn insert_result(&self, row: &ResultRow, query_id: i64) -> Result<bool> {
        insert_result_on(&self.conn, row, query_id)
    }

    /// Start a write batch committed as one transaction.
    pub fn batch(&self) -> Result<Batch<'_>> {
        Ok(Batch {
            tx: self.conn.unchecked_transaction()?,
        })
    }

    /// Sum clicks and impressions of rows whose query contains `term`.
    ///
    /// With [`Granularity::All`] exactly one row with `period == None` is
    /// returned (zeros when nothing matches). Otherwise one row per period
    /// label in ascending order.
    pub fn aggregate(&self, term: &str, granularity: Granularity) -> Result<Vec<PeriodTotals>> {
        let pattern = substring_pattern(term);

        let Some(len) = granularity.period_len() else {
            let metrics = self.conn.query_row(
                "SELECT COALESCE(SUM(r.clicks), 0), COALESCE(SUM(r.impressions), 0)
                 FROM gsc_results r
                 JOIN gsc_queries q ON q.id = r.query_id
                 WHERE q.query LIKE ?1 ESCAPE '\\'",
                params![pattern],
                |row| Ok(Metrics::new(row.get(0)?, row.get(1)?)),
            )?;
            return Ok(vec![PeriodTotals {
                period: None,
                metrics,
            }]);
        };

        let mut stmt = self.conn.prepare_cached(
            "SELECT substr(r.date, 1, ?2) AS period, SUM(r.clicks), SUM(r.impressions)
             FROM gsc_results r
             JOIN gsc_queries q ON q.id = r.query_id
             WHERE q.query LIKE ?1 ESCAPE '\\'
             GROUP BY period
             ORDER BY period ASC",
        )?;
        let rows = stmt.query_map(params![pattern, len as i64], |row| {
            Ok(PeriodTotals {
                period: Some(row.get(0)?),
                metrics: Metrics::new(row.get(1)?, row.get(2)?),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Per-query totals for queries containing `needle`, by impressions descending.
    pub fn top_queries(&self, needle: &str, limit: usize) -> Result<Vec<QueryStats>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT q.query, SUM(r.clicks), SUM(r.impressions) AS sum_impressions, AVG(r.position)
             FROM gsc_results r
             JOIN gsc_queries q ON q.id = r.query_id
             WHERE q.query LIKE ?1 ESCAPE '\\'
             GROUP BY r.query_id
             ORDER BY sum_impressions DESC, q.query ASC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![substring_pattern(needle), limit], |row| {
            Ok(QueryStats {
                query: row.get(0)?,
                clicks: row.get(1)?,
                impressions: row.get(2)?,
                avg_position: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Earliest and latest stored dates.
    pub fn date_range(&self) -> Result<DateRange> {
        let range = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM gsc_results",
            [],
            |row| {
                Ok(DateRange {
                    first: row.get(0)?,
                    last: row.get(1)?,
                })
            },
        )?;
        Ok(range)
    }

    /// Number of stored result rows.
    pub fn result_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM gsc_results", [], |row| row.get(0))?)
    }

    /// Number of distinct stored queries.
    pub fn query_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM gsc_queries", [], |row| row.get(0))?)
    }
}

// ── Batch ──────────────────────────────────────────────────────────────────────

/// Writes grouped into one transaction. Dropping without [`Batch::commit`]
/// rolls everything back.
pub struct Batch<'a> {
    tx: Transaction<'a>,
}

impl Batch<'_> {
    pub fn upsert_query(&self, text: &str) -> Result<i64> {
        upsert_query_on(&self.tx, text)
    }

    pub fn insert_result(&self, row: &ResultRow, query_id: i64) -> Result<bool> {
        insert_result_on(&self.tx, row, query_id)
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

// ── Shared statements ──────────────────────────────────────────────────────────

fn upsert_query_on(conn: &Connection, text: &str) -> Result<i64> {
    let existing = conn
        .prepare_cached("SELECT id FROM gsc_queries WHERE query = ?1")?
        .query_row(params![text], |row| row.get(0))
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.prepare_cached("INSERT INTO gsc_queries (query) VALUES (?1)")?
        .execute(params![text])?;
    Ok(conn.last_insert_rowid())
}

fn insert_result_on(conn: &Connection, row: &ResultRow, query_id: i64) -> Result<bool> {
    let inserted = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO gsc_results
                (date, query_id, page, device, country, clicks, impressions, ctr, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?
        .execute(params![
            row.date_key(),
            query_id,
            row.page,
            row.device,
            row.country,
            row.clicks,
            row.impressions,
            row.ctr,
            row.position,
        ])?;
    Ok(inserted == 1)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
