use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Date format used by search-console exports and stored in the results table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One observation from a daily detailed-web export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Day the metrics were recorded for.
    pub date: NaiveDate,
    /// Search term exactly as exported (case preserved).
    pub query: String,
    /// Landing page URL.
    pub page: String,
    /// Device class, e.g. `DESKTOP` or `MOBILE`.
    pub device: String,
    /// Three-letter country code.
    pub country: String,
    pub clicks: i64,
    pub impressions: i64,
    /// Click-through rate as a fraction in `0.0..=1.0`.
    pub ctr: f64,
    /// Average ranking position.
    pub position: f64,
}

impl ResultRow {
    /// The stored text form of [`ResultRow::date`].
    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Click and impression totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub clicks: i64,
    pub impressions: i64,
}

impl Metrics {
    pub fn new(clicks: i64, impressions: i64) -> Self {
        Self {
            clicks,
            impressions,
        }
    }

    /// Add another set of totals into this one.
    pub fn add(&mut self, other: Metrics) {
        self.clicks += other.clicks;
        self.impressions += other.impressions;
    }
}

/// Time bucketing applied to aggregated metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One all-time total, no period breakdown.
    All,
    /// Periods keyed `YYYY-MM`.
    Monthly,
    /// Periods keyed `YYYY`.
    Yearly,
}

impl Granularity {
    /// Number of leading date characters that form the period label.
    ///
    /// Returns `None` for [`Granularity::All`].
    pub fn period_len(self) -> Option<usize> {
        match self {
            Granularity::All => None,
            Granularity::Monthly => Some(7),
            Granularity::Yearly => Some(4),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::All => "all",
            Granularity::Monthly => "monthly",
            Granularity::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

/// One row returned by an aggregate query.
///
/// `period` is `None` when no granularity was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTotals {
    pub period: Option<String>,
    pub metrics: Metrics,
}

/// Per-query totals returned by the lookup command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStats {
    pub query: String,
    pub clicks: i64,
    pub impressions: i64,
    pub avg_position: f64,
}

impl fmt::Display for QueryStats {
    /// Renders as a literal tuple: `('red shoes', 8, 30, 2.5)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("('")?;
        for ch in self.query.chars() {
            if ch == '\\' || ch == '\'' {
                f.write_str("\\")?;
            }
            write!(f, "{}", ch)?;
        }
        write!(
            f,
            "', {}, {}, {:?})",
            self.clicks, self.impressions, self.avg_position
        )
    }
}

/// First and last stored dates. Both are `None` on an empty store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub first: Option<String>,
    pub last: Option<String>,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.first.as_deref().unwrap_or("None"),
            self.last.as_deref().unwrap_or("None")
        )
    }
}

/// Accumulated totals for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassTotals {
    /// All-time total (granularity `all`).
    Total(Metrics),
    /// Totals keyed by period label.
    ByPeriod(BTreeMap<String, Metrics>),
}

/// Class label to totals. `BTreeMap` keeps the serialized keys sorted.
pub type ClassificationResult = BTreeMap<String, ClassTotals>;
