use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the search-console tool.
#[derive(Error, Debug)]
pub enum GscError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader failed on a file (I/O or framing error).
    #[error("Failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A CSV record did not have the expected shape or field types.
    #[error("Malformed row at {path}:{line}: {reason}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// An error returned by the SQLite store.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A report could not be serialized to JSON.
    #[error("Failed to serialize JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// The directory given to `import` does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A read command was run before any import created the store.
    #[error("Store not found: {0} (run `gsc import` first)")]
    StoreNotFound(PathBuf),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the gsc crates.
pub type Result<T> = std::result::Result<T, GscError>;
