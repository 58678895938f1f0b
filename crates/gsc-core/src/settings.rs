use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::Granularity;

/// Default store file, created in the working directory on first import.
pub const DEFAULT_STORE_PATH: &str = "_gsc.sq3";

/// Default number of rows printed by `query`.
pub const DEFAULT_QUERY_LIMIT: usize = 50;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Import search-console performance exports and report on them
#[derive(Parser, Debug, Clone)]
#[command(
    name = "gsc",
    about = "Import search-console performance exports and report on them",
    version
)]
pub struct Settings {
    /// Path of the SQLite store
    #[arg(long, global = true, default_value = DEFAULT_STORE_PATH)]
    pub db: PathBuf,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// The three workflows plus the store date range.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Recursively import every daily `*_detailed_web.csv` export under DIRECTORY
    Import {
        /// Directory containing monthly folders of daily exports
        directory: PathBuf,
    },

    /// Aggregate stored metrics per class defined in CLASS_FILE
    Classify {
        /// Time bucketing: monthly, yearly or all (no bucketing)
        #[arg(value_enum)]
        granularity: Granularity,

        /// CSV with a header and two columns: term,class (e.g. car,vehicle)
        class_file: PathBuf,
    },

    /// Print aggregated metrics for queries containing QUERY
    Query {
        /// Substring to match (case-insensitive)
        query: String,

        /// Maximum number of rows to print
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: usize,
    },

    /// Print the first and last stored dates
    Range,
}

// ── StoreConfig ────────────────────────────────────────────────────────────────

/// Location of the persisted store, handed to `Store::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] but from an explicit argument list.
    pub fn try_load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    /// The store location selected on the command line.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.db.clone())
    }

    fn resolve(mut settings: Settings) -> Settings {
        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_import_command() {
        let settings = Settings::try_load_from(["gsc", "import", "exports"]).unwrap();
        assert_eq!(
            settings.command,
            Command::Import {
                directory: PathBuf::from("exports")
            }
        );
        assert_eq!(settings.db, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(settings.log_level, "INFO");
    }

    #[test]
    fn test_classify_command_parses_granularity() {
        let settings =
            Settings::try_load_from(["gsc", "classify", "monthly", "classes.csv"]).unwrap();
        assert_eq!(
            settings.command,
            Command::Classify {
                granularity: Granularity::Monthly,
                class_file: PathBuf::from("classes.csv"),
            }
        );

        let settings = Settings::try_load_from(["gsc", "classify", "all", "classes.csv"]).unwrap();
        assert!(matches!(
            settings.command,
            Command::Classify {
                granularity: Granularity::All,
                ..
            }
        ));
    }

    #[test]
    fn test_classify_rejects_unknown_granularity() {
        let err = Settings::try_load_from(["gsc", "classify", "weekly", "classes.csv"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_missing_arguments_are_rejected_up_front() {
        let err = Settings::try_load_from(["gsc", "classify", "monthly"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Settings::try_load_from(["gsc", "query"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        let err = Settings::try_load_from(["gsc"]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand | ErrorKind::MissingSubcommand
        ));
    }

    #[test]
    fn test_query_default_limit() {
        let settings = Settings::try_load_from(["gsc", "query", "shoe"]).unwrap();
        assert_eq!(
            settings.command,
            Command::Query {
                query: "shoe".to_string(),
                limit: DEFAULT_QUERY_LIMIT,
            }
        );
    }

    #[test]
    fn test_global_db_flag_after_subcommand() {
        let settings =
            Settings::try_load_from(["gsc", "query", "shoe", "--db", "/tmp/other.sq3"]).unwrap();
        assert_eq!(settings.store_config().path, PathBuf::from("/tmp/other.sq3"));
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings = Settings::try_load_from(["gsc", "--debug", "range"]).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
        assert_eq!(settings.command, Command::Range);
    }

    #[test]
    fn test_store_config_default() {
        assert_eq!(StoreConfig::default().path, PathBuf::from("_gsc.sq3"));
    }
}
