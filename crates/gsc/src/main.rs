mod bootstrap;

use std::io::Write;

use anyhow::Result;
use gsc_core::settings::{Command, Settings};
use gsc_data::classifier::{load_term_class_map, render_json, Classifier};
use gsc_data::importer::Importer;
use gsc_data::query::{render_rows, run_query};
use gsc_data::reader::find_export_files;
use gsc_store::Store;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;
    tracing::debug!("gsc v{} starting", env!("CARGO_PKG_VERSION"));

    let stdout = std::io::stdout();
    run(&settings, &mut stdout.lock())
}

/// Execute the selected command against the configured store, writing
/// reports to `out`.
fn run(settings: &Settings, out: &mut impl Write) -> Result<()> {
    let config = settings.store_config();

    match &settings.command {
        Command::Import { directory } => {
            // Discover first so a bad directory never creates the store.
            let files = find_export_files(directory)?;
            let store = Store::open(&config)?;
            store.initialize()?;
            Importer::new(&store).import_all(&files)?;
        }

        Command::Classify {
            granularity,
            class_file,
        } => {
            let terms = load_term_class_map(class_file)?;
            let store = Store::open_existing(&config)?;
            store.initialize()?;
            let classes = Classifier::new(&store).classify(&terms, *granularity)?;
            writeln!(out, "{}", render_json(&classes)?)?;
        }

        Command::Query { query, limit } => {
            let store = Store::open_existing(&config)?;
            store.initialize()?;
            let rows = run_query(&store, query, *limit)?;
            if !rows.is_empty() {
                writeln!(out, "{}", render_rows(&rows))?;
            }
        }

        Command::Range => {
            let store = Store::open_existing(&config)?;
            store.initialize()?;
            writeln!(out, "{}", store.date_range()?)?;
        }
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
