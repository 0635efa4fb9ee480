//! Translation report - prints locale completeness and source scan results without starting the server
//!
//! Usage:
//!   cargo run --bin translation-report            # Human-readable report
//!   cargo run --bin translation-report -- --json  # Machine-readable report
//!
//! Reads the same environment variables as the server (MESSAGES_DIR,
//! FRONTEND_DIR, REFERENCE_LOCALE, UNTRANSLATABLE_CONFIG, EXCLUDED_DIRS).

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use translation_manager::compare::{diff, find_identical_values, UntranslatableConfig};
use translation_manager::config::Config;
use translation_manager::locale::LocaleStore;
use translation_manager::scanner::{
    list_source_files, missing_in_code, orphaned_in_code, scan_for_redundant_wrappers,
    scan_for_usage,
};

#[derive(Debug, Serialize)]
struct LocaleRow {
    code: String,
    display_name: String,
    total_keys: usize,
    missing: usize,
    identical: usize,
    extra: usize,
    completeness: f64,
}

#[derive(Debug, Serialize)]
struct SourceRow {
    files_scanned: usize,
    files_with_translations: usize,
    keys_in_code: usize,
    orphaned: usize,
    missing_in_code: usize,
    redundant_wrappers: usize,
    unreadable_files: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    reference: String,
    locales: Vec<LocaleRow>,
    sources: Option<SourceRow>,
}

fn build_report(config: &Config) -> Result<Report> {
    let store = LocaleStore::open(&config.messages_dir, &config.reference_locale)
        .context("Failed to load locale files")?;
    let filter = UntranslatableConfig::load(&config.untranslatable_config)?.identical_filter();
    let reference = store.reference_keys();

    let locales = store
        .summaries()
        .into_iter()
        .filter(|s| !s.is_reference)
        .map(|summary| {
            let keys = store.keys(&summary.code).unwrap_or_default();
            let result = diff(&reference, &keys);
            LocaleRow {
                missing: result.missing.len(),
                identical: find_identical_values(&reference, &keys, &filter).len(),
                extra: result.extra.len(),
                completeness: result.completeness(),
                code: summary.code,
                display_name: summary.display_name,
                total_keys: summary.total_keys,
            }
        })
        .collect();

    let sources = match list_source_files(&config.frontend_dir, &config.excluded_dirs) {
        Ok(files) => {
            let usage = scan_for_usage(&config.frontend_dir, &files);
            let wrappers = scan_for_redundant_wrappers(&config.frontend_dir, &files);
            Some(SourceRow {
                files_scanned: usage.files_scanned,
                files_with_translations: usage.files_with_translations,
                keys_in_code: usage.usages.len(),
                orphaned: orphaned_in_code(&usage.usages, &store.key_sets()).len(),
                missing_in_code: missing_in_code(&reference, &usage.usages).len(),
                redundant_wrappers: wrappers.findings.iter().map(|f| f.count).sum(),
                unreadable_files: usage.errors.len(),
            })
        }
        Err(e) => {
            warn!("Skipping source scan: {:#}", e);
            None
        }
    };

    Ok(Report {
        reference: store.reference_code().to_string(),
        locales,
        sources,
    })
}

fn print_report(report: &Report) {
    println!("\n{}", "=".repeat(72));
    println!("TRANSLATION REPORT (reference: {})", report.reference);
    println!("{}", "=".repeat(72));
    println!(
        "{:<8} {:<22} {:>7} {:>8} {:>10} {:>6} {:>7}",
        "Code", "Language", "Keys", "Missing", "Identical", "Extra", "Done"
    );
    for row in &report.locales {
        println!(
            "{:<8} {:<22} {:>7} {:>8} {:>10} {:>6} {:>6.1}%",
            row.code,
            row.display_name,
            row.total_keys,
            row.missing,
            row.identical,
            row.extra,
            row.completeness
        );
    }

    if let Some(sources) = &report.sources {
        println!("{}", "-".repeat(72));
        println!(
            "Source files: {} scanned, {} with translations, {} unreadable",
            sources.files_scanned, sources.files_with_translations, sources.unreadable_files
        );
        println!("Keys referenced in code: {}", sources.keys_in_code);
        println!("Orphaned (used but undefined): {}", sources.orphaned);
        println!("Unused reference keys: {}", sources.missing_in_code);
        println!("Redundant JSX wrappers: {}", sources.redundant_wrappers);
    }
    println!("{}\n", "=".repeat(72));
}

fn main() -> Result<()> {
    // Load environment from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_manager=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = std::env::args().any(|arg| arg == "--json");

    let config = Config::from_env()?;
    info!("Building report for {}", config.messages_dir.display());
    let report = build_report(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
