//! CLI subcommands and the per-file pipeline they share.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use statex_core::{Categorizer, ExtractionReport, StatementExtractor, StatementPayload, StatexConfig};

/// Load the configuration from an explicit path, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<StatexConfig> {
    let config = match config_path {
        Some(path) => StatexConfig::from_file(Path::new(path))?,
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                debug!("Using configuration from {}", default_path.display());
                StatexConfig::from_file(&default_path)?
            } else {
                StatexConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

/// Extract and enrich one statement file.
///
/// An unreadable document yields an empty payload; only I/O on the input
/// path itself is an error.
pub fn process_statement(path: &Path, config: &StatexConfig) -> anyhow::Result<(StatementPayload, ExtractionReport)> {
    let data = fs::read(path)?;
    let source = path.file_name().and_then(|s| s.to_str());

    let extractor = StatementExtractor::new(config.extraction.clone());
    let extraction = extractor.extract_pdf(&data, source);

    let mut categorizer = Categorizer::from_config(&config.classifier, &config.translation);
    let payload = categorizer.enrich_all(&extraction.transactions, extraction.metadata);

    let (hits, misses) = categorizer.cache().stats();
    info!(
        "{}: {} transactions ({} translation lookups, {} cached)",
        path.display(),
        payload.transactions.len(),
        hits + misses,
        hits
    );

    Ok((payload, extraction.report))
}
