//! Directory ingestion.
//!
//! Every file in a dump directory is named `<carve key>_<call>_<carve>`. Files
//! are sorted by name, canonicalized in parallel, and inserted into the store
//! one at a time in that order.

use crate::config::IngestConfig;
use carvekit_core::{parse_carve_filename, CarveError, CarveRecord, CarveResult};
use carvekit_dsl::{canonicalize, CanonicalContext};
use carvekit_storage::CarveStore;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of the debug copies written next to each dump.
pub const PROCESSED_SUFFIX: &str = "processed";

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub scanned: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub bad_names: usize,
    pub failed: usize,
}

/// What happened to one dump before insertion.
#[derive(Debug)]
enum Prepared {
    BadName,
    Filtered,
    Failed,
    Ready(Box<CarveRecord>),
}

/// Ingest every dump in `dir` into `store`.
pub fn ingest_dir(
    dir: &Path,
    config: &IngestConfig,
    store: &dyn CarveStore,
) -> CarveResult<IngestSummary> {
    let paths = dump_paths(dir)?;
    tracing::info!(dir = %dir.display(), files = paths.len(), "ingesting dumps");

    let prepared: Vec<Prepared> = paths.par_iter().map(|path| prepare(path, config)).collect();

    let mut summary = IngestSummary {
        scanned: paths.len(),
        ..IngestSummary::default()
    };
    for item in prepared {
        match item {
            Prepared::BadName => summary.bad_names += 1,
            Prepared::Filtered => summary.filtered += 1,
            Prepared::Failed => summary.failed += 1,
            Prepared::Ready(record) => {
                if store.insert(&record)? {
                    summary.inserted += 1;
                } else {
                    summary.duplicates += 1;
                }
            }
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        filtered = summary.filtered,
        bad_names = summary.bad_names,
        failed = summary.failed,
        "ingest finished"
    );
    Ok(summary)
}

/// Regular files in `dir`, sorted by name, excluding debug copies.
pub fn dump_paths(dir: &Path) -> CarveResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| CarveError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CarveError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().is_some_and(|ext| ext == PROCESSED_SUFFIX) {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Read and canonicalize one dump file.
pub fn canonicalize_file(path: &Path) -> CarveResult<CanonicalContext> {
    let text = fs::read_to_string(path).map_err(|e| CarveError::io(path, e))?;
    Ok(canonicalize(&text)?)
}

fn prepare(path: &Path, config: &IngestConfig) -> Prepared {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Prepared::BadName;
    };

    let (function, call_index) = match parse_carve_filename(name) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(file = name, error = %e, "skipping file");
            return Prepared::BadName;
        }
    };

    if !config.accepts(&function, call_index) {
        return Prepared::Filtered;
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(file = name, error = %e, "failed to read dump");
            return Prepared::Failed;
        }
    };

    let context = if config.raw {
        text
    } else {
        match canonicalize(&text) {
            Ok(canonical) => canonical.text,
            Err(e) => {
                tracing::warn!(file = name, line = e.line, error = %e.kind, "exception while carving");
                return Prepared::Failed;
            }
        }
    };

    if config.debug {
        let processed = path.with_file_name(format!("{}.{}", name, PROCESSED_SUFFIX));
        if let Err(e) = fs::write(&processed, &context) {
            tracing::warn!(file = %processed.display(), error = %e, "failed to write debug copy");
        }
    }

    let mut record = CarveRecord::new(config.project.clone(), function, call_index, context)
        .with_raw(config.raw)
        .with_crash(config.is_crash);
    if let Some(testcase) = &config.testcase {
        record = record.with_testcase(testcase.clone());
    }
    Prepared::Ready(Box::new(record))
}
