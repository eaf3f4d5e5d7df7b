//! carvekit ingestion - turns a directory of carved dumps into stored,
//! deduplicated canonical contexts.

pub mod config;
pub mod ingest;
pub mod telemetry;

pub use config::IngestConfig;
pub use ingest::{canonicalize_file, dump_paths, ingest_dir, IngestSummary, PROCESSED_SUFFIX};
pub use telemetry::init_tracing;
