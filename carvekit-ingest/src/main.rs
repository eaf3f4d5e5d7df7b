//! carvekit CLI
//!
//! # Usage
//!
//! ```bash
//! # Canonicalize and store every dump in a directory
//! carvekit --project libpng ingest out/
//!
//! # Only the first call of one function
//! carvekit --project libpng ingest out/ --unit png_read_info --testcase crash-01 --crash
//!
//! # Print one dump's canonical form and hash
//! carvekit canonicalize out/png_read_info_1_0
//!
//! # Stored contexts per function
//! carvekit --project libpng count
//!
//! # Raw dumps stored by `ingest --raw`
//! carvekit --project libpng get png_read_info --raw
//! ```

use carvekit_core::CarveResult;
use carvekit_ingest::{canonicalize_file, ingest_dir, init_tracing, IngestConfig};
use carvekit_storage::{CarveStore, JsonlCarveStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "carvekit")]
#[command(about = "Canonicalize and store carved call contexts", long_about = None)]
struct Cli {
    /// Project the records belong to
    #[arg(long, global = true)]
    project: Option<String>,

    /// JSON-lines store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Canonicalize every dump in a directory and store it
    Ingest {
        /// Directory of dumps
        dir: PathBuf,

        /// Only this function's dumps
        #[arg(long)]
        function: Option<String>,

        /// Only this call index
        #[arg(long)]
        call_index: Option<u64>,

        /// Only the first call of this function
        #[arg(long, conflicts_with = "function")]
        unit: Option<String>,

        /// Store raw dump text
        #[arg(long)]
        raw: bool,

        /// Write <dump>.processed next to each dump
        #[arg(long)]
        debug: bool,

        /// Input that produced the dumps
        #[arg(long)]
        testcase: Option<String>,

        /// The input crashed the target
        #[arg(long, requires = "testcase")]
        crash: bool,
    },

    /// Print the canonical form and hash of one dump
    Canonicalize {
        /// Dump file
        file: PathBuf,
    },

    /// Number of stored contexts per function
    Count,

    /// Stored contexts of one function
    Get {
        /// Function name (carve key)
        function: String,

        /// Print stored raw dumps instead of canonical contexts
        #[arg(long)]
        raw: bool,
    },
}

fn main() -> CarveResult<()> {
    let cli = Cli::parse();

    let mut config = IngestConfig::from_env()?;
    if let Some(project) = cli.project {
        config.project = project;
    }
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    config.log_json |= cli.log_json;

    init_tracing(config.log_json)?;

    match cli.command {
        Commands::Ingest {
            dir,
            function,
            call_index,
            unit,
            raw,
            debug,
            testcase,
            crash,
        } => {
            if function.is_some() {
                config.target_function = function;
            }
            if call_index.is_some() {
                config.call_index = call_index;
            }
            if let Some(unit) = unit {
                config = config.unit(unit)?;
            }
            config.raw |= raw;
            config.debug |= debug;
            config.testcase = testcase;
            config.is_crash = crash;
            config.validate()?;

            let store = JsonlCarveStore::open(&config.store_path)?;
            let summary = ingest_dir(&dir, &config, &store)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).unwrap_or_else(|_| format!("{:?}", summary))
            );
        }
        Commands::Canonicalize { file } => {
            let canonical = canonicalize_file(&file)?;
            println!("{}", canonical.text);
            println!();
            println!("{}", canonical.hash);
        }
        Commands::Count => {
            config.validate()?;
            let store = JsonlCarveStore::open(&config.store_path)?;
            for (function, count) in store.count_by_function(&config.project)? {
                println!("{}\t{}", function, count);
            }
        }
        Commands::Get { function, raw } => {
            config.validate()?;
            let store = JsonlCarveStore::open(&config.store_path)?;
            let contexts = if raw {
                store.raw_dumps(&config.project, &function)?
            } else {
                store.contexts(&config.project, &function)?
            };
            for context in contexts {
                println!("{}", context);
                println!();
            }
        }
    }
    Ok(())
}
