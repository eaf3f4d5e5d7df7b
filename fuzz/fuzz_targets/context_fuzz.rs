//! Fuzz test for the carved-context canonicalizer
//!
//! Feeds arbitrary text through scan, parse, resolve and print to find:
//! - Panics or crashes
//! - Non-deterministic output
//! - Errors pointing outside the input
//!
//! Run with: cargo +nightly fuzz run context_fuzz -- -max_total_time=60

#![no_main]

use carvekit_dsl::canonicalize;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match canonicalize(input) {
            Ok(first) => {
                // Same input, same bytes, same hash.
                let second = canonicalize(input).expect("second run must also succeed");
                assert_eq!(first, second, "canonical form must be deterministic");
                assert_eq!(first.hash.len(), 64, "hash must be hex SHA-256");
            }
            Err(err) => {
                let lines = input.lines().count();
                assert!(err.line >= 1, "line numbers are 1-based");
                assert!(err.line <= lines, "error line {} past end ({})", err.line, lines);
            }
        }
    }
});
