//! Fuzz test for carve artifact name parsing
//!
//! Run with: cargo +nightly fuzz run carve_name_fuzz -- -max_total_time=60

#![no_main]

use carvekit_core::CarveName;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(name) = std::str::from_utf8(data) {
        if let Ok(parsed) = CarveName::parse(name) {
            assert!(!parsed.key.is_empty(), "carve key must be non-empty");
            // Display rebuilds the name when the indices had no leading zeros.
            let rebuilt = parsed.to_string();
            let reparsed = CarveName::parse(&rebuilt).expect("rebuilt name must parse");
            assert_eq!(parsed, reparsed);
        }
    }
});
