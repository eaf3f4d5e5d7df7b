//! Carve artifact name convention: `<carve-key>_<callIndex>_<carveIndex>`.
//!
//! The instrumentation tool names every dump after the function it captured,
//! the invocation index of that function within the run, and a running carve
//! counter. Only the key and the call index are used downstream.

use crate::error::NameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed carve artifact name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarveName {
    /// Function / call-site key; everything before the second-from-last `_`.
    pub key: String,
    /// Invocation index of the captured call.
    pub call_index: u64,
    /// Running carve counter assigned by the instrumentation tool.
    pub carve_index: u64,
}

impl CarveName {
    /// Split a carve artifact name from the right.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let missing = || NameError::MissingSeparator {
            name: name.to_string(),
        };
        let last = name.rfind('_').ok_or_else(missing)?;
        let second = name[..last].rfind('_').ok_or_else(missing)?;

        let key = &name[..second];
        if key.is_empty() {
            return Err(NameError::EmptyKey {
                name: name.to_string(),
            });
        }

        let call_index = parse_segment(name, "call index", &name[second + 1..last])?;
        let carve_index = parse_segment(name, "carve index", &name[last + 1..])?;

        Ok(Self {
            key: key.to_string(),
            call_index,
            carve_index,
        })
    }
}

impl fmt::Display for CarveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.key, self.call_index, self.carve_index)
    }
}

fn parse_segment(name: &str, segment: &'static str, value: &str) -> Result<u64, NameError> {
    value.parse::<u64>().map_err(|_| NameError::InvalidIndex {
        name: name.to_string(),
        segment,
        value: value.to_string(),
    })
}

/// Return `(carve key, call index)` for a carve artifact name.
pub fn parse_carve_filename(name: &str) -> Result<(String, u64), NameError> {
    let parsed = CarveName::parse(name)?;
    Ok((parsed.key, parsed.call_index))
}
