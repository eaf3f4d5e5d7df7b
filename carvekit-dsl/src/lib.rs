//! carvekit DSL - carved-context canonicalizer
//!
//! Turns the raw dump written by the memory-tracking instrumentation tool for
//! one captured call into a compact, deduplicable canonical string.
//!
//! Architecture:
//! ```text
//! Raw dump (one file per captured call)
//!     ↓
//! Scanner (marker + classified expression per line)
//!     ↓
//! Parser (scope stack → ContextGraph arena)
//!     ↓
//! Canonical printer (bounded text), resolving pointer reachability
//! as each pointer is visited
//!     ↓
//! Content hash
//! ```

pub mod lexer;
pub mod parser;
pub mod pretty_printer;
pub mod resolver;

pub use lexer::{Line, LineKind, Scanner};
pub use parser::*;
pub use pretty_printer::{canonical_form, expression_form, value_form};
pub use resolver::{resolve_pointer, resolve_reachability, visit_order};

use carvekit_core::content_hash_hex;

/// Canonical form of one dump together with its deduplication key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalContext {
    pub text: String,
    /// Hex SHA-256 of `text`.
    pub hash: String,
}

impl CanonicalContext {
    pub fn new(text: String) -> Self {
        let hash = content_hash_hex(&text);
        Self { text, hash }
    }
}

/// Parse and print one dump.
pub fn canonicalize(source: &str) -> Result<CanonicalContext, ParseError> {
    let mut graph = parse(source)?;
    Ok(CanonicalContext::new(canonical_form(&mut graph)))
}
