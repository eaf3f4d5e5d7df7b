//! Dump line types

use serde::{Deserialize, Serialize};

// ============================================================================
// LINE TYPES
// ============================================================================

/// Recognized primitive type-tag prefixes.
pub const PRIMITIVE_TAGS: &[&str] = &[
    "i8", "i16", "i32", "i64", "f32", "f64", "func", "struct", "%struct", "class", "union",
];

/// Dotted aggregate prefixes stripped from type tags (`struct.foo` -> `foo`).
pub const TYPE_PREFIXES: &[&str] = &["struct", "%struct", "class", "union"];

/// Reached marker: the line's data was touched during execution.
pub const REACHED_MARKER: char = '%';

/// Value written by the instrumentation tool when a scalar could not be read.
pub const UNRESOLVED_VALUE: &str = "?";

/// Normalized form of [`UNRESOLVED_VALUE`].
pub const UNKNOWN_VALUE: &str = "unknown";

/// One classified dump expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    /// `<type> p<N>[<size>]`
    ArrayDecl { ty: String, name: u64, size: u64 },
    /// `<type> *p<N>+<offset>`
    PointerOffset { ty: String, base: u64, offset: i64 },
    /// `PTR_BEGIN <N>`
    PtrBegin(u64),
    /// `PTR_END <N>`
    PtrEnd(u64),
    /// `PTR_IDX <I>`
    PtrIdx(usize),
    StructBegin,
    StructEnd,
    /// `<type> <value>`, with `?` already normalized.
    Primitive { ty: String, value: String },
}

/// A scanned, non-empty dump line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub kind: LineKind,
    pub reached: bool,
    /// 1-based line number in the dump text.
    pub line: usize,
}
