//! carvekit Test Utilities
//!
//! Centralized test infrastructure for the carvekit workspace:
//! - A builder for raw carved-context dumps
//! - Proptest generators for dumps and carve names
//! - Fixture dumps for common scenarios
//! - Custom assertions for carvekit errors

// Re-export the in-memory store from its source crate
pub use carvekit_storage::InMemoryCarveStore;

// Re-export core types for convenience
pub use carvekit_core::{
    compute_content_hash, content_hash_hex, CarveError, CarveName, CarveRecord, CarveResult,
    ConfigError, NameError, StorageError, Timestamp,
};

// ============================================================================
// DUMP BUILDER
// ============================================================================

/// Builds dump text line by line, in the layout the instrumentation writes:
/// a one-character reached marker, one space, then the expression.
#[derive(Debug, Clone, Default)]
pub struct DumpBuilder {
    lines: Vec<String>,
}

impl DumpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(mut self, reached: bool, expr: impl AsRef<str>) -> Self {
        let marker = if reached { '%' } else { ' ' };
        self.lines.push(format!("{} {}", marker, expr.as_ref()));
        self
    }

    /// `<ty> <value>`
    pub fn primitive(self, reached: bool, ty: &str, value: &str) -> Self {
        self.line(reached, format!("{} {}", ty, value))
    }

    /// `<ty> p<name>[<size>]`
    pub fn array(self, reached: bool, ty: &str, name: u64, size: u64) -> Self {
        self.line(reached, format!("{} p{}[{}]", ty, name, size))
    }

    /// `<ty> *p<base>+<offset>`
    pub fn offset(self, reached: bool, ty: &str, base: u64, offset: i64) -> Self {
        self.line(reached, format!("{} *p{}+{}", ty, base, offset))
    }

    pub fn begin(self, name: u64) -> Self {
        self.line(false, format!("PTR_BEGIN {}", name))
    }

    pub fn end(self, name: u64) -> Self {
        self.line(false, format!("PTR_END {}", name))
    }

    pub fn index(self, idx: usize) -> Self {
        self.line(false, format!("PTR_IDX {}", idx))
    }

    pub fn struct_begin(self, reached: bool) -> Self {
        self.line(reached, "STRUCT_BEGIN")
    }

    pub fn struct_end(self) -> Self {
        self.line(false, "STRUCT_END")
    }

    pub fn build(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for dumps and carve names.

    use super::DumpBuilder;
    use proptest::prelude::*;

    /// Generate a primitive type tag.
    pub fn arb_type_tag() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("i8"),
            Just("i16"),
            Just("i32"),
            Just("i64"),
            Just("f32"),
            Just("f64"),
        ]
    }

    /// Generate a captured scalar value, sometimes the `?` placeholder.
    pub fn arb_value() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => any::<i32>().prop_map(|v| v.to_string()),
            1 => Just("?".to_string()),
        ]
    }

    /// Generate a carve key. Keys may themselves contain underscores.
    pub fn arb_carve_key() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,16}[a-z0-9]"
    }

    /// Generate `(file name, key, call index, carve index)`.
    pub fn arb_carve_name() -> impl Strategy<Value = (String, String, u64, u64)> {
        (arb_carve_key(), 0u64..10_000, 0u64..10_000).prop_map(|(key, call, carve)| {
            (format!("{}_{}_{}", key, call, carve), key, call, carve)
        })
    }

    /// Generate a dump of top-level primitives only, with the argument count.
    pub fn arb_flat_dump() -> impl Strategy<Value = (String, usize)> {
        prop::collection::vec((any::<bool>(), arb_type_tag(), arb_value()), 0..16).prop_map(
            |items| {
                let count = items.len();
                let builder = items
                    .into_iter()
                    .fold(DumpBuilder::new(), |b, (reached, ty, value)| {
                        b.primitive(reached, ty, &value)
                    });
                (builder.build(), count)
            },
        )
    }

    /// One top-level argument of a generated dump.
    #[derive(Debug, Clone)]
    pub enum ArgShape {
        Primitive { reached: bool, value: String },
        /// Pointer whose slots are `None` (hole) or `Some(reached)`.
        Buffer { reached: bool, slots: Vec<Option<bool>> },
        /// Pointer to one struct with the given field flags.
        Record { reached: bool, fields: Vec<bool> },
    }

    pub fn arb_arg_shape() -> impl Strategy<Value = ArgShape> {
        prop_oneof![
            (any::<bool>(), arb_value())
                .prop_map(|(reached, value)| ArgShape::Primitive { reached, value }),
            (any::<bool>(), prop::collection::vec(prop::option::of(any::<bool>()), 0..12))
                .prop_map(|(reached, slots)| ArgShape::Buffer { reached, slots }),
            (any::<bool>(), prop::collection::vec(any::<bool>(), 0..6))
                .prop_map(|(reached, fields)| ArgShape::Record { reached, fields }),
        ]
    }

    /// Render shapes as a dump. Pointer `i` is named `p<i>`.
    pub fn render_shapes(shapes: &[ArgShape]) -> String {
        let mut builder = DumpBuilder::new();
        for (i, shape) in shapes.iter().enumerate() {
            let name = i as u64;
            builder = match shape {
                ArgShape::Primitive { reached, value } => builder.primitive(*reached, "i32", value),
                ArgShape::Buffer { reached, slots } => {
                    let mut b = builder.array(*reached, "i8", name, slots.len() as u64).begin(name);
                    for (idx, slot) in slots.iter().enumerate() {
                        if let Some(touched) = slot {
                            b = b.index(idx).primitive(*touched, "i8", &idx.to_string());
                        }
                    }
                    b.end(name)
                }
                ArgShape::Record { reached, fields } => {
                    let mut b = builder
                        .array(*reached, "%struct.rec", name, 1)
                        .begin(name)
                        .index(0)
                        .struct_begin(*reached);
                    for (f, touched) in fields.iter().enumerate() {
                        b = b.primitive(*touched, "i64", &f.to_string());
                    }
                    b.struct_end().end(name)
                }
            };
        }
        builder.build()
    }

    /// Generate a mixed dump together with its shapes.
    pub fn arb_shaped_dump() -> impl Strategy<Value = (String, Vec<ArgShape>)> {
        prop::collection::vec(arb_arg_shape(), 0..8)
            .prop_map(|shapes| (render_shapes(&shapes), shapes))
    }

    /// Generate arbitrary text built from the dump alphabet.
    pub fn arb_noise_dump() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                "[% ][ a-zA-Z0-9_.*+?%\\[\\]-]{0,24}",
                Just("  PTR_BEGIN 0".to_string()),
                Just("  PTR_END 0".to_string()),
                Just("  PTR_IDX 1".to_string()),
                Just("% STRUCT_BEGIN".to_string()),
                Just("  STRUCT_END".to_string()),
                Just("% i8 p0[2]".to_string()),
            ],
            0..24,
        )
        .prop_map(|lines| lines.join("\n"))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Dumps shared across test suites.

    /// Two top-level primitives, the second uncaptured.
    pub const TWO_PRIMITIVES: &str = "% i32 5\n  i32 ?\n";

    /// Pointer with slot 1 never filled.
    pub const HOLED_POINTER: &str = "\
% i32 p0[3]
  PTR_BEGIN 0
  PTR_IDX 0
% i32 7
  PTR_IDX 2
% i32 9
  PTR_END 0
";

    /// Struct behind a pointer, holding a second pointer.
    pub const NESTED_STRUCT: &str = "\
  %struct.node p0[1]
  PTR_BEGIN 0
  PTR_IDX 0
% STRUCT_BEGIN
% i32 3
% i8 p1[2]
  PTR_BEGIN 1
  PTR_IDX 1
% i8 65
  PTR_END 1
  STRUCT_END
  PTR_END 0
% i64 9
";

    /// `STRUCT_END` closing a pointer scope, at line 4.
    pub const STRUCT_END_MISMATCH: &str = "\
% i32 p0[1]
  PTR_BEGIN 0
  PTR_IDX 0
  STRUCT_END
";
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for carvekit results.

    use super::*;

    /// Assert that a CarveResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &CarveResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a CarveResult is a context error at `line`.
    #[track_caller]
    pub fn assert_context_error<T: std::fmt::Debug>(result: &CarveResult<T>, line: usize) {
        match result {
            Err(CarveError::Context { line: l, .. }) => {
                assert_eq!(*l, line, "Wrong line in context error");
            }
            other => panic!("Expected Context error at line {}, got: {:?}", line, other),
        }
    }

    /// Assert that a CarveResult is a Storage error.
    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &CarveResult<T>) {
        match result {
            Err(CarveError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    /// Assert that a CarveResult is a Config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &CarveResult<T>) {
        match result {
            Err(CarveError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert that a string is a lowercase 64-character hex digest.
    #[track_caller]
    pub fn assert_hex_digest(hash: &str) {
        assert_eq!(hash.len(), 64, "digest length: {}", hash);
        assert!(
            hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
            "digest not lowercase hex: {}",
            hash
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_layout() {
        let text = DumpBuilder::new()
            .array(true, "i8", 0, 2)
            .begin(0)
            .index(1)
            .primitive(false, "i8", "4")
            .end(0)
            .build();
        assert_eq!(
            text,
            "% i8 p0[2]\n  PTR_BEGIN 0\n  PTR_IDX 1\n  i8 4\n  PTR_END 0\n"
        );
    }

    #[test]
    fn test_builder_matches_fixture() {
        let text = DumpBuilder::new()
            .primitive(true, "i32", "5")
            .primitive(false, "i32", "?")
            .build();
        assert_eq!(text, fixtures::TWO_PRIMITIVES);
    }
}
