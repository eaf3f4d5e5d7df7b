//! Integration tests for the canonicalize pipeline
//!
//! Tests verify:
//! - Canonical output for the documented dump shapes
//! - Fatal structural errors carry the offending line
//! - Forward references resolve to one pointer node
//! - Conversion of parse failures into `CarveError`

use carvekit_core::CarveError;
use carvekit_dsl::*;
use carvekit_test_utils::assertions::{assert_context_error, assert_hex_digest};
use carvekit_test_utils::fixtures::*;
use carvekit_test_utils::DumpBuilder;

// ============================================================================
// CANONICAL OUTPUT
// ============================================================================

#[test]
fn test_two_primitives() -> Result<(), ParseError> {
    let canonical = canonicalize(TWO_PRIMITIVES)?;
    assert_eq!(canonical.text, "i32 5\ni32 unknown");
    assert_hex_digest(&canonical.hash);
    Ok(())
}

#[test]
fn test_holed_pointer() -> Result<(), ParseError> {
    assert_eq!(canonicalize(HOLED_POINTER)?.text, "i32 p0[3] = [0:7, 2:9]");
    Ok(())
}

#[test]
fn test_nested_struct_with_dependent() -> Result<(), ParseError> {
    assert_eq!(
        canonicalize(NESTED_STRUCT)?.text,
        "node p0[1] = [0:{0:3, 1:p1}]\ni64 9\n\ni8 p1[2] = [1:65]"
    );
    Ok(())
}

#[test]
fn test_reached_through_dependent_chain() -> Result<(), ParseError> {
    // p0 -> p1 -> p2, only p2's element touched: every link is printed.
    let source = DumpBuilder::new()
        .array(false, "i8", 0, 1)
        .begin(0)
        .index(0)
        .array(false, "i8", 1, 1)
        .begin(1)
        .index(0)
        .array(false, "i8", 2, 4)
        .begin(2)
        .index(3)
        .primitive(true, "i8", "127")
        .end(2)
        .end(1)
        .end(0)
        .build();
    assert_eq!(
        canonicalize(&source)?.text,
        "i8 p0[1] = [0:p1]\n\ni8 p1[1] = [0:p2]\ni8 p2[4] = [3:127]"
    );
    Ok(())
}

#[test]
fn test_untouched_buffer_contents_do_not_change_hash() -> Result<(), ParseError> {
    let dump = |filler: &str| {
        DumpBuilder::new()
            .array(true, "i8", 0, 3)
            .begin(0)
            .index(0)
            .primitive(true, "i8", "1")
            .index(1)
            .primitive(false, "i8", filler)
            .end(0)
            .build()
    };
    let a = canonicalize(&dump("0"))?;
    let b = canonicalize(&dump("99"))?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn test_touched_values_change_hash() -> Result<(), ParseError> {
    let a = canonicalize("% i32 5\n")?;
    let b = canonicalize("% i32 6\n")?;
    assert_ne!(a.hash, b.hash);
    Ok(())
}

#[test]
fn test_aggregate_prefixes_are_stripped() -> Result<(), ParseError> {
    let source = "\
  class.Widget p0[1]
  union.U p1[2]
  struct.S p2[0]
";
    assert_eq!(
        canonicalize(source)?.text,
        "Widget p0[1]\nU p1[2]\nS p2[0]"
    );
    Ok(())
}

#[test]
fn test_function_pointer_and_float() -> Result<(), ParseError> {
    let source = "% func png_error\n  f64 0.5\n";
    assert_eq!(canonicalize(source)?.text, "func png_error\nf64 0.5");
    Ok(())
}

// ============================================================================
// FORWARD REFERENCES
// ============================================================================

#[test]
fn test_forward_reference_single_identity() -> Result<(), ParseError> {
    let source = "\
% i8 *p3+2
  i8 p3[4]
  PTR_BEGIN 3
  PTR_IDX 1
% i8 4
  PTR_END 3
";
    let mut graph = parse(source)?;
    let via_offset = match graph.node(graph.args()[0]) {
        Node::PointerOffset(o) => o.base,
        other => panic!("expected offset, got {:?}", other),
    };
    let via_declaration = graph.args()[1];
    assert_eq!(via_offset, via_declaration);
    assert_eq!(graph.pointer_id(3), Some(via_declaration));

    assert_eq!(canonical_form(&mut graph), "p3+2\ni8 p3[4] = [1:4]");
    Ok(())
}

#[test]
fn test_cycle_entered_from_first_pointer_argument() -> Result<(), ParseError> {
    // The offset creates p2 before p1 is declared. p1 is still the first
    // pointer argument, so the p1 -> p2 -> p1 cycle is entered at p1 and
    // p2 keeps its back edge once p3 is found touched.
    let source = "\
  i8 p9[0]
  i8 *p2+0
  i8 p1[1]
  PTR_BEGIN 1
  PTR_IDX 0
  i8 p2[2]
  PTR_BEGIN 2
  PTR_IDX 0
  i8 p1[1]
  PTR_IDX 1
  i8 p3[1]
  PTR_BEGIN 3
  PTR_IDX 0
% i8 7
  PTR_END 3
  PTR_END 2
  PTR_END 1
";
    assert_eq!(
        canonicalize(source)?.text,
        "i8 p9[0]\np2+0\ni8 p1[1] = [0:p2]\n\ni8 p2[2] = [0:p1, 1:p3]\ni8 p3[1] = [0:7]"
    );
    Ok(())
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_struct_end_mismatch_is_fatal() {
    let err = canonicalize(STRUCT_END_MISMATCH).unwrap_err();
    assert_eq!(err.line, 4);
    assert!(matches!(err.kind, ParseErrorKind::StructuralMismatch { .. }));
}

#[test]
fn test_unknown_prefix() {
    let err = canonicalize("% i32 1\n  enum.E p0[1]\n").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(matches!(err.kind, ParseErrorKind::UnknownTypePrefix { .. }));
}

#[test]
fn test_unknown_expression() {
    let err = canonicalize("% i32 1\n\n% bool true\n").unwrap_err();
    // Blank lines still count toward the reported line.
    assert_eq!(err.line, 3);
    assert!(matches!(err.kind, ParseErrorKind::UnknownExpression { .. }));
}

#[test]
fn test_missing_index() {
    let source = DumpBuilder::new()
        .array(true, "i32", 0, 2)
        .begin(0)
        .primitive(true, "i32", "1")
        .build();
    let err = canonicalize(&source).unwrap_err();
    assert_eq!(err, ParseError::new(3, ParseErrorKind::MissingIndex { pointer: 0 }));
}

#[test]
fn test_failure_converts_to_context_error() {
    let result: Result<CanonicalContext, CarveError> =
        canonicalize(STRUCT_END_MISMATCH).map_err(CarveError::from);
    assert_context_error(&result, 4);
}
