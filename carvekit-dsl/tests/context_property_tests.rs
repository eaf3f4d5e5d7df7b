//! Property-Based Tests for the canonical form
//!
//! Properties:
//! - Every top-level argument is printed, touched or not
//! - Pointer child lists keep at most the first and last touched entries
//! - Canonicalization is deterministic
//! - Arbitrary input never panics, and failures point at a real line

use carvekit_dsl::*;
use carvekit_test_utils::generators::*;
use proptest::prelude::*;

/// Lines before the argument/dependent separator.
fn argument_lines(text: &str) -> usize {
    text.split('\n').take_while(|line| !line.is_empty()).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_flat_arity_preserved((dump, count) in arb_flat_dump()) {
        let canonical = canonicalize(&dump).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(argument_lines(&canonical.text), count);
    }

    #[test]
    fn prop_mixed_arity_preserved((dump, shapes) in arb_shaped_dump()) {
        let graph = parse(&dump).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(graph.args().len(), shapes.len());

        let canonical = canonicalize(&dump).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(argument_lines(&canonical.text), shapes.len());
    }

    #[test]
    fn prop_truncation_bound(
        reached in any::<bool>(),
        slots in prop::collection::vec(prop::option::of(any::<bool>()), 0..40),
    ) {
        let dump = render_shapes(&[ArgShape::Buffer { reached, slots: slots.clone() }]);
        let canonical = canonicalize(&dump).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let touched: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot == Some(true))
            .map(|(i, _)| i)
            .collect();
        let kept: Vec<usize> = if touched.len() > 2 {
            vec![touched[0], touched[touched.len() - 1]]
        } else {
            touched
        };

        let mut expected = format!("i8 p0[{}]", slots.len());
        if !kept.is_empty() {
            let entries: Vec<String> = kept.iter().map(|i| format!("{}:{}", i, i)).collect();
            expected.push_str(&format!(" = [{}]", entries.join(", ")));
        }
        prop_assert_eq!(canonical.text, expected);
    }

    #[test]
    fn prop_deterministic((dump, _shapes) in arb_shaped_dump()) {
        let first = canonicalize(&dump).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let second = canonicalize(&dump).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_noise_never_panics(dump in arb_noise_dump()) {
        let physical_lines = dump.split('\n').count().max(1);
        for line in Scanner::new(&dump) {
            if let Err(e) = line {
                prop_assert!(e.line >= 1 && e.line <= physical_lines);
            }
        }
        match canonicalize(&dump) {
            Ok(canonical) => prop_assert_eq!(canonical.hash.len(), 64),
            Err(e) => prop_assert!(e.line >= 1 && e.line <= physical_lines),
        }
    }
}
