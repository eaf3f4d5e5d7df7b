//! Canonical printer for a [`ContextGraph`].
//!
//! Output is the argument expressions in order, a blank separator line, then
//! every reached dependent pointer in breadth-first discovery order. Pointer
//! child lists are cut to their first and last reached entries.
//!
//! Each pointer is resolved when it is first dequeued, just before it is
//! printed. A pointer nested in a struct field is therefore still unresolved
//! while its enclosing pointer is printed, unless its own line was marked.

use crate::parser::*;
use crate::resolver::resolve_pointer;
use std::collections::{HashSet, VecDeque};

/// Reached children kept per pointer before truncation applies.
pub const MAX_POINTER_ENTRIES: usize = 2;

/// Render the canonical form, resolving pointers as they are visited.
/// Pointers resolved beforehand keep the flags they already have.
pub fn canonical_form(graph: &mut ContextGraph) -> String {
    // `None` separates the arguments from their dependents.
    let mut queue: VecDeque<Option<NodeId>> = graph.args().iter().copied().map(Some).collect();
    queue.push_back(None);

    let mut processed: HashSet<NodeId> = HashSet::new();
    let mut past_args = false;
    let mut lines: Vec<String> = Vec::new();

    while let Some(entry) = queue.pop_front() {
        let Some(id) = entry else {
            past_args = true;
            lines.push(String::new());
            continue;
        };

        if graph.is_pointer(id) {
            if !processed.insert(id) {
                continue;
            }
            resolve_pointer(graph, id);
        }

        if !past_args || graph.reached(id) {
            lines.push(expression_form(graph, id));
        }

        for dep in graph.dependent_pointers(id) {
            if !processed.contains(&dep) {
                queue.push_back(Some(dep));
            }
        }
    }

    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Full form of a node, used for whole output lines.
pub fn expression_form(graph: &ContextGraph, id: NodeId) -> String {
    match graph.node(id) {
        Node::Primitive(p) => format!("{} {}", p.ty, p.value),
        Node::Pointer(p) => {
            let entries = pointer_entries(graph, p);
            if entries.is_empty() {
                format!("{} p{}[{}]", p.ty, p.name, p.declared_len())
            } else {
                format!(
                    "{} p{}[{}] = [{}]",
                    p.ty,
                    p.name,
                    p.declared_len(),
                    entries.join(", ")
                )
            }
        }
        Node::Struct(s) => format!("{} {}", s.ty, value_form(graph, id)),
        Node::PointerOffset(_) => value_form(graph, id),
    }
}

/// Compact form of a node, used inside pointer and struct child lists.
pub fn value_form(graph: &ContextGraph, id: NodeId) -> String {
    match graph.node(id) {
        Node::Primitive(p) => p.value.clone(),
        Node::Pointer(p) => format!("p{}", p.name),
        Node::Struct(s) => {
            let fields: Vec<String> = s
                .fields
                .iter()
                .enumerate()
                .filter(|(_, field)| graph.reached(**field))
                .map(|(i, field)| format!("{}:{}", i, value_form(graph, *field)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        Node::PointerOffset(o) => {
            let base = graph.pointer(o.base).map(|p| p.name).unwrap_or_default();
            format!("p{}+{}", base, o.offset)
        }
    }
}

/// Reached slots as `index:value`, truncated to first and last.
fn pointer_entries(graph: &ContextGraph, pointer: &PointerValue) -> Vec<String> {
    let mut entries: Vec<String> = pointer
        .slots
        .iter()
        .filter(|(_, child)| graph.reached(**child))
        .map(|(i, child)| format!("{}:{}", i, value_form(graph, *child)))
        .collect();

    if entries.len() > MAX_POINTER_ENTRIES {
        let last = entries.swap_remove(entries.len() - 1);
        entries.truncate(1);
        entries.push(last);
    }
    entries
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_reachability;

    fn render(source: &str) -> Result<String, ParseError> {
        let mut graph = parse(source)?;
        Ok(canonical_form(&mut graph))
    }

    #[test]
    fn test_top_level_primitives_always_emitted() -> Result<(), ParseError> {
        assert_eq!(render("% i32 5\n  i32 ?\n")?, "i32 5\ni32 unknown");
        Ok(())
    }

    #[test]
    fn test_pointer_hole_is_omitted() -> Result<(), ParseError> {
        let source = "\
% i32 p0[3]
  PTR_BEGIN 0
  PTR_IDX 0
% i32 7
  PTR_IDX 2
% i32 9
  PTR_END 0
";
        assert_eq!(render(source)?, "i32 p0[3] = [0:7, 2:9]");
        Ok(())
    }

    #[test]
    fn test_truncation_keeps_first_and_last() -> Result<(), ParseError> {
        let source = "\
% i8 p0[5]
  PTR_BEGIN 0
  PTR_IDX 0
% i8 10
  PTR_IDX 1
% i8 11
  PTR_IDX 2
  i8 12
  PTR_IDX 3
% i8 13
  PTR_IDX 4
  i8 14
  PTR_END 0
";
        assert_eq!(render(source)?, "i8 p0[5] = [0:10, 3:13]");
        Ok(())
    }

    #[test]
    fn test_dependents_follow_separator() -> Result<(), ParseError> {
        let source = "\
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
        assert_eq!(
            render(source)?,
            "node p0[1] = [0:{0:3, 1:p1}]\ni64 9\n\ni8 p1[2] = [1:65]"
        );
        Ok(())
    }

    #[test]
    fn test_unreached_dependents_dropped() -> Result<(), ParseError> {
        let source = "\
  i8 p0[1]
  PTR_BEGIN 0
  PTR_IDX 0
  i8 p1[1]
  PTR_END 0
";
        // p0 is an argument and is emitted; p1 is an unreached dependent.
        assert_eq!(render(source)?, "i8 p0[1]");
        Ok(())
    }

    #[test]
    fn test_offset_never_inlines_base() -> Result<(), ParseError> {
        let source = "\
% i8 p4[2]
  PTR_BEGIN 4
  PTR_IDX 1
% i8 1
  PTR_END 4
% i8 *p4+1
";
        // p4 is itself an argument, so it is not repeated as a dependent.
        assert_eq!(render(source)?, "i8 p4[2] = [1:1]\np4+1");
        Ok(())
    }

    #[test]
    fn test_offset_base_enqueued_as_dependent() -> Result<(), ParseError> {
        let source = "\
% i8 p0[1]
  PTR_BEGIN 0
  PTR_IDX 0
% i8 p2[1]
  PTR_BEGIN 2
  PTR_IDX 0
% i8 5
  PTR_END 2
  PTR_END 0
% i8 *p2+3
";
        assert_eq!(
            render(source)?,
            "i8 p0[1] = [0:p2]\np2+3\n\ni8 p2[1] = [0:5]"
        );
        Ok(())
    }

    #[test]
    fn test_forward_referenced_argument_keeps_position() -> Result<(), ParseError> {
        let source = "\
% i8 p0[1]
% i8 *p2+3
% i8 p2[1]
  PTR_BEGIN 2
  PTR_IDX 0
% i8 5
  PTR_END 2
";
        // The offset enqueues p2 behind the separator, but p2 is also the
        // third argument and is printed there first.
        assert_eq!(render(source)?, "i8 p0[1]\np2+3\ni8 p2[1] = [0:5]");
        Ok(())
    }

    #[test]
    fn test_shared_pointer_printed_once() -> Result<(), ParseError> {
        let source = "\
% i8 p9[1]
  PTR_BEGIN 9
  PTR_IDX 0
% i8 1
  PTR_END 9
% i8 p0[2]
  PTR_BEGIN 0
  PTR_IDX 0
% i8 p9[1]
  PTR_IDX 1
% i8 p9[1]
  PTR_END 0
";
        assert_eq!(
            render(source)?,
            "i8 p9[1] = [0:1]\ni8 p0[2] = [0:p9, 1:p9]"
        );
        Ok(())
    }

    #[test]
    fn test_empty_dump() -> Result<(), ParseError> {
        assert_eq!(render("")?, "");
        Ok(())
    }

    #[test]
    fn test_deterministic() -> Result<(), ParseError> {
        let source = "\
% i8 p0[2]
  PTR_BEGIN 0
  PTR_IDX 0
% i8 p1[1]
  PTR_IDX 1
% i8 p2[1]
  PTR_END 0
";
        let mut graph = parse(source)?;
        let first = canonical_form(&mut graph);
        assert_eq!(first, canonical_form(&mut graph));
        Ok(())
    }

    const STRUCT_FIELD_POINTER: &str = "\
  %struct.node p0[1]
  PTR_BEGIN 0
  PTR_IDX 0
% STRUCT_BEGIN
% i32 3
  i8 p1[1]
  PTR_BEGIN 1
  PTR_IDX 0
% i8 65
  PTR_END 1
  STRUCT_END
  PTR_END 0
";

    #[test]
    fn test_struct_field_pointer_resolved_after_its_parent_prints() -> Result<(), ParseError> {
        // p1 only becomes reached when it is dequeued, after p0's line.
        assert_eq!(
            render(STRUCT_FIELD_POINTER)?,
            "node p0[1] = [0:{0:3}]\n\ni8 p1[1] = [0:65]"
        );
        Ok(())
    }

    #[test]
    fn test_pre_resolved_graph_prints_current_flags() -> Result<(), ParseError> {
        let mut graph = parse(STRUCT_FIELD_POINTER)?;
        resolve_reachability(&mut graph);
        assert_eq!(
            canonical_form(&mut graph),
            "node p0[1] = [0:{0:3, 1:p1}]\n\ni8 p1[1] = [0:65]"
        );
        Ok(())
    }

    #[test]
    fn test_untouched_array_renders_declared_size() -> Result<(), ParseError> {
        assert_eq!(render("  i8 p0[16]\n")?, "i8 p0[16]");
        Ok(())
    }
}
