//! Reachability over the pointer graph.
//!
//! A pointer counts as reached if its own line was marked, or if any child is
//! reached. Pointer children are resolved first, depth-first, and each pointer
//! is entered exactly once; the entered flag lives on the pointer itself.
//!
//! Pointers are entered in the order the canonical printer visits them:
//! arguments first, then dependents breadth-first as they are discovered. The
//! printer resolves each pointer when it dequeues it, and
//! [`resolve_reachability`] replays that same order without printing.
//!
//! The walk does not iterate to a fixpoint. With `p1 -> p2`, `p2 -> p1, p3`
//! and only `p3` touched, entering at `p2` marks `p2` and `p3` but leaves `p1`
//! unreached: `p1` finished while `p2` was still in progress. Entering at `p1`
//! marks all three, so the result depends on visitation order.

use crate::parser::{ContextGraph, Node, NodeId};
use std::collections::{HashSet, VecDeque};

/// Resolve every pointer reachable from the arguments, in printing order.
pub fn resolve_reachability(graph: &mut ContextGraph) {
    for id in visit_order(graph) {
        resolve_pointer(graph, id);
    }
}

/// Pointers in the order the printer dequeues them for the first time.
/// Discovery follows structure only, never reached flags.
pub fn visit_order(graph: &ContextGraph) -> Vec<NodeId> {
    let mut queue: VecDeque<NodeId> = graph.args().iter().copied().collect();
    let mut processed: HashSet<NodeId> = HashSet::new();
    let mut order = Vec::new();

    while let Some(id) = queue.pop_front() {
        if graph.is_pointer(id) {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
        }
        for dep in graph.dependent_pointers(id) {
            if !processed.contains(&dep) {
                queue.push_back(dep);
            }
        }
    }
    order
}

/// Resolve one pointer and everything below it that was not yet entered.
pub fn resolve_pointer(graph: &mut ContextGraph, root: NodeId) {
    if !graph.mark_resolved(root) {
        return;
    }

    // Explicit stack of (pointer, children, next child) so long chains do not
    // recurse.
    let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = vec![(root, children(graph, root), 0)];
    while let Some(top) = stack.last_mut() {
        let current = top.0;
        match top.1.get(top.2).copied() {
            Some(child) => {
                top.2 += 1;
                if graph.mark_resolved(child) {
                    let below = children(graph, child);
                    stack.push((child, below, 0));
                    continue;
                }
                let merged = graph.reached(current) || graph.reached(child);
                graph.set_reached(current, merged);
            }
            None => {
                stack.pop();
                if let Some((parent, _, _)) = stack.last() {
                    let parent = *parent;
                    let merged = graph.reached(parent) || graph.reached(current);
                    graph.set_reached(parent, merged);
                }
            }
        }
    }
}

fn children(graph: &ContextGraph, id: NodeId) -> Vec<NodeId> {
    match graph.node(id) {
        Node::Pointer(p) => p.slots.values().copied().collect(),
        _ => Vec::new(),
    }
}
