//! Value graph for one carved call context.
//!
//! Nodes live in an arena owned by [`ContextGraph`] and refer to each other by
//! [`NodeId`]. Pointer identities from the dump (`p<N>`) map to a single arena
//! slot, so a forward reference that is later declared is updated in place.

use carvekit_core::CarveError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

// ============================================================================
// VALUE GRAPH
// ============================================================================

/// Index of a node in its [`ContextGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Scalar leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveValue {
    pub ty: String,
    /// Captured value, or `unknown` when capture failed.
    pub value: String,
    pub reached: bool,
}

/// Pointer or array, identified by `name` within one dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerValue {
    pub name: u64,
    pub ty: String,
    /// Declared element count; `None` until the declaring line is seen.
    pub alloc_size: Option<u64>,
    /// Filled child slots by index. Missing indices are holes.
    pub slots: BTreeMap<usize, NodeId>,
    /// Slots opened by `PTR_IDX` so far, holes included.
    pub slot_count: usize,
    pub reached: bool,
    /// Set once the resolver has entered this pointer.
    #[serde(default)]
    pub resolved: bool,
}

impl PointerValue {
    /// Length rendered in canonical form.
    pub fn declared_len(&self) -> u64 {
        self.alloc_size.unwrap_or(self.slot_count as u64)
    }
}

/// Aggregate with positional, unnamed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructValue {
    pub ty: String,
    pub fields: Vec<NodeId>,
    pub reached: bool,
}

/// `base + offset`. The base is referenced, never owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerOffsetValue {
    pub ty: String,
    pub base: NodeId,
    pub offset: i64,
    pub reached: bool,
}

/// A node of the value graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Primitive(PrimitiveValue),
    Pointer(PointerValue),
    Struct(StructValue),
    PointerOffset(PointerOffsetValue),
}

impl Node {
    pub fn reached(&self) -> bool {
        match self {
            Node::Primitive(v) => v.reached,
            Node::Pointer(v) => v.reached,
            Node::Struct(v) => v.reached,
            Node::PointerOffset(v) => v.reached,
        }
    }

    pub fn ty(&self) -> &str {
        match self {
            Node::Primitive(v) => &v.ty,
            Node::Pointer(v) => &v.ty,
            Node::Struct(v) => &v.ty,
            Node::PointerOffset(v) => &v.ty,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerValue> {
        match self {
            Node::Pointer(p) => Some(p),
            _ => None,
        }
    }
}

/// Arena of nodes plus the ordered top-level argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextGraph {
    nodes: Vec<Node>,
    /// Top-level argument nodes, in declaration order.
    args: Vec<NodeId>,
    /// Pointer name -> arena slot.
    pointers: HashMap<u64, NodeId>,
}

impl ContextGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Node::Pointer(p) = &node {
            self.pointers.insert(p.name, id);
        }
        self.nodes.push(node);
        id
    }

    pub fn push_arg(&mut self, id: NodeId) {
        self.args.push(id);
    }

    pub fn args(&self) -> &[NodeId] {
        &self.args
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Arena slot of the pointer named `name`, if it has been seen.
    pub fn pointer_id(&self, name: u64) -> Option<NodeId> {
        self.pointers.get(&name).copied()
    }

    pub fn pointer(&self, id: NodeId) -> Option<&PointerValue> {
        self.node(id).as_pointer()
    }

    pub fn pointer_mut(&mut self, id: NodeId) -> Option<&mut PointerValue> {
        match self.node_mut(id) {
            Node::Pointer(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_pointer(&self, id: NodeId) -> bool {
        matches!(self.node(id), Node::Pointer(_))
    }

    pub fn reached(&self, id: NodeId) -> bool {
        self.node(id).reached()
    }

    pub fn set_reached(&mut self, id: NodeId, reached: bool) {
        match self.node_mut(id) {
            Node::Primitive(v) => v.reached = reached,
            Node::Pointer(v) => v.reached = reached,
            Node::Struct(v) => v.reached = reached,
            Node::PointerOffset(v) => v.reached = reached,
        }
    }

    /// Flag `id` as entered by the resolver. Returns `false` for non-pointers
    /// and for pointers that were already entered.
    pub fn mark_resolved(&mut self, id: NodeId) -> bool {
        match self.pointer_mut(id) {
            Some(p) if !p.resolved => {
                p.resolved = true;
                true
            }
            _ => false,
        }
    }

    /// Pointers one hop below `id`: pointer children directly, struct children
    /// recursively, and the base of an offset value.
    pub fn dependent_pointers(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_dependents(id, &mut out);
        out
    }

    fn collect_dependents(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.node(id) {
            Node::Primitive(_) => {}
            Node::PointerOffset(v) => out.push(v.base),
            Node::Pointer(p) => {
                for child in p.slots.values() {
                    self.collect_child(*child, out);
                }
            }
            Node::Struct(s) => {
                for child in &s.fields {
                    self.collect_child(*child, out);
                }
            }
        }
    }

    fn collect_child(&self, child: NodeId, out: &mut Vec<NodeId>) {
        if self.is_pointer(child) {
            out.push(child);
        } else {
            self.collect_dependents(child, out);
        }
    }
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Failure category for a rejected dump.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseErrorKind {
    #[error("unknown type prefix: {prefix}")]
    UnknownTypePrefix { prefix: String },

    #[error("unknown expression: {expr}")]
    UnknownExpression { expr: String },

    #[error("structural mismatch: {detail}")]
    StructuralMismatch { detail: String },

    #[error("PTR_IDX not found for p{pointer}")]
    MissingIndex { pointer: u64 },

    #[error("pointer p{name} used before its declaration")]
    UndeclaredPointer { name: u64 },

    #[error("pointer p{name} declared as {declared} but previously referenced as {existing}")]
    ConflictingType {
        name: u64,
        declared: String,
        existing: String,
    },

    #[error("malformed number: {text:?}")]
    MalformedNumber { text: String },
}

/// Parse error with the offending line.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Parse error at line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line in the dump text.
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

impl From<ParseError> for CarveError {
    fn from(err: ParseError) -> Self {
        CarveError::Context {
            line: err.line,
            reason: err.kind.to_string(),
        }
    }
}
