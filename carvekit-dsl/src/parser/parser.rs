//! Parser: builds a [`ContextGraph`] from scanned dump lines.

use super::ast::*;
use crate::lexer::{Line, LineKind, Scanner};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// SCOPE STACK
// ============================================================================

/// An open `PTR_BEGIN` or `STRUCT_BEGIN` region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Pointer(NodeId),
    Struct(NodeId),
}

impl Frame {
    fn id(self) -> NodeId {
        match self {
            Frame::Pointer(id) | Frame::Struct(id) => id,
        }
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Line-by-line decoder for one dump.
#[derive(Debug, Default)]
pub struct Parser {
    graph: ContextGraph,
    scopes: Vec<Frame>,
    /// Slot the next value is written into, per open pointer.
    slot_cursor: HashMap<NodeId, usize>,
    /// Type of the most recent array declaration.
    last_array_type: Option<String>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whole dump. Nothing is returned on failure.
    pub fn parse(mut self, source: &str) -> Result<ContextGraph, ParseError> {
        for line in Scanner::new(source) {
            self.feed(line?)?;
        }
        if !self.scopes.is_empty() {
            tracing::debug!(open_scopes = self.scopes.len(), "dump ended with open scopes");
        }
        Ok(self.graph)
    }

    /// Apply one scanned line.
    pub fn feed(&mut self, line: Line) -> Result<(), ParseError> {
        let at = line.line;
        let produced = match line.kind {
            LineKind::ArrayDecl { ty, name, size } => {
                Some(self.declare_array(ty, name, size, line.reached, at)?)
            }
            LineKind::PointerOffset { ty, base, offset } => {
                Some(self.pointer_offset(ty, base, offset, line.reached))
            }
            LineKind::PtrBegin(name) => {
                let id = self.graph.pointer_id(name).ok_or_else(|| {
                    ParseError::new(at, ParseErrorKind::UndeclaredPointer { name })
                })?;
                self.scopes.push(Frame::Pointer(id));
                None
            }
            LineKind::PtrEnd(name) => {
                self.close_pointer(name, at)?;
                None
            }
            LineKind::PtrIdx(index) => {
                self.select_slot(index, at)?;
                None
            }
            LineKind::StructBegin => {
                let top = self.scopes.last().copied().ok_or_else(|| {
                    mismatch(at, "STRUCT_BEGIN outside of any pointer scope")
                })?;
                let ty = self.graph.node(top.id()).ty().to_string();
                let id = self.graph.push(Node::Struct(StructValue {
                    ty,
                    fields: Vec::new(),
                    reached: line.reached,
                }));
                self.scopes.push(Frame::Struct(id));
                None
            }
            LineKind::StructEnd => match self.scopes.pop() {
                Some(Frame::Struct(id)) => Some(id),
                Some(Frame::Pointer(id)) => {
                    let name = self.pointer_name(id);
                    tracing::debug!(line = at, pointer = name, "STRUCT_END in wrong place");
                    return Err(mismatch(
                        at,
                        &format!("STRUCT_END while p{} is the open scope", name),
                    ));
                }
                None => return Err(mismatch(at, "STRUCT_END with no open scope")),
            },
            LineKind::Primitive { ty, value } => Some(self.graph.push(Node::Primitive(
                PrimitiveValue {
                    ty,
                    value,
                    reached: line.reached,
                },
            ))),
        };

        match produced {
            Some(id) => self.attach(id, at),
            None => Ok(()),
        }
    }

    /// Create the pointer, or merge into an earlier forward reference.
    fn declare_array(
        &mut self,
        ty: String,
        name: u64,
        size: u64,
        reached: bool,
        at: usize,
    ) -> Result<NodeId, ParseError> {
        self.last_array_type = Some(ty.clone());

        let Some(id) = self.graph.pointer_id(name) else {
            return Ok(self.graph.push(Node::Pointer(PointerValue {
                name,
                ty,
                alloc_size: Some(size),
                slots: BTreeMap::new(),
                slot_count: 0,
                reached,
                resolved: false,
            })));
        };

        let existing = self
            .graph
            .pointer_mut(id)
            .ok_or_else(|| mismatch(at, "pointer name bound to a non-pointer node"))?;
        if existing.ty != ty {
            return Err(ParseError::new(
                at,
                ParseErrorKind::ConflictingType {
                    name,
                    declared: ty,
                    existing: existing.ty.clone(),
                },
            ));
        }
        existing.alloc_size = Some(size);
        existing.reached |= reached;
        Ok(id)
    }

    /// `base + offset`. An unseen base gets a placeholder typed after the most
    /// recent array declaration, which may belong to an unrelated pointer.
    fn pointer_offset(&mut self, ty: String, base: u64, offset: i64, reached: bool) -> NodeId {
        let base_id = match self.graph.pointer_id(base) {
            Some(id) => id,
            None => {
                let placeholder_ty = self.last_array_type.clone().unwrap_or(ty);
                tracing::debug!(
                    base,
                    placeholder_type = %placeholder_ty,
                    "synthesizing placeholder base pointer"
                );
                self.graph.push(Node::Pointer(PointerValue {
                    name: base,
                    ty: placeholder_ty,
                    alloc_size: None,
                    slots: BTreeMap::new(),
                    slot_count: 0,
                    reached,
                    resolved: false,
                }))
            }
        };
        let base_ty = self.graph.node(base_id).ty().to_string();
        self.graph.push(Node::PointerOffset(PointerOffsetValue {
            ty: base_ty,
            base: base_id,
            offset,
            reached,
        }))
    }

    fn close_pointer(&mut self, name: u64, at: usize) -> Result<(), ParseError> {
        let expected = self.graph.pointer_id(name);
        match self.scopes.pop() {
            Some(Frame::Pointer(id)) if Some(id) == expected => {
                self.slot_cursor.remove(&id);
                Ok(())
            }
            Some(frame) => {
                let open = match frame {
                    Frame::Pointer(id) => format!("p{}", self.pointer_name(id)),
                    Frame::Struct(_) => "a struct".to_string(),
                };
                Err(mismatch(
                    at,
                    &format!("PTR_END {} while {} is the open scope", name, open),
                ))
            }
            None => Err(mismatch(at, &format!("PTR_END {} with no open scope", name))),
        }
    }

    /// `PTR_IDX`: grow the nearest open pointer and aim the next value at `index`.
    fn select_slot(&mut self, index: usize, at: usize) -> Result<(), ParseError> {
        let id = self
            .scopes
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Pointer(id) => Some(*id),
                Frame::Struct(_) => None,
            })
            .ok_or_else(|| mismatch(at, "PTR_IDX outside of any pointer scope"))?;

        let pointer = self
            .graph
            .pointer_mut(id)
            .ok_or_else(|| mismatch(at, "pointer scope bound to a non-pointer node"))?;
        pointer.slot_count = pointer.slot_count.max(index.saturating_add(1));
        self.slot_cursor.insert(id, index);
        Ok(())
    }

    /// Attach a produced node to the open scope, or to the argument list.
    fn attach(&mut self, id: NodeId, at: usize) -> Result<(), ParseError> {
        match self.scopes.last().copied() {
            None => self.graph.push_arg(id),
            Some(Frame::Struct(sid)) => {
                if let Node::Struct(s) = self.graph.node_mut(sid) {
                    s.fields.push(id);
                }
            }
            Some(Frame::Pointer(pid)) => {
                let name = self.pointer_name(pid);
                let index = self
                    .slot_cursor
                    .get(&pid)
                    .copied()
                    .ok_or_else(|| {
                        ParseError::new(at, ParseErrorKind::MissingIndex { pointer: name })
                    })?;
                if let Some(p) = self.graph.pointer_mut(pid) {
                    p.slots.insert(index, id);
                }
            }
        }
        Ok(())
    }

    fn pointer_name(&self, id: NodeId) -> u64 {
        self.graph.pointer(id).map(|p| p.name).unwrap_or_default()
    }
}

fn mismatch(at: usize, detail: &str) -> ParseError {
    ParseError::new(
        at,
        ParseErrorKind::StructuralMismatch {
            detail: detail.to_string(),
        },
    )
}

/// Parse a dump into its value graph.
pub fn parse(source: &str) -> Result<ContextGraph, ParseError> {
    Parser::new().parse(source)
}

// ============================================================================
// TESTS
// ============================================================================
