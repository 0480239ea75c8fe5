//! Arena-backed syntax tree.
//!
//! Every syntactic construct is one [`Node`]: a kind tag, an ordered child
//! list, and optional payload slots (resolved type, resolved symbol, literal
//! value). Nodes reference each other by [`NodeId`] into the arena, so the
//! rewriter can fold, splice, and delete freely without fighting ownership.
//! Detached nodes simply become unreachable from the root; the arena is
//! dropped in bulk with its compilation.

use glisten_common::ids::{NodeId, SymbolId};
use glisten_common::source::Range;
use glisten_common::ty::{Literal, Type};

use crate::symbol::SymbolFlags;

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a compilation: children are top-level declarations.
    Global,
    /// Absent optional slot (`for(;;)` pieces, missing initializers).
    Empty,

    // ── Statements ─────────────────────────────────────────────────────
    /// `{ ... }`. Children are statements.
    Block,
    /// Expression statement. One child.
    ExpressionStmt,
    /// `if (a) b else c`. Children: condition, then, optional else.
    If,
    /// `for (init; test; update) body`. Exactly four children, absent
    /// pieces are `Empty`.
    For,
    /// `while (test) body`. Children: test, body.
    While,
    /// `do body while (test);`. Children: body, test.
    DoWhile,
    /// `return;` or `return e;`. Zero or one child.
    Return,
    Discard,
    Continue,
    Break,
    /// One declaration statement; children are `Variable` declarators.
    Variables,
    /// One declarator. Children: array size (or `Empty`), initializer
    /// (or `Empty`). Carries the declared symbol.
    Variable,
    /// Function prototype or definition. Children: parameter `Variable`
    /// nodes, then a trailing `Block` iff this is a definition.
    Function,
    /// `struct S { ... };`. Children are field `Variables`. Carries the
    /// struct symbol.
    StructDef,
    /// `precision mediump float;`. Precision lives in `qualifier`, the
    /// type in `ty`.
    Precision,
    /// `#version N`; the literal slot holds the verbatim line.
    Version,
    /// `#extension name : behavior`; verbatim in the literal slot.
    Extension,
    /// Any other `#pragma`, preserved verbatim in the literal slot.
    Pragma,
    /// `uniform { ... }` and friends: a qualifier applied to a group of
    /// declarations. Dissolved by the rewriter.
    ModifierBlock,

    // ── Expressions: leaves ────────────────────────────────────────────
    BoolLiteral,
    IntLiteral,
    FloatLiteral,
    /// An identifier reference, or a type name in constructor position
    /// (then `ty` is set instead of `symbol`).
    Name,

    // ── Expressions: compound ──────────────────────────────────────────
    /// Children: callee, then arguments.
    Call,
    /// Field access or swizzle. One child (the object); the member name
    /// is in the literal slot, a resolved struct field in `symbol`.
    Dot,
    /// Children: object, index.
    Index,
    /// `a ? b : c`.
    Hook,
    /// Comma expression; two or more children.
    Sequence,

    // ── Expressions: unary prefix ──────────────────────────────────────
    Negative,
    Positive,
    Not,
    BitNot,
    PrefixIncrement,
    PrefixDecrement,

    // ── Expressions: unary postfix ─────────────────────────────────────
    PostfixIncrement,
    PostfixDecrement,

    // ── Expressions: binary ────────────────────────────────────────────
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    ShiftLeft,
    ShiftRight,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalXor,
    LogicalOr,

    // ── Expressions: assignment ────────────────────────────────────────
    Assign,
    AssignAdd,
    AssignSubtract,
    AssignMultiply,
    AssignDivide,
    AssignRemainder,
    AssignShiftLeft,
    AssignShiftRight,
    AssignBitAnd,
    AssignBitXor,
    AssignBitOr,
}

impl NodeKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            NodeKind::BoolLiteral | NodeKind::IntLiteral | NodeKind::FloatLiteral
        )
    }

    pub fn is_unary_prefix(self) -> bool {
        matches!(
            self,
            NodeKind::Negative
                | NodeKind::Positive
                | NodeKind::Not
                | NodeKind::BitNot
                | NodeKind::PrefixIncrement
                | NodeKind::PrefixDecrement
        )
    }

    pub fn is_unary_postfix(self) -> bool {
        matches!(self, NodeKind::PostfixIncrement | NodeKind::PostfixDecrement)
    }

    pub fn is_binary(self) -> bool {
        matches!(
            self,
            NodeKind::Add
                | NodeKind::Subtract
                | NodeKind::Multiply
                | NodeKind::Divide
                | NodeKind::Remainder
                | NodeKind::ShiftLeft
                | NodeKind::ShiftRight
                | NodeKind::LessThan
                | NodeKind::GreaterThan
                | NodeKind::LessThanEqual
                | NodeKind::GreaterThanEqual
                | NodeKind::Equal
                | NodeKind::NotEqual
                | NodeKind::BitAnd
                | NodeKind::BitXor
                | NodeKind::BitOr
                | NodeKind::LogicalAnd
                | NodeKind::LogicalXor
                | NodeKind::LogicalOr
        )
    }

    pub fn is_assign(self) -> bool {
        matches!(
            self,
            NodeKind::Assign
                | NodeKind::AssignAdd
                | NodeKind::AssignSubtract
                | NodeKind::AssignMultiply
                | NodeKind::AssignDivide
                | NodeKind::AssignRemainder
                | NodeKind::AssignShiftLeft
                | NodeKind::AssignShiftRight
                | NodeKind::AssignBitAnd
                | NodeKind::AssignBitXor
                | NodeKind::AssignBitOr
        )
    }

    pub fn is_expression(self) -> bool {
        self.is_literal()
            || self.is_unary_prefix()
            || self.is_unary_postfix()
            || self.is_binary()
            || self.is_assign()
            || matches!(
                self,
                NodeKind::Name
                    | NodeKind::Call
                    | NodeKind::Dot
                    | NodeKind::Index
                    | NodeKind::Hook
                    | NodeKind::Sequence
            )
    }

    /// The underlying binary operator of a compound assignment.
    pub fn assign_operator(self) -> Option<NodeKind> {
        Some(match self {
            NodeKind::AssignAdd => NodeKind::Add,
            NodeKind::AssignSubtract => NodeKind::Subtract,
            NodeKind::AssignMultiply => NodeKind::Multiply,
            NodeKind::AssignDivide => NodeKind::Divide,
            NodeKind::AssignRemainder => NodeKind::Remainder,
            NodeKind::AssignShiftLeft => NodeKind::ShiftLeft,
            NodeKind::AssignShiftRight => NodeKind::ShiftRight,
            NodeKind::AssignBitAnd => NodeKind::BitAnd,
            NodeKind::AssignBitXor => NodeKind::BitXor,
            NodeKind::AssignBitOr => NodeKind::BitOr,
            _ => return None,
        })
    }

    /// Operator spelling for emission, for every unary, binary, and
    /// assignment kind.
    pub fn operator_text(self) -> Option<&'static str> {
        Some(match self {
            NodeKind::Negative => "-",
            NodeKind::Positive => "+",
            NodeKind::Not => "!",
            NodeKind::BitNot => "~",
            NodeKind::PrefixIncrement | NodeKind::PostfixIncrement => "++",
            NodeKind::PrefixDecrement | NodeKind::PostfixDecrement => "--",
            NodeKind::Add => "+",
            NodeKind::Subtract => "-",
            NodeKind::Multiply => "*",
            NodeKind::Divide => "/",
            NodeKind::Remainder => "%",
            NodeKind::ShiftLeft => "<<",
            NodeKind::ShiftRight => ">>",
            NodeKind::LessThan => "<",
            NodeKind::GreaterThan => ">",
            NodeKind::LessThanEqual => "<=",
            NodeKind::GreaterThanEqual => ">=",
            NodeKind::Equal => "==",
            NodeKind::NotEqual => "!=",
            NodeKind::BitAnd => "&",
            NodeKind::BitXor => "^",
            NodeKind::BitOr => "|",
            NodeKind::LogicalAnd => "&&",
            NodeKind::LogicalXor => "^^",
            NodeKind::LogicalOr => "||",
            NodeKind::Assign => "=",
            NodeKind::AssignAdd => "+=",
            NodeKind::AssignSubtract => "-=",
            NodeKind::AssignMultiply => "*=",
            NodeKind::AssignDivide => "/=",
            NodeKind::AssignRemainder => "%=",
            NodeKind::AssignShiftLeft => "<<=",
            NodeKind::AssignShiftRight => ">>=",
            NodeKind::AssignBitAnd => "&=",
            NodeKind::AssignBitXor => "^=",
            NodeKind::AssignBitOr => "|=",
            _ => return None,
        })
    }
}

/// One syntax tree node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub range: Range,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Resolved symbol: declarations carry the declared symbol, `Name`
    /// carries its referent iff resolution succeeded, `Dot` a struct field.
    pub symbol: Option<SymbolId>,
    /// Resolved type. Set on expressions by the checker; also set on a
    /// `Name` in constructor position and on `Precision`.
    pub ty: Option<Type>,
    /// Literal payload: literal values, member names, verbatim directives.
    pub literal: Option<Literal>,
    /// Qualifier bits for `Precision` and `ModifierBlock` nodes.
    pub qualifier: SymbolFlags,
    /// Whether control can flow past the end of this statement. Written
    /// by the control-flow analyzer.
    pub has_control_flow_at_end: bool,
}

/// The node arena. Cloned wholesale to produce per-export trees for the
/// rewriter; node ids stay stable across the clone.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node with no parent and no children.
    pub fn add(&mut self, kind: NodeKind, range: Range) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            range,
            parent: None,
            children: Vec::new(),
            symbol: None,
            ty: None,
            literal: None,
            qualifier: SymbolFlags::empty(),
            has_control_flow_at_end: false,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `child` to `parent`, keeping the parent back-reference
    /// consistent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.push(child);
    }

    /// Insert `child` at `index` in `parent`'s child list.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[child.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.insert(index, child);
    }

    /// Replace the full child list of `parent`.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.nodes[child.0 as usize].parent = Some(parent);
        }
        self.nodes[parent.0 as usize].children = children;
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0 as usize].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> NodeId {
        self.nodes[id.0 as usize].children[index]
    }

    /// Replace the child at `index`, returning the detached node.
    pub fn replace_child_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> NodeId {
        self.nodes[child.0 as usize].parent = Some(parent);
        let old = std::mem::replace(&mut self.nodes[parent.0 as usize].children[index], child);
        self.nodes[old.0 as usize].parent = None;
        old
    }

    /// Remove the child at `index`, returning the detached node.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> NodeId {
        let old = self.nodes[parent.0 as usize].children.remove(index);
        self.nodes[old.0 as usize].parent = None;
        old
    }

    /// Turn an existing node into a literal leaf in place, preserving its
    /// range and parent. Used by constant folding.
    pub fn replace_with_literal(&mut self, id: NodeId, kind: NodeKind, literal: Literal, ty: Type) {
        let node = &mut self.nodes[id.0 as usize];
        node.kind = kind;
        node.children.clear();
        node.symbol = None;
        node.literal = Some(literal);
        node.ty = Some(ty);
    }

    /// Visit `id` and every node below it, pre-order.
    pub fn visit(&self, id: NodeId, f: &mut impl FnMut(NodeId)) {
        f(id);
        // Children are cloned to a small buffer so the callback may read
        // the arena freely.
        let children = self.nodes[id.0 as usize].children.clone();
        for child in children {
            self.visit(child, f);
        }
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }
}

impl std::ops::IndexMut<NodeId> for Ast {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }
}
