use serde::Serialize;

/// Index of a syntax tree node within its arena.
///
/// Nodes reference each other (parent links, child lists) by id rather than
/// by pointer, so the tree can be mutated freely by the rewriter without an
/// ownership cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub u32);

/// Index of a symbol within the per-compilation symbol arena.
///
/// Symbol ids are issued monotonically by one compilation; ids from two
/// different compilations are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

/// Index of a lexical scope within the per-compilation scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(pub u32);
