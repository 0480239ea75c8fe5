//! Symbols: variables, functions (possibly overloaded), and structs.
//!
//! Symbols are created by the parser at declaration sites and live in a
//! per-compilation arena. The resolver reads them, the rewriter flips
//! reachability flags, and the renamer writes `new_name`; nothing outside
//! the compilation owns one.

use bitflags::bitflags;

use glisten_common::ids::{NodeId, ScopeId, SymbolId};
use glisten_common::ty::Type;

bitflags! {
    /// Qualifier and lifecycle flags on a symbol.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SymbolFlags: u32 {
        /// Marked with the non-standard `export` keyword: an entry point.
        const EXPORTED = 1 << 0;
        /// Marked `import`: the name is taken verbatim from a host.
        const IMPORTED = 1 << 1;
        /// Belongs to the synthesized built-in API source. Never renamed,
        /// never rewritten, never emitted.
        const NATIVE = 1 << 2;
        /// Reachability marker written by the rewriter, per export.
        const USED = 1 << 3;
        const CONST = 1 << 4;
        const UNIFORM = 1 << 5;
        const ATTRIBUTE = 1 << 6;
        const VARYING = 1 << 7;
        const IN = 1 << 8;
        const OUT = 1 << 9;
        const INOUT = 1 << 10;
        const HIGHP = 1 << 11;
        const MEDIUMP = 1 << 12;
        const LOWP = 1 << 13;
        const INVARIANT = 1 << 14;
    }
}

impl SymbolFlags {
    /// The parameter-passing qualifiers.
    pub fn parameter_direction(self) -> SymbolFlags {
        self & (SymbolFlags::IN | SymbolFlags::OUT | SymbolFlags::INOUT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Struct,
}

/// One named entity. Function symbols additionally use `parameters`,
/// `sibling` (prototype <-> definition; both share a renamed name), and
/// `overload` (next symbol in the overload chain). Struct symbols use
/// `fields`.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub flags: SymbolFlags,
    pub scope: ScopeId,
    /// The declaring node.
    pub node: NodeId,
    /// Variable type, function return type, or the struct's own type.
    pub ty: Type,
    /// `None` = not an array; `Some(None)` = unsized; `Some(Some(n))` = sized.
    pub array_size: Option<Option<u32>>,
    pub parameters: Vec<SymbolId>,
    pub sibling: Option<SymbolId>,
    pub overload: Option<SymbolId>,
    pub fields: Vec<SymbolId>,
    /// Assigned by the renamer; `None` means the name is unchanged.
    pub new_name: Option<String>,
    /// Reference count across all per-export trees, for rename ordering.
    pub use_count: u32,
}

impl Symbol {
    /// The name this symbol is emitted under.
    pub fn output_name(&self) -> &str {
        self.new_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    pub fn is_struct(&self) -> bool {
        self.kind == SymbolKind::Struct
    }

    pub fn is_native(&self) -> bool {
        self.flags.contains(SymbolFlags::NATIVE)
    }
}

/// The per-compilation symbol arena. Ids are issued monotonically.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        kind: SymbolKind,
        scope: ScopeId,
        node: NodeId,
        ty: Type,
        flags: SymbolFlags,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            id,
            name: name.into(),
            kind,
            flags,
            scope,
            node,
            ty,
            array_size: None,
            parameters: Vec::new(),
            sibling: None,
            overload: None,
            fields: Vec::new(),
            new_name: None,
            use_count: 0,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        self.symbols.iter_mut()
    }

    /// Link a prototype and a definition so they rename together.
    /// Maintains `a.sibling == b <=> b.sibling == a`.
    pub fn link_siblings(&mut self, a: SymbolId, b: SymbolId) {
        self.symbols[a.0 as usize].sibling = Some(b);
        self.symbols[b.0 as usize].sibling = Some(a);
    }
}

impl std::ops::Index<SymbolId> for SymbolArena {
    type Output = Symbol;

    fn index(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }
}

impl std::ops::IndexMut<SymbolId> for SymbolArena {
    fn index_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut arena = SymbolArena::new();
        let a = arena.add(
            "a",
            SymbolKind::Variable,
            ScopeId(0),
            NodeId(0),
            Type::Float,
            SymbolFlags::empty(),
        );
        let b = arena.add(
            "b",
            SymbolKind::Variable,
            ScopeId(0),
            NodeId(0),
            Type::Int,
            SymbolFlags::empty(),
        );
        assert!(a < b);
    }

    #[test]
    fn sibling_links_are_bidirectional() {
        let mut arena = SymbolArena::new();
        let proto = arena.add(
            "f",
            SymbolKind::Function,
            ScopeId(0),
            NodeId(0),
            Type::Void,
            SymbolFlags::empty(),
        );
        let def = arena.add(
            "f",
            SymbolKind::Function,
            ScopeId(0),
            NodeId(1),
            Type::Void,
            SymbolFlags::empty(),
        );
        arena.link_siblings(proto, def);
        assert_eq!(arena[proto].sibling, Some(def));
        assert_eq!(arena[def].sibling, Some(proto));
    }

    #[test]
    fn output_name_prefers_rename() {
        let mut arena = SymbolArena::new();
        let id = arena.add(
            "helper",
            SymbolKind::Function,
            ScopeId(0),
            NodeId(0),
            Type::Void,
            SymbolFlags::empty(),
        );
        assert_eq!(arena[id].output_name(), "helper");
        arena[id].new_name = Some("a".into());
        assert_eq!(arena[id].output_name(), "a");
    }

    #[test]
    fn parameter_direction_masks_other_flags() {
        let flags = SymbolFlags::CONST | SymbolFlags::OUT | SymbolFlags::HIGHP;
        assert_eq!(flags.parameter_direction(), SymbolFlags::OUT);
    }
}
