//! Lexical scope chain.

use rustc_hash::FxHashMap;

use glisten_common::ids::{ScopeId, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    /// A function's parameters and body share one scope.
    Function,
    /// A braced block, or a `for` initializer.
    Local,
    /// A loop body.
    Loop,
    /// Struct fields.
    Struct,
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    symbols: FxHashMap<String, SymbolId>,
}

/// The per-compilation scope arena. Scopes form a tree rooted at the
/// global scope.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            kind,
            parent,
            symbols: FxHashMap::default(),
        });
        id
    }

    /// Bind `name` in `scope`. The name must be absent; on conflict the
    /// existing binding is returned unchanged.
    pub fn define(&mut self, scope: ScopeId, name: &str, symbol: SymbolId) -> Result<(), SymbolId> {
        let map = &mut self.scopes[scope.0 as usize].symbols;
        if let Some(&existing) = map.get(name) {
            return Err(existing);
        }
        map.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Rebind an existing name to a distinct symbol. Used to upgrade a
    /// function prototype's binding to its definition.
    pub fn redefine(&mut self, scope: ScopeId, name: &str, symbol: SymbolId) -> Result<(), ()> {
        let map = &mut self.scopes[scope.0 as usize].symbols;
        match map.get(name) {
            Some(&existing) if existing != symbol => {
                map.insert(name.to_string(), symbol);
                Ok(())
            }
            _ => Err(()),
        }
    }

    /// Look `name` up in `scope` alone.
    pub fn find_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.0 as usize].symbols.get(name).copied()
    }

    /// Look `name` up in `scope` and then each enclosing scope, returning
    /// the first hit.
    pub fn find(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if let Some(&symbol) = s.symbols.get(name) {
                return Some(symbol);
            }
            current = s.parent;
        }
        None
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Whether `ancestor` encloses `scope` (or is the same scope). Two
    /// symbols may share a renamed name only when neither's scope encloses
    /// the other's.
    pub fn is_ancestor_or_self(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.scopes[id.0 as usize].parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_rejects_duplicates() {
        let mut scopes = ScopeArena::new();
        let global = scopes.add(ScopeKind::Global, None);
        assert!(scopes.define(global, "x", SymbolId(0)).is_ok());
        assert_eq!(scopes.define(global, "x", SymbolId(1)), Err(SymbolId(0)));
    }

    #[test]
    fn redefine_requires_present_and_distinct() {
        let mut scopes = ScopeArena::new();
        let global = scopes.add(ScopeKind::Global, None);
        // Absent: refused.
        assert!(scopes.redefine(global, "f", SymbolId(1)).is_err());
        scopes.define(global, "f", SymbolId(0)).unwrap();
        // Same symbol: refused.
        assert!(scopes.redefine(global, "f", SymbolId(0)).is_err());
        // Distinct: the prototype -> definition upgrade.
        assert!(scopes.redefine(global, "f", SymbolId(1)).is_ok());
        assert_eq!(scopes.find_local(global, "f"), Some(SymbolId(1)));
    }

    #[test]
    fn find_walks_the_parent_chain() {
        let mut scopes = ScopeArena::new();
        let global = scopes.add(ScopeKind::Global, None);
        let func = scopes.add(ScopeKind::Function, Some(global));
        let body = scopes.add(ScopeKind::Local, Some(func));
        scopes.define(global, "g", SymbolId(0)).unwrap();
        scopes.define(func, "p", SymbolId(1)).unwrap();

        assert_eq!(scopes.find(body, "g"), Some(SymbolId(0)));
        assert_eq!(scopes.find(body, "p"), Some(SymbolId(1)));
        assert_eq!(scopes.find(body, "missing"), None);
        assert_eq!(scopes.find(global, "p"), None);
    }

    #[test]
    fn shadowing_resolves_to_the_nearest_binding() {
        let mut scopes = ScopeArena::new();
        let global = scopes.add(ScopeKind::Global, None);
        let inner = scopes.add(ScopeKind::Local, Some(global));
        scopes.define(global, "x", SymbolId(0)).unwrap();
        scopes.define(inner, "x", SymbolId(1)).unwrap();
        assert_eq!(scopes.find(inner, "x"), Some(SymbolId(1)));
        assert_eq!(scopes.find(global, "x"), Some(SymbolId(0)));
    }

    #[test]
    fn ancestor_relation() {
        let mut scopes = ScopeArena::new();
        let global = scopes.add(ScopeKind::Global, None);
        let a = scopes.add(ScopeKind::Function, Some(global));
        let b = scopes.add(ScopeKind::Function, Some(global));
        assert!(scopes.is_ancestor_or_self(global, a));
        assert!(scopes.is_ancestor_or_self(a, a));
        assert!(!scopes.is_ancestor_or_self(a, b));
        assert!(!scopes.is_ancestor_or_self(a, global));
    }
}
