//! Per-compilation shared state.

use rustc_hash::FxHashMap;

use glisten_common::diag::Log;
use glisten_common::ids::{NodeId, ScopeId};
use glisten_common::source::{Range, SourceMap};

use crate::ast::{Ast, NodeKind};
use crate::scope::{ScopeArena, ScopeKind};
use crate::symbol::SymbolArena;

/// `#extension` behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionBehavior {
    /// `default`: back to the implementation's initial state.
    Default,
    Disable,
    Enable,
    Require,
    Warn,
}

impl ExtensionBehavior {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "default" => Some(ExtensionBehavior::Default),
            "disable" => Some(ExtensionBehavior::Disable),
            "enable" => Some(ExtensionBehavior::Enable),
            "require" => Some(ExtensionBehavior::Require),
            "warn" => Some(ExtensionBehavior::Warn),
            _ => None,
        }
    }
}

/// Host-supplied `#include` resolution: `(includer name, relative path)`
/// to `(resolved name, contents)`. Invoked synchronously during parsing;
/// must be reentrant because includes nest. Should be idempotent and
/// side-effect-free with respect to compilation order.
pub type FileAccess = dyn Fn(&str, &str) -> Option<(String, String)>;

/// Everything one compilation owns: sources, the syntax tree arena, the
/// symbol and scope arenas, the diagnostic log, and directive state. All of
/// it is dropped in bulk when the compilation ends; two compilations share
/// nothing.
#[derive(Debug)]
pub struct Compilation {
    pub sources: SourceMap,
    pub ast: Ast,
    pub symbols: SymbolArena,
    pub scopes: ScopeArena,
    pub log: Log,
    pub extensions: FxHashMap<String, ExtensionBehavior>,
    /// The `#version` number, if one was declared.
    pub version: Option<i32>,
    pub global_scope: ScopeId,
    pub global_node: NodeId,
    /// Sources currently being parsed, innermost last, each with the
    /// range of the `#include` directive that pulled it in (`None` for
    /// top-level sources). `#include` cycle detection checks new sources
    /// against this stack and reports at the recorded directive ranges.
    pub include_stack: Vec<(String, Option<Range>)>,
}

impl Compilation {
    pub fn new() -> Self {
        let mut sources = SourceMap::new();
        // Synthetic source backing ranges that have no real text, such as
        // the global root node.
        let synthetic = sources.add("<global>", "");
        let mut ast = Ast::new();
        let mut scopes = ScopeArena::new();
        let global_scope = scopes.add(ScopeKind::Global, None);
        let global_node = ast.add(NodeKind::Global, Range::new(synthetic, 0, 0));
        Self {
            sources,
            ast,
            symbols: SymbolArena::new(),
            scopes,
            log: Log::new(),
            extensions: FxHashMap::default(),
            version: None,
            global_scope,
            global_node,
            include_stack: Vec::new(),
        }
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_compilation_has_global_root() {
        let comp = Compilation::new();
        assert_eq!(comp.ast[comp.global_node].kind, NodeKind::Global);
        assert_eq!(comp.scopes.get(comp.global_scope).kind, ScopeKind::Global);
        assert!(comp.version.is_none());
        assert!(!comp.log.has_errors());
    }

    #[test]
    fn extension_behavior_keywords() {
        assert_eq!(
            ExtensionBehavior::from_keyword("default"),
            Some(ExtensionBehavior::Default)
        );
        assert_eq!(
            ExtensionBehavior::from_keyword("enable"),
            Some(ExtensionBehavior::Enable)
        );
        assert_eq!(
            ExtensionBehavior::from_keyword("require"),
            Some(ExtensionBehavior::Require)
        );
        assert_eq!(ExtensionBehavior::from_keyword("on"), None);
    }
}
