//! The Glisten compiler pipeline.
//!
//! Source set -> tokens -> one merged global tree -> resolved/typed tree
//! -> per `export` entry: clone, trim to its reachable subgraph, rewrite
//! -> rename across all trimmed trees -> emit one compact string per
//! entry plus the shared rename map.

pub mod output;

use std::collections::BTreeMap;

use serde::Serialize;

use glisten_common::ids::SymbolId;
use glisten_emit::EmitOptions;
use glisten_parser::ast::NodeKind;
use glisten_parser::symbol::SymbolFlags;
use glisten_parser::Compilation;

pub use glisten_opt::{RenameSymbols, RewriteOptions};
pub use glisten_parser::FileAccess;

/// Compiler options. The defaults produce the smallest output: rewrite,
/// trim, rename everything, strip whitespace.
pub struct Options<'a> {
    /// Merge adjacent declarations and inline single-use const locals.
    pub compact_syntax_tree: bool,
    /// Emit with the minimum whitespace the grammar requires.
    pub remove_whitespace: bool,
    pub rename_symbols: RenameSymbols,
    /// Delete declarations unreachable from each export root.
    pub trim_symbols: bool,
    /// `#include` resolution callback.
    pub file_access: Option<&'a FileAccess>,
}

impl Default for Options<'_> {
    fn default() -> Self {
        Self {
            compact_syntax_tree: true,
            remove_whitespace: true,
            rename_symbols: RenameSymbols::All,
            trim_symbols: true,
            file_access: None,
        }
    }
}

/// One emitted shader, named after its export entry point.
#[derive(Debug, Clone, Serialize)]
pub struct Shader {
    pub name: String,
    pub contents: String,
}

/// Everything `compile` produces on success.
#[derive(Debug, Clone, Serialize)]
pub struct CompilerResult {
    pub shaders: Vec<Shader>,
    pub renaming: BTreeMap<String, String>,
}

/// The compilation (diagnostics included) plus the result, which is
/// absent when any error was logged before rewriting.
pub struct CompileOutput {
    pub compilation: Compilation,
    pub result: Option<CompilerResult>,
}

/// Tokenize, parse, and resolve a source set. Returns even on errors;
/// the diagnostics are in the compilation's log.
pub fn type_check(sources: &[(&str, &str)], options: &Options) -> Compilation {
    let mut comp = Compilation::new();
    glisten_typeck::builtins::register(&mut comp);
    for (name, contents) in sources {
        let id = comp.sources.add(*name, *contents);
        glisten_parser::parse(&mut comp, id, options.file_access);
    }
    glisten_typeck::check(&mut comp);
    comp
}

/// Run the full pipeline. One shader is produced per exported function.
pub fn compile(sources: &[(&str, &str)], options: &Options) -> CompileOutput {
    let mut comp = type_check(sources, options);
    if comp.log.has_errors() {
        return CompileOutput {
            compilation: comp,
            result: None,
        };
    }

    let exports = export_entries(&comp);
    let rewrite_options = RewriteOptions {
        compact_syntax_tree: options.compact_syntax_tree,
        trim_symbols: options.trim_symbols,
    };
    let root = comp.global_node;

    let mut trees = Vec::new();
    for export in exports {
        let mut ast = comp.ast.clone();
        glisten_opt::rewrite(
            &mut ast,
            &mut comp.symbols,
            &comp.scopes,
            &mut comp.log,
            root,
            export,
            &rewrite_options,
        );
        trees.push((export, ast));
    }

    let renaming = glisten_opt::rename::rename(
        &trees,
        root,
        &mut comp.symbols,
        &comp.scopes,
        options.rename_symbols,
    );

    let emit_options = EmitOptions {
        remove_whitespace: options.remove_whitespace,
    };
    let shaders = trees
        .iter()
        .map(|(export, ast)| Shader {
            name: comp.symbols[*export].name.clone(),
            contents: glisten_emit::emit(ast, &comp.symbols, root, &emit_options),
        })
        .collect();

    CompileOutput {
        compilation: comp,
        result: Some(CompilerResult { shaders, renaming }),
    }
}

/// Exported functions in declaration order. When both a prototype and its
/// definition carry the flag, only the definition produces a shader.
fn export_entries(comp: &Compilation) -> Vec<SymbolId> {
    let has_body = |symbol: SymbolId| {
        comp.ast
            .children(comp.symbols[symbol].node)
            .last()
            .is_some_and(|&child| comp.ast[child].kind == NodeKind::Block)
    };
    comp.symbols
        .iter()
        .filter(|s| s.flags.contains(SymbolFlags::EXPORTED) && s.is_function())
        .filter(|s| {
            has_body(s.id)
                || s.sibling.is_none_or(|sibling| {
                    !comp.symbols[sibling].flags.contains(SymbolFlags::EXPORTED)
                        || !has_body(sibling)
                })
        })
        .map(|s| s.id)
        .collect()
}
