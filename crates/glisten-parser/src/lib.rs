// Glisten parser -- syntax tree, scopes, symbols, and the parser itself.

pub mod ast;
pub mod compilation;
mod parser;
pub mod scope;
pub mod symbol;

use glisten_common::source::SourceId;

pub use compilation::{Compilation, ExtensionBehavior, FileAccess};

use symbol::SymbolFlags;

/// Tokenize and parse one source, appending its top-level declarations to
/// the compilation's global tree and defining symbols along the way.
/// Diagnostics land in `comp.log`; parsing always runs to the end of the
/// token stream.
pub fn parse(comp: &mut Compilation, source: SourceId, file_access: Option<&FileAccess>) {
    let mut parser = parser::Parser::new(comp, source, file_access, None);
    parser.parse_globals();
}

/// Parse the synthesized built-in API source. Identical to [`parse`],
/// except every symbol created by it is tagged NATIVE: never renamed,
/// never rewritten, never emitted.
pub fn parse_native(comp: &mut Compilation, source: SourceId) {
    let before = comp.symbols.len();
    parse(comp, source, None);
    for symbol in comp.symbols.iter_mut().skip(before) {
        symbol.flags |= SymbolFlags::NATIVE;
    }
}
