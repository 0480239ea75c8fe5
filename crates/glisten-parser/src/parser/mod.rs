//! Recursive-descent parser for the Glisten shading language.
//!
//! Statements are parsed by hand in [`items`]; expressions by the Pratt
//! loop in [`expressions`]; preprocessor directives in [`directives`].
//! The parser builds the arena tree directly and defines symbols as it
//! goes: declarations bind names into the current scope, and every `Name`
//! expression resolves against the scope chain immediately (the language
//! declares before use).
//!
//! On a syntax error the parser logs a diagnostic and resynchronizes to
//! the next `;` or matching `}`; it never aborts the compilation.

pub(crate) mod directives;
pub(crate) mod expressions;
pub(crate) mod items;

use glisten_common::diag::DiagnosticKind;
use glisten_common::ids::{NodeId, ScopeId};
use glisten_common::source::{Range, SourceId};
use glisten_common::token::{Token, TokenKind};
use glisten_common::ty::Type;
use glisten_lexer::{Lexer, TokenizePurpose};

use crate::compilation::{Compilation, FileAccess};
use crate::scope::ScopeKind;
use crate::symbol::SymbolFlags;

pub(crate) struct Parser<'c, 'f> {
    pub(crate) comp: &'c mut Compilation,
    tokens: Vec<Token>,
    /// Copy of the source text, for extracting lexemes by span.
    contents: String,
    pos: usize,
    pub(crate) source: SourceId,
    /// The scope new symbols are bound into.
    pub(crate) scope: ScopeId,
    /// Where top-level declarations are appended: the global root, or a
    /// modifier block.
    pub(crate) target: NodeId,
    pub(crate) file_access: Option<&'f FileAccess>,
    /// The `#include` directive this source was entered through, if any.
    entry_range: Option<Range>,
    /// Qualifier applied by enclosing modifier blocks.
    pub(crate) modifier: SymbolFlags,
    /// Whether non-directive code has appeared yet (`#version` ordering).
    saw_code: bool,
}

impl<'c, 'f> Parser<'c, 'f> {
    pub(crate) fn new(
        comp: &'c mut Compilation,
        source: SourceId,
        file_access: Option<&'f FileAccess>,
        entry_range: Option<Range>,
    ) -> Self {
        let contents = comp.sources.get(source).contents.clone();
        let tokens = Lexer::tokenize(source, &contents, TokenizePurpose::Compile, &mut comp.log);
        let scope = comp.global_scope;
        let target = comp.global_node;
        Self {
            comp,
            tokens,
            contents,
            pos: 0,
            source,
            scope,
            target,
            file_access,
            entry_range,
            modifier: SymbolFlags::empty(),
            saw_code: false,
        }
    }

    /// Parse the whole source, appending top-level declarations to the
    /// global root. Registers the source (and the directive it was
    /// entered through) on the include stack while running, for cycle
    /// detection and reporting.
    pub(crate) fn parse_globals(&mut self) {
        let name = self.comp.sources.get(self.source).name.clone();
        self.comp.include_stack.push((name, self.entry_range));
        while self.current() != TokenKind::Eof {
            if self.parse_top_level().is_none() {
                self.recover();
            }
        }
        self.comp.include_stack.pop();
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn current_range(&self) -> Range {
        self.tokens[self.pos].range
    }

    pub(crate) fn current_text(&self) -> &str {
        let span = self.tokens[self.pos].range.span;
        &self.contents[span.start as usize..span.end as usize]
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume the current token. The final `Eof` is never consumed.
    pub(crate) fn advance(&mut self) {
        if self.tokens[self.pos].kind != TokenKind::Eof {
            self.pos += 1;
        }
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it matches, or log a syntax error.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        let found = self.current_text().to_string();
        let message = if found.is_empty() {
            format!("expected {}", token_description(kind))
        } else {
            format!("expected {} but found \"{found}\"", token_description(kind))
        };
        self.syntax_error(message);
        false
    }

    pub(crate) fn syntax_error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        self.comp.log.error(DiagnosticKind::Syntax, message, range);
    }

    pub(crate) fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, range: Range) {
        self.comp.log.error(kind, message, range);
    }

    /// Resynchronize after a syntax error: skip to just past the next `;`,
    /// over a balanced `{...}`, or stop before `}` / end of file.
    pub(crate) fn recover(&mut self) {
        loop {
            match self.current() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace | TokenKind::Eof => return,
                TokenKind::LBrace => {
                    self.skip_balanced_braces();
                    return;
                }
                _ => self.advance(),
            }
        }
    }

    fn skip_balanced_braces(&mut self) {
        let mut depth = 0u32;
        loop {
            match self.current() {
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => self.advance(),
            }
        }
    }

    // ── Scopes and tree plumbing ───────────────────────────────────────

    pub(crate) fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let scope = self.comp.scopes.add(kind, Some(self.scope));
        self.scope = scope;
        scope
    }

    /// Append a finished top-level declaration to the current target.
    pub(crate) fn append_top(&mut self, node: NodeId) {
        self.comp.ast.append_child(self.target, node);
    }

    pub(crate) fn mark_code_seen(&mut self) {
        self.saw_code = true;
    }

    pub(crate) fn code_seen(&self) -> bool {
        self.saw_code
    }

    // ── Top-level dispatch ─────────────────────────────────────────────

    fn parse_top_level(&mut self) -> Option<()> {
        match self.current() {
            TokenKind::Version => directives::parse_version(self),
            TokenKind::Extension => directives::parse_extension(self),
            TokenKind::Include => directives::parse_include(self),
            TokenKind::Pragma => directives::parse_pragma(self),
            TokenKind::Semicolon => {
                self.advance();
                Some(())
            }
            TokenKind::Export => self.parse_marked_declaration(SymbolFlags::EXPORTED),
            TokenKind::Import => self.parse_marked_declaration(SymbolFlags::IMPORTED),
            TokenKind::Precision => {
                self.mark_code_seen();
                let node = items::parse_precision(self)?;
                self.append_top(node);
                Some(())
            }
            kind if is_modifier_keyword(kind) && self.nth(1) == TokenKind::LBrace => {
                self.mark_code_seen();
                items::parse_modifier_block(self, modifier_flag(kind))
            }
            _ => {
                self.mark_code_seen();
                items::parse_declaration(self, SymbolFlags::empty())
            }
        }
    }

    /// `export` / `import` ahead of a function declaration or a modifier
    /// block.
    fn parse_marked_declaration(&mut self, flag: SymbolFlags) -> Option<()> {
        self.mark_code_seen();
        self.advance();
        if self.at(TokenKind::LBrace) {
            items::parse_modifier_block(self, flag)
        } else {
            items::parse_declaration(self, flag)
        }
    }
}

/// Qualifier keywords that may open a modifier block.
fn is_modifier_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Const | TokenKind::Uniform | TokenKind::Attribute | TokenKind::Varying
    )
}

pub(crate) fn modifier_flag(kind: TokenKind) -> SymbolFlags {
    match kind {
        TokenKind::Const => SymbolFlags::CONST,
        TokenKind::Uniform => SymbolFlags::UNIFORM,
        TokenKind::Attribute => SymbolFlags::ATTRIBUTE,
        TokenKind::Varying => SymbolFlags::VARYING,
        TokenKind::Export => SymbolFlags::EXPORTED,
        TokenKind::Import => SymbolFlags::IMPORTED,
        _ => SymbolFlags::empty(),
    }
}

/// Map a type keyword to its type.
pub(crate) fn type_from_token(kind: TokenKind) -> Option<Type> {
    Some(match kind {
        TokenKind::Void => Type::Void,
        TokenKind::Bool => Type::Bool,
        TokenKind::Int => Type::Int,
        TokenKind::Float => Type::Float,
        TokenKind::BVec2 => Type::BVec2,
        TokenKind::BVec3 => Type::BVec3,
        TokenKind::BVec4 => Type::BVec4,
        TokenKind::IVec2 => Type::IVec2,
        TokenKind::IVec3 => Type::IVec3,
        TokenKind::IVec4 => Type::IVec4,
        TokenKind::Vec2 => Type::Vec2,
        TokenKind::Vec3 => Type::Vec3,
        TokenKind::Vec4 => Type::Vec4,
        TokenKind::Mat2 => Type::Mat2,
        TokenKind::Mat3 => Type::Mat3,
        TokenKind::Mat4 => Type::Mat4,
        TokenKind::Sampler2D => Type::Sampler2D,
        TokenKind::SamplerCube => Type::SamplerCube,
        _ => return None,
    })
}

fn token_description(kind: TokenKind) -> String {
    let text = match kind {
        TokenKind::Semicolon => ";",
        TokenKind::Colon => ":",
        TokenKind::Comma => ",",
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::Identifier => return "an identifier".to_string(),
        TokenKind::IntLiteral => return "an int literal".to_string(),
        TokenKind::StringLiteral => return "a string literal".to_string(),
        _ => return format!("{kind:?}"),
    };
    format!("\"{text}\"")
}
