//! Preprocessor directives.
//!
//! `#version` and `#extension` update compilation state and leave a node
//! carrying the verbatim line for re-emission. `#pragma` is preserved
//! untouched. `#include` resolves through the host's file-access callback
//! and parses the included source in place, so its top-level declarations
//! land exactly where the directive stood; cycles are detected against
//! the stack of sources currently being parsed.

use glisten_common::diag::DiagnosticKind;
use glisten_common::token::TokenKind;
use glisten_common::ty::Literal;

use crate::ast::NodeKind;
use crate::compilation::ExtensionBehavior;

use super::Parser;

pub(crate) fn parse_version(p: &mut Parser) -> Option<()> {
    let start = p.current_range();
    p.advance(); // #version

    let value_range = p.current_range();
    let text = p.current_text().to_string();
    if !p.expect(TokenKind::IntLiteral) {
        return None;
    }

    if p.comp.version.is_some() {
        p.error(
            DiagnosticKind::Syntax,
            "duplicate \"#version\" directive",
            start,
        );
    } else if p.code_seen() {
        p.error(
            DiagnosticKind::Syntax,
            "\"#version\" must appear before any code",
            start,
        );
    } else {
        p.comp.version = Some(glisten_lexer::decode_int_literal(&text));
        let node = p.comp.ast.add(NodeKind::Version, start.merge(value_range));
        p.comp.ast[node].literal = Some(Literal::Str(format!("#version {text}")));
        p.append_top(node);
    }
    Some(())
}

pub(crate) fn parse_extension(p: &mut Parser) -> Option<()> {
    let start = p.current_range();
    p.advance(); // #extension

    let name = p.current_text().to_string();
    if !p.expect(TokenKind::Identifier) {
        return None;
    }
    if !p.expect(TokenKind::Colon) {
        return None;
    }
    let word_range = p.current_range();
    let word = p.current_text().to_string();
    if !p.expect(TokenKind::Identifier) {
        return None;
    }

    match ExtensionBehavior::from_keyword(&word) {
        Some(behavior) => {
            p.comp.extensions.insert(name.clone(), behavior);
            let node = p.comp.ast.add(NodeKind::Extension, start.merge(word_range));
            p.comp.ast[node].literal = Some(Literal::Str(format!("#extension {name} : {word}")));
            p.append_top(node);
        }
        None => p.error(
            DiagnosticKind::UnsupportedExtension,
            format!("unsupported extension behavior \"{word}\""),
            word_range,
        ),
    }
    Some(())
}

pub(crate) fn parse_pragma(p: &mut Parser) -> Option<()> {
    let range = p.current_range();
    let text = p.current_text().to_string();
    p.advance();
    let node = p.comp.ast.add(NodeKind::Pragma, range);
    p.comp.ast[node].literal = Some(Literal::Str(text));
    p.append_top(node);
    Some(())
}

pub(crate) fn parse_include(p: &mut Parser) -> Option<()> {
    let start = p.current_range();
    p.advance(); // #include

    let path_range = p.current_range();
    let quoted = p.current_text().to_string();
    if !p.expect(TokenKind::StringLiteral) {
        return None;
    }
    let path = quoted.trim_matches('"').to_string();
    let range = start.merge(path_range);

    let Some(file_access) = p.file_access else {
        p.error(
            DiagnosticKind::IncludeNotFound,
            format!("cannot include \"{path}\" without file access"),
            range,
        );
        return Some(());
    };

    let includer = p.comp.sources.get(p.source).name.clone();
    match file_access(&includer, &path) {
        None => p.error(
            DiagnosticKind::IncludeNotFound,
            format!("cannot find include \"{path}\""),
            range,
        ),
        Some((name, contents)) => {
            let on_stack = p
                .comp
                .include_stack
                .iter()
                .position(|(entry, _)| *entry == name);
            if let Some(position) = on_stack {
                // Report inside the re-included source, at the directive
                // that continues the cycle: the one the next file on the
                // stack was entered through.
                let cycle_range = p
                    .comp
                    .include_stack
                    .get(position + 1)
                    .and_then(|(_, entered_at)| *entered_at)
                    .unwrap_or(range);
                p.error(
                    DiagnosticKind::IncludeCycle,
                    format!("include cycle through \"{name}\""),
                    cycle_range,
                );
            } else {
                let id = p.comp.sources.add(name, contents);
                let mut inner = Parser::new(&mut *p.comp, id, p.file_access, Some(range));
                inner.parse_globals();
            }
        }
    }
    Some(())
}
