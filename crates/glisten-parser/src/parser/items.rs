//! Declarations and statements.
//!
//! Declarations bind symbols as they parse: variables (with qualifiers,
//! precision, arrays, initializers), functions (prototype/definition
//! sibling pairs and overload chains), structs (a STRUCT scope holding
//! field symbols), precision statements, and modifier blocks.

use glisten_common::diag::DiagnosticKind;
use glisten_common::ids::{NodeId, ScopeId, SymbolId};
use glisten_common::source::Range;
use glisten_common::token::TokenKind;
use glisten_common::ty::{Literal, Type};

use crate::ast::NodeKind;
use crate::scope::ScopeKind;
use crate::symbol::{SymbolFlags, SymbolKind};

use super::expressions::{parse_assignment_expression, parse_expression};
use super::{type_from_token, Parser};

// ── Top-level declarations ─────────────────────────────────────────────

/// Parse one top-level declaration (function, variables, struct) and
/// append it to the current target.
pub(crate) fn parse_declaration(p: &mut Parser, extra: SymbolFlags) -> Option<()> {
    let start = p.current_range();
    let base = p.modifier | extra;
    let (ty, flags, struct_node) = parse_type_specifier(p, base)?;

    if let Some(struct_node) = struct_node {
        p.append_top(struct_node);
        if p.eat(TokenKind::Semicolon) {
            return Some(());
        }
    }

    let name_range = p.current_range();
    let name = p.current_text().to_string();
    if !p.expect(TokenKind::Identifier) {
        return None;
    }

    if p.at(TokenKind::LParen) {
        let function = parse_function(p, ty, name, name_range, flags)?;
        p.append_top(function);
    } else {
        let vars = parse_variable_declarators(p, ty, flags, start, name, name_range)?;
        p.append_top(vars);
    }
    Some(())
}

/// `uniform { ... }` and friends: every declaration inside picks up the
/// block's qualifier.
pub(crate) fn parse_modifier_block(p: &mut Parser, flag: SymbolFlags) -> Option<()> {
    let start = p.current_range();
    if !p.at(TokenKind::LBrace) {
        p.advance(); // the qualifier keyword
    }
    let node = p.comp.ast.add(NodeKind::ModifierBlock, start);
    p.comp.ast[node].qualifier = flag;
    if !p.expect(TokenKind::LBrace) {
        return None;
    }

    let saved_modifier = p.modifier;
    let saved_target = p.target;
    p.modifier |= flag;
    p.target = node;
    while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
        if parse_declaration(p, SymbolFlags::empty()).is_none() {
            p.recover();
        }
    }
    p.modifier = saved_modifier;
    p.target = saved_target;

    p.expect(TokenKind::RBrace);
    p.append_top(node);
    Some(())
}

// ── Type specifiers ────────────────────────────────────────────────────

/// Qualifiers, precision, then a type: a keyword, a struct name, or an
/// inline struct definition (returned as the third element).
fn parse_type_specifier(
    p: &mut Parser,
    base: SymbolFlags,
) -> Option<(Type, SymbolFlags, Option<NodeId>)> {
    let mut flags = base;
    loop {
        let flag = match p.current() {
            TokenKind::Const => SymbolFlags::CONST,
            TokenKind::Attribute => SymbolFlags::ATTRIBUTE,
            TokenKind::Uniform => SymbolFlags::UNIFORM,
            TokenKind::Varying => SymbolFlags::VARYING,
            TokenKind::Invariant => SymbolFlags::INVARIANT,
            TokenKind::In => SymbolFlags::IN,
            TokenKind::Out => SymbolFlags::OUT,
            TokenKind::Inout => SymbolFlags::INOUT,
            TokenKind::Highp => SymbolFlags::HIGHP,
            TokenKind::Mediump => SymbolFlags::MEDIUMP,
            TokenKind::Lowp => SymbolFlags::LOWP,
            _ => break,
        };
        flags |= flag;
        p.advance();
    }

    match p.current() {
        TokenKind::Struct => {
            let (ty, node) = parse_struct_definition(p)?;
            Some((ty, flags, Some(node)))
        }
        kind => {
            if let Some(ty) = type_from_token(kind) {
                p.advance();
                return Some((ty, flags, None));
            }
            if kind == TokenKind::Identifier {
                let name = p.current_text().to_string();
                if let Some(symbol) = p.comp.scopes.find(p.scope, &name) {
                    if p.comp.symbols[symbol].is_struct() {
                        p.advance();
                        return Some((Type::Struct(symbol), flags, None));
                    }
                }
                p.syntax_error(format!("expected a type but found \"{name}\""));
                return None;
            }
            let found = p.current_text().to_string();
            if found.is_empty() {
                p.syntax_error("expected a type");
            } else {
                p.syntax_error(format!("expected a type but found \"{found}\""));
            }
            None
        }
    }
}

/// `struct Name { fields }`. Opens a STRUCT scope for the fields and
/// records them on the struct symbol in declaration order.
fn parse_struct_definition(p: &mut Parser) -> Option<(Type, NodeId)> {
    let start = p.current_range();
    p.advance(); // struct

    let name_range = p.current_range();
    let name = p.current_text().to_string();
    if !p.expect(TokenKind::Identifier) {
        return None;
    }

    let node = p.comp.ast.add(NodeKind::StructDef, start.merge(name_range));
    let symbol = p.comp.symbols.add(
        &name,
        SymbolKind::Struct,
        p.scope,
        node,
        Type::Error,
        SymbolFlags::empty(),
    );
    p.comp.symbols[symbol].ty = Type::Struct(symbol);
    p.comp.ast[node].symbol = Some(symbol);
    if p.comp.scopes.define(p.scope, &name, symbol).is_err() {
        p.error(
            DiagnosticKind::RedefinedSymbol,
            format!("\"{name}\" is already defined"),
            name_range,
        );
    }

    if !p.expect(TokenKind::LBrace) {
        return None;
    }
    let saved = p.scope;
    p.push_scope(ScopeKind::Struct);
    while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
        match parse_struct_field(p, symbol) {
            Some(field) => p.comp.ast.append_child(node, field),
            None => p.recover(),
        }
    }
    p.scope = saved;
    p.expect(TokenKind::RBrace);

    Some((Type::Struct(symbol), node))
}

/// One field declaration inside a struct body. No initializers.
fn parse_struct_field(p: &mut Parser, struct_symbol: SymbolId) -> Option<NodeId> {
    let start = p.current_range();
    let (ty, flags, struct_node) = parse_type_specifier(p, SymbolFlags::empty())?;
    if struct_node.is_some() {
        p.syntax_error("nested struct definitions are not supported");
        return None;
    }

    let vars = p.comp.ast.add(NodeKind::Variables, start);
    loop {
        let name_range = p.current_range();
        let name = p.current_text().to_string();
        if !p.expect(TokenKind::Identifier) {
            return None;
        }
        let var = p.comp.ast.add(NodeKind::Variable, name_range);
        let (size, array) = parse_optional_array_suffix(p, name_range)?;
        let init = p.comp.ast.add(NodeKind::Empty, name_range);
        p.comp.ast.append_child(var, size);
        p.comp.ast.append_child(var, init);

        let symbol = define_variable(p, &name, name_range, var, ty, flags, array);
        p.comp.ast[var].symbol = Some(symbol);
        p.comp.symbols[struct_symbol].fields.push(symbol);
        p.comp.ast.append_child(vars, var);

        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.expect(TokenKind::Semicolon);
    Some(vars)
}

// ── Variables ──────────────────────────────────────────────────────────

/// `[size]` suffix. Returns the size node (`Empty` when there is none)
/// and the symbol's array descriptor: `None` for non-arrays, `Some(None)`
/// for unsized or not-yet-folded sizes, `Some(Some(n))` for literal sizes.
fn parse_optional_array_suffix(
    p: &mut Parser,
    fallback: Range,
) -> Option<(NodeId, Option<Option<u32>>)> {
    if !p.eat(TokenKind::LBracket) {
        return Some((p.comp.ast.add(NodeKind::Empty, fallback), None));
    }
    if p.eat(TokenKind::RBracket) {
        return Some((p.comp.ast.add(NodeKind::Empty, fallback), Some(None)));
    }
    let size = parse_assignment_expression(p)?;
    if !p.expect(TokenKind::RBracket) {
        return None;
    }
    let array = match &p.comp.ast[size].literal {
        Some(Literal::Int { value, .. }) if p.comp.ast[size].kind == NodeKind::IntLiteral => {
            Some(Some(*value as u32))
        }
        _ => Some(None),
    };
    Some((size, array))
}

fn define_variable(
    p: &mut Parser,
    name: &str,
    range: Range,
    node: NodeId,
    ty: Type,
    flags: SymbolFlags,
    array: Option<Option<u32>>,
) -> SymbolId {
    let symbol = p
        .comp
        .symbols
        .add(name, SymbolKind::Variable, p.scope, node, ty, flags);
    p.comp.symbols[symbol].array_size = array;
    if p.comp.scopes.define(p.scope, name, symbol).is_err() {
        p.error(
            DiagnosticKind::RedefinedSymbol,
            format!("\"{name}\" is already defined"),
            range,
        );
    }
    symbol
}

/// The declarator list of a variable declaration, first name already
/// consumed. Consumes the closing `;`.
fn parse_variable_declarators(
    p: &mut Parser,
    ty: Type,
    flags: SymbolFlags,
    start: Range,
    first_name: String,
    first_range: Range,
) -> Option<NodeId> {
    let vars = p.comp.ast.add(NodeKind::Variables, start);
    let mut name = first_name;
    let mut name_range = first_range;
    loop {
        let var = p.comp.ast.add(NodeKind::Variable, name_range);
        let (size, array) = parse_optional_array_suffix(p, name_range)?;
        let init = if p.eat(TokenKind::Eq) {
            parse_assignment_expression(p)?
        } else {
            p.comp.ast.add(NodeKind::Empty, name_range)
        };
        p.comp.ast.append_child(var, size);
        p.comp.ast.append_child(var, init);

        let symbol = define_variable(p, &name, name_range, var, ty, flags, array);
        p.comp.ast[var].symbol = Some(symbol);
        p.comp.ast.append_child(vars, var);

        if !p.eat(TokenKind::Comma) {
            break;
        }
        name_range = p.current_range();
        name = p.current_text().to_string();
        if !p.expect(TokenKind::Identifier) {
            return None;
        }
    }
    p.expect(TokenKind::Semicolon);
    Some(vars)
}

// ── Functions ──────────────────────────────────────────────────────────

/// Parameters and body (or `;` for a prototype). The parameters and body
/// share one FUNCTION scope; the function's own symbol is registered in
/// the enclosing scope before the body parses.
fn parse_function(
    p: &mut Parser,
    return_type: Type,
    name: String,
    name_range: Range,
    flags: SymbolFlags,
) -> Option<NodeId> {
    let node = p.comp.ast.add(NodeKind::Function, name_range);
    let enclosing = p.scope;
    let saved = p.scope;
    p.push_scope(ScopeKind::Function);

    let result = parse_function_inner(p, node, return_type, &name, name_range, flags, enclosing);

    p.scope = saved;
    result
}

fn parse_function_inner(
    p: &mut Parser,
    node: NodeId,
    return_type: Type,
    name: &str,
    name_range: Range,
    flags: SymbolFlags,
    enclosing: ScopeId,
) -> Option<NodeId> {
    p.advance(); // (

    let mut parameters = Vec::new();
    if p.at(TokenKind::Void) && p.nth(1) == TokenKind::RParen {
        p.advance();
    }
    if !p.at(TokenKind::RParen) {
        loop {
            let param = parse_parameter(p)?;
            if let Some(symbol) = p.comp.ast[param].symbol {
                parameters.push(symbol);
            }
            p.comp.ast.append_child(node, param);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    if !p.expect(TokenKind::RParen) {
        return None;
    }

    let will_have_body = p.at(TokenKind::LBrace);
    let symbol = register_function(
        p,
        name,
        name_range,
        node,
        return_type,
        parameters,
        flags,
        enclosing,
        will_have_body,
    );
    p.comp.ast[node].symbol = Some(symbol);

    if will_have_body {
        let body = parse_block_raw(p)?;
        p.comp.ast.append_child(node, body);
    } else if !p.expect(TokenKind::Semicolon) {
        return None;
    }
    Some(node)
}

/// One parameter: qualifiers, type, optional name (prototypes may omit
/// it), optional array suffix.
fn parse_parameter(p: &mut Parser) -> Option<NodeId> {
    let start = p.current_range();
    let (ty, flags, struct_node) = parse_type_specifier(p, SymbolFlags::empty())?;
    if struct_node.is_some() {
        p.syntax_error("struct definitions are not allowed in parameters");
        return None;
    }

    let var = p.comp.ast.add(NodeKind::Variable, start);
    let symbol = if p.at(TokenKind::Identifier) {
        let name_range = p.current_range();
        let name = p.current_text().to_string();
        p.advance();
        let (size, array) = parse_optional_array_suffix(p, name_range)?;
        let init = p.comp.ast.add(NodeKind::Empty, name_range);
        p.comp.ast.append_child(var, size);
        p.comp.ast.append_child(var, init);
        define_variable(p, &name, name_range, var, ty, flags, array)
    } else {
        let (size, array) = parse_optional_array_suffix(p, start)?;
        let init = p.comp.ast.add(NodeKind::Empty, start);
        p.comp.ast.append_child(var, size);
        p.comp.ast.append_child(var, init);
        // Anonymous parameter: a symbol with no scope binding.
        let symbol = p
            .comp
            .symbols
            .add("", SymbolKind::Variable, p.scope, var, ty, flags);
        p.comp.symbols[symbol].array_size = array;
        symbol
    };
    p.comp.ast[var].symbol = Some(symbol);
    Some(var)
}

fn same_signature(p: &Parser, a: SymbolId, b: SymbolId) -> bool {
    let pa = &p.comp.symbols[a].parameters;
    let pb = &p.comp.symbols[b].parameters;
    pa.len() == pb.len()
        && pa
            .iter()
            .zip(pb.iter())
            .all(|(&x, &y)| p.comp.symbols[x].ty == p.comp.symbols[y].ty)
}

fn function_has_body(p: &Parser, symbol: SymbolId) -> bool {
    let node = p.comp.symbols[symbol].node;
    p.comp
        .ast
        .children(node)
        .last()
        .is_some_and(|&child| p.comp.ast[child].kind == NodeKind::Block)
}

/// Bind a function symbol, maintaining prototype/definition sibling pairs
/// and the overload chain.
#[allow(clippy::too_many_arguments)]
fn register_function(
    p: &mut Parser,
    name: &str,
    name_range: Range,
    node: NodeId,
    return_type: Type,
    parameters: Vec<SymbolId>,
    flags: SymbolFlags,
    enclosing: ScopeId,
    will_have_body: bool,
) -> SymbolId {
    let symbol = p.comp.symbols.add(
        name,
        SymbolKind::Function,
        enclosing,
        node,
        return_type,
        flags,
    );
    p.comp.symbols[symbol].parameters = parameters;

    let existing = match p.comp.scopes.find_local(enclosing, name) {
        None => {
            let _ = p.comp.scopes.define(enclosing, name, symbol);
            return symbol;
        }
        Some(existing) => existing,
    };

    if !p.comp.symbols[existing].is_function() {
        p.error(
            DiagnosticKind::RedefinedSymbol,
            format!("\"{name}\" is already defined"),
            name_range,
        );
        return symbol;
    }

    // Walk the overload chain looking for a same-signature entry.
    let mut previous: Option<SymbolId> = None;
    let mut current = Some(existing);
    let mut matched: Option<(Option<SymbolId>, SymbolId)> = None;
    let mut tail = existing;
    while let Some(c) = current {
        if same_signature(p, c, symbol) {
            matched = Some((previous, c));
            break;
        }
        previous = Some(c);
        tail = c;
        current = p.comp.symbols[c].overload;
    }

    match matched {
        // A new overload: append to the chain.
        None => {
            p.comp.symbols[tail].overload = Some(symbol);
        }
        Some((previous, other)) => {
            let other_has_body = function_has_body(p, other);
            if other_has_body == will_have_body {
                // Two definitions, or two prototypes.
                p.error(
                    DiagnosticKind::RedefinedSymbol,
                    format!("\"{name}\" is already defined"),
                    name_range,
                );
            } else if will_have_body {
                // This is the definition for prototype `other`: pair them
                // and take the prototype's place in the chain.
                p.comp.symbols.link_siblings(other, symbol);
                let next = p.comp.symbols[other].overload.take();
                p.comp.symbols[symbol].overload = next;
                match previous {
                    None => {
                        let _ = p.comp.scopes.redefine(enclosing, name, symbol);
                    }
                    Some(previous) => p.comp.symbols[previous].overload = Some(symbol),
                }
            } else {
                // A prototype following its definition.
                if p.comp.symbols[other].sibling.is_some() {
                    p.error(
                        DiagnosticKind::RedefinedSymbol,
                        format!("\"{name}\" is already defined"),
                        name_range,
                    );
                } else {
                    p.comp.symbols.link_siblings(other, symbol);
                }
            }
        }
    }
    symbol
}

// ── Statements ─────────────────────────────────────────────────────────

/// Parse one statement, appending it (or, for inline struct definitions,
/// its two nodes) to `container`.
pub(crate) fn parse_statement_into(p: &mut Parser, container: NodeId) -> Option<()> {
    match p.current() {
        TokenKind::LBrace => {
            let block = parse_block(p)?;
            p.comp.ast.append_child(container, block);
        }
        TokenKind::If => {
            let node = parse_if(p)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::For => {
            let node = parse_for(p)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::While => {
            let node = parse_while(p)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::Do => {
            let node = parse_do_while(p)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::Return => {
            let node = parse_return(p)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::Discard => {
            let node = parse_jump(p, NodeKind::Discard)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::Continue => {
            let node = parse_jump(p, NodeKind::Continue)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::Break => {
            let node = parse_jump(p, NodeKind::Break)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::Precision => {
            let node = parse_precision(p)?;
            p.comp.ast.append_child(container, node);
        }
        TokenKind::Semicolon => {
            let node = p.comp.ast.add(NodeKind::Empty, p.current_range());
            p.advance();
            p.comp.ast.append_child(container, node);
        }
        _ if at_declaration_start(p) => {
            parse_declaration_statement(p, container)?;
        }
        _ => {
            let start = p.current_range();
            let expr = parse_expression(p)?;
            p.expect(TokenKind::Semicolon);
            let node = p.comp.ast.add(NodeKind::ExpressionStmt, start);
            p.comp.ast.append_child(node, expr);
            p.comp.ast.append_child(container, node);
        }
    }
    Some(())
}

fn at_declaration_start(p: &Parser) -> bool {
    match p.current() {
        TokenKind::Const
        | TokenKind::Attribute
        | TokenKind::Uniform
        | TokenKind::Varying
        | TokenKind::Invariant
        | TokenKind::Highp
        | TokenKind::Mediump
        | TokenKind::Lowp
        | TokenKind::Struct => true,
        kind if kind.is_type_keyword() => p.nth(1) == TokenKind::Identifier,
        TokenKind::Identifier => {
            // A struct type name followed by a variable name.
            p.nth(1) == TokenKind::Identifier
                && p.comp
                    .scopes
                    .find(p.scope, p.current_text())
                    .is_some_and(|s| p.comp.symbols[s].is_struct())
        }
        _ => false,
    }
}

/// A declaration in statement position: local variables, or a local
/// struct definition plus declarators.
fn parse_declaration_statement(p: &mut Parser, container: NodeId) -> Option<()> {
    let start = p.current_range();
    let (ty, flags, struct_node) = parse_type_specifier(p, SymbolFlags::empty())?;

    if let Some(struct_node) = struct_node {
        p.comp.ast.append_child(container, struct_node);
        if p.eat(TokenKind::Semicolon) {
            return Some(());
        }
    }

    let name_range = p.current_range();
    let name = p.current_text().to_string();
    if !p.expect(TokenKind::Identifier) {
        return None;
    }
    if p.at(TokenKind::LParen) {
        p.syntax_error("nested functions are not supported");
        return None;
    }
    let vars = parse_variable_declarators(p, ty, flags, start, name, name_range)?;
    p.comp.ast.append_child(container, vars);
    Some(())
}

/// The statement of an `if` arm or loop body. Usually a single node; an
/// inline struct definition keeps its wrapper block.
fn parse_embedded_statement(p: &mut Parser) -> Option<NodeId> {
    let wrapper = p.comp.ast.add(NodeKind::Block, p.current_range());
    parse_statement_into(p, wrapper)?;
    if p.comp.ast.children(wrapper).len() == 1 {
        Some(p.comp.ast.remove_child_at(wrapper, 0))
    } else {
        Some(wrapper)
    }
}

/// A braced block with its own LOCAL scope.
fn parse_block(p: &mut Parser) -> Option<NodeId> {
    let saved = p.scope;
    p.push_scope(ScopeKind::Local);
    let result = parse_block_raw(p);
    p.scope = saved;
    result
}

/// A braced block using the current scope (function bodies share the
/// FUNCTION scope with their parameters).
pub(crate) fn parse_block_raw(p: &mut Parser) -> Option<NodeId> {
    let start = p.current_range();
    if !p.expect(TokenKind::LBrace) {
        return None;
    }
    let block = p.comp.ast.add(NodeKind::Block, start);
    while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
        if parse_statement_into(p, block).is_none() {
            p.recover();
        }
    }
    p.expect(TokenKind::RBrace);
    Some(block)
}

fn parse_if(p: &mut Parser) -> Option<NodeId> {
    let start = p.current_range();
    p.advance(); // if
    if !p.expect(TokenKind::LParen) {
        return None;
    }
    let condition = parse_expression(p)?;
    if !p.expect(TokenKind::RParen) {
        return None;
    }
    let then_branch = parse_embedded_statement(p)?;

    let node = p.comp.ast.add(NodeKind::If, start);
    p.comp.ast.append_child(node, condition);
    p.comp.ast.append_child(node, then_branch);
    if p.eat(TokenKind::Else) {
        let else_branch = parse_embedded_statement(p)?;
        p.comp.ast.append_child(node, else_branch);
    }
    Some(node)
}

fn parse_while(p: &mut Parser) -> Option<NodeId> {
    let start = p.current_range();
    p.advance(); // while
    if !p.expect(TokenKind::LParen) {
        return None;
    }
    let condition = parse_expression(p)?;
    if !p.expect(TokenKind::RParen) {
        return None;
    }

    let saved = p.scope;
    p.push_scope(ScopeKind::Loop);
    let body = parse_embedded_statement(p);
    p.scope = saved;
    let body = body?;

    let node = p.comp.ast.add(NodeKind::While, start);
    p.comp.ast.append_child(node, condition);
    p.comp.ast.append_child(node, body);
    Some(node)
}

fn parse_do_while(p: &mut Parser) -> Option<NodeId> {
    let start = p.current_range();
    p.advance(); // do

    let saved = p.scope;
    p.push_scope(ScopeKind::Loop);
    let body = parse_embedded_statement(p);
    p.scope = saved;
    let body = body?;

    if !p.expect(TokenKind::While) || !p.expect(TokenKind::LParen) {
        return None;
    }
    let condition = parse_expression(p)?;
    if !p.expect(TokenKind::RParen) {
        return None;
    }
    p.expect(TokenKind::Semicolon);

    let node = p.comp.ast.add(NodeKind::DoWhile, start);
    p.comp.ast.append_child(node, body);
    p.comp.ast.append_child(node, condition);
    Some(node)
}

fn parse_for(p: &mut Parser) -> Option<NodeId> {
    let start = p.current_range();
    p.advance(); // for
    if !p.expect(TokenKind::LParen) {
        return None;
    }

    let saved = p.scope;
    p.push_scope(ScopeKind::Local);
    let result = parse_for_inner(p, start);
    p.scope = saved;
    result
}

fn parse_for_inner(p: &mut Parser, start: Range) -> Option<NodeId> {
    // Initializer.
    let init = if p.at(TokenKind::Semicolon) {
        let node = p.comp.ast.add(NodeKind::Empty, p.current_range());
        p.advance();
        node
    } else if at_declaration_start(p) {
        let wrapper = p.comp.ast.add(NodeKind::Block, p.current_range());
        parse_declaration_statement(p, wrapper)?;
        if p.comp.ast.children(wrapper).len() == 1 {
            p.comp.ast.remove_child_at(wrapper, 0)
        } else {
            wrapper
        }
    } else {
        let expr_start = p.current_range();
        let expr = parse_expression(p)?;
        p.expect(TokenKind::Semicolon);
        let node = p.comp.ast.add(NodeKind::ExpressionStmt, expr_start);
        p.comp.ast.append_child(node, expr);
        node
    };

    // Test.
    let test = if p.at(TokenKind::Semicolon) {
        p.comp.ast.add(NodeKind::Empty, p.current_range())
    } else {
        parse_expression(p)?
    };
    p.expect(TokenKind::Semicolon);

    // Update.
    let update = if p.at(TokenKind::RParen) {
        p.comp.ast.add(NodeKind::Empty, p.current_range())
    } else {
        parse_expression(p)?
    };
    if !p.expect(TokenKind::RParen) {
        return None;
    }

    let saved = p.scope;
    p.push_scope(ScopeKind::Loop);
    let body = parse_embedded_statement(p);
    p.scope = saved;
    let body = body?;

    let node = p.comp.ast.add(NodeKind::For, start);
    p.comp.ast.append_child(node, init);
    p.comp.ast.append_child(node, test);
    p.comp.ast.append_child(node, update);
    p.comp.ast.append_child(node, body);
    Some(node)
}

fn parse_return(p: &mut Parser) -> Option<NodeId> {
    let start = p.current_range();
    p.advance(); // return
    let node = p.comp.ast.add(NodeKind::Return, start);
    if !p.eat(TokenKind::Semicolon) {
        let value = parse_expression(p)?;
        p.comp.ast.append_child(node, value);
        p.expect(TokenKind::Semicolon);
    }
    Some(node)
}

fn parse_jump(p: &mut Parser, kind: NodeKind) -> Option<NodeId> {
    let start = p.current_range();
    p.advance();
    p.expect(TokenKind::Semicolon);
    Some(p.comp.ast.add(kind, start))
}

/// `precision mediump float;`
pub(crate) fn parse_precision(p: &mut Parser) -> Option<NodeId> {
    let start = p.current_range();
    p.advance(); // precision

    let precision = match p.current() {
        TokenKind::Highp => SymbolFlags::HIGHP,
        TokenKind::Mediump => SymbolFlags::MEDIUMP,
        TokenKind::Lowp => SymbolFlags::LOWP,
        _ => {
            p.syntax_error("expected a precision qualifier");
            return None;
        }
    };
    p.advance();

    let ty = match type_from_token(p.current()) {
        Some(ty) => ty,
        None => {
            p.syntax_error("expected a type");
            return None;
        }
    };
    p.advance();
    p.expect(TokenKind::Semicolon);

    let node = p.comp.ast.add(NodeKind::Precision, start);
    p.comp.ast[node].qualifier = precision;
    p.comp.ast[node].ty = Some(ty);
    Some(node)
}
