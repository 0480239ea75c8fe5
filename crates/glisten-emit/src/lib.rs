//! Deterministic text emitter.
//!
//! Serializes a (possibly rewritten) tree back to source. Two modes:
//! `remove_whitespace` emits the minimum the grammar needs (a single
//! space only between identifier-like neighbors), otherwise a canonical
//! pretty form with two-space indents, spaced operators, and braces on
//! the same line. Parentheses are re-derived from precedence, literals
//! print their canonical text, symbols print their renamed names, and
//! NATIVE declarations are never emitted.

use glisten_common::ids::NodeId;
use glisten_common::ty::{Literal, Type};
use glisten_parser::ast::{Ast, NodeKind};
use glisten_parser::symbol::{SymbolArena, SymbolFlags};

#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    pub remove_whitespace: bool,
}

/// Serialize the tree rooted at `root` (a GLOBAL node).
pub fn emit(ast: &Ast, symbols: &SymbolArena, root: NodeId, options: &EmitOptions) -> String {
    let mut emitter = Emitter {
        ast,
        symbols,
        minify: options.remove_whitespace,
        out: String::new(),
    };
    emitter.emit_globals(root);
    emitter.out
}

// ── Precedence, for re-inserting parentheses ───────────────────────────

fn precedence(kind: NodeKind) -> u8 {
    use NodeKind::*;
    match kind {
        Sequence => 1,
        kind if kind.is_assign() => 2,
        Hook => 3,
        LogicalOr => 4,
        LogicalXor => 5,
        LogicalAnd => 6,
        BitOr => 7,
        BitXor => 8,
        BitAnd => 9,
        Equal | NotEqual => 10,
        LessThan | GreaterThan | LessThanEqual | GreaterThanEqual => 11,
        ShiftLeft | ShiftRight => 12,
        Add | Subtract => 13,
        Multiply | Divide | Remainder => 14,
        kind if kind.is_unary_prefix() => 15,
        kind if kind.is_unary_postfix() => 16,
        Call | Dot | Index => 16,
        _ => 17,
    }
}

struct Emitter<'a> {
    ast: &'a Ast,
    symbols: &'a SymbolArena,
    minify: bool,
    out: String,
}

impl Emitter<'_> {
    // ── Low-level text ─────────────────────────────────────────────────

    /// Append a token, inserting the one space the grammar needs between
    /// identifier-like neighbors (and between `-`/`-` or `+`/`+`, which
    /// would otherwise lex as increment or decrement).
    fn token(&mut self, text: &str) {
        if let (Some(last), Some(first)) = (self.out.chars().last(), text.chars().next()) {
            let ident_like =
                |c: char| c.is_ascii_alphanumeric() || c == '_';
            let needs_space = (ident_like(last) && ident_like(first))
                || (last == '-' && first == '-')
                || (last == '+' && first == '+');
            if needs_space {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
    }

    /// A space in pretty mode, nothing when minifying.
    fn sp(&mut self) {
        if !self.minify {
            self.out.push(' ');
        }
    }

    fn line_break(&mut self) {
        if !self.minify {
            self.out.push('\n');
        }
    }

    fn write_indent(&mut self, indent: usize) {
        if !self.minify {
            for _ in 0..indent {
                self.out.push_str("  ");
            }
        }
    }

    fn type_text(&self, ty: Type) -> String {
        match ty {
            Type::Struct(symbol) => self.symbols[symbol].output_name().to_string(),
            other => other.to_string(),
        }
    }

    // ── Top level ──────────────────────────────────────────────────────

    fn emit_globals(&mut self, root: NodeId) {
        for &child in self.ast.children(root) {
            self.emit_top_level(child);
        }
    }

    fn emit_top_level(&mut self, node: NodeId) {
        if self.is_native_declaration(node) {
            return;
        }
        match self.ast[node].kind {
            // Modifier blocks left undissolved emit their declarations;
            // the qualifiers already live on the symbols.
            NodeKind::ModifierBlock => {
                for &child in self.ast.children(node) {
                    self.emit_top_level(child);
                }
            }
            _ => self.emit_statement(node, 0),
        }
    }

    /// The builtin API is never emitted.
    fn is_native_declaration(&self, node: NodeId) -> bool {
        match self.ast[node].kind {
            NodeKind::Function | NodeKind::StructDef => self.ast[node]
                .symbol
                .is_some_and(|s| self.symbols[s].is_native()),
            NodeKind::Variables => self
                .ast
                .children(node)
                .first()
                .and_then(|&d| self.ast[d].symbol)
                .is_some_and(|s| self.symbols[s].is_native()),
            _ => false,
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn emit_statement(&mut self, node: NodeId, indent: usize) {
        match self.ast[node].kind {
            // Directives keep their verbatim text and always end the line.
            NodeKind::Version | NodeKind::Extension | NodeKind::Pragma => {
                if let Some(Literal::Str(text)) = &self.ast[node].literal {
                    let text = text.clone();
                    self.write_indent(indent);
                    self.token(&text);
                    self.out.push('\n');
                }
            }
            _ => {
                self.write_indent(indent);
                self.emit_statement_core(node, indent);
                self.line_break();
            }
        }
    }

    /// The statement itself, without leading indent or trailing break.
    fn emit_statement_core(&mut self, node: NodeId, indent: usize) {
        match self.ast[node].kind {
            NodeKind::Empty => self.token(";"),

            NodeKind::Block => self.emit_block(node, indent),

            NodeKind::ExpressionStmt => {
                let expr = self.ast.child(node, 0);
                self.emit_expression(expr, 1);
                self.token(";");
            }

            NodeKind::Variables => self.emit_variables(node),

            NodeKind::Function => self.emit_function(node, indent),

            NodeKind::StructDef => self.emit_struct(node, indent),

            NodeKind::Precision => {
                self.token("precision");
                self.emit_precision_qualifier(self.ast[node].qualifier);
                if let Some(ty) = self.ast[node].ty {
                    let text = self.type_text(ty);
                    self.token(&text);
                }
                self.token(";");
            }

            NodeKind::If => self.emit_if(node, indent),

            NodeKind::While => {
                let test = self.ast.child(node, 0);
                let body = self.ast.child(node, 1);
                self.token("while");
                self.sp();
                self.token("(");
                self.emit_expression(test, 1);
                self.token(")");
                self.emit_embedded(body, indent);
            }

            NodeKind::DoWhile => {
                let body = self.ast.child(node, 0);
                let test = self.ast.child(node, 1);
                self.token("do");
                self.emit_embedded(body, indent);
                self.sp();
                self.token("while");
                self.sp();
                self.token("(");
                self.emit_expression(test, 1);
                self.token(")");
                self.token(";");
            }

            NodeKind::For => {
                let init = self.ast.child(node, 0);
                let test = self.ast.child(node, 1);
                let update = self.ast.child(node, 2);
                let body = self.ast.child(node, 3);
                self.token("for");
                self.sp();
                self.token("(");
                // The initializer statement carries its own `;`.
                self.emit_statement_core(init, indent);
                if self.ast[test].kind != NodeKind::Empty {
                    self.sp();
                    self.emit_expression(test, 1);
                }
                self.token(";");
                if self.ast[update].kind != NodeKind::Empty {
                    self.sp();
                    self.emit_expression(update, 1);
                }
                self.token(")");
                self.emit_embedded(body, indent);
            }

            NodeKind::Return => {
                self.token("return");
                if let Some(&value) = self.ast.children(node).first() {
                    self.sp();
                    self.emit_expression(value, 1);
                }
                self.token(";");
            }

            NodeKind::Discard => {
                self.token("discard");
                self.token(";");
            }
            NodeKind::Continue => {
                self.token("continue");
                self.token(";");
            }
            NodeKind::Break => {
                self.token("break");
                self.token(";");
            }

            NodeKind::ModifierBlock => {
                // Statement position should not happen, but stay total.
                for &child in self.ast.children(node).to_vec().iter() {
                    self.emit_statement_core(child, indent);
                }
            }

            _ => {}
        }
    }

    fn emit_block(&mut self, node: NodeId, indent: usize) {
        self.token("{");
        self.line_break();
        for &child in self.ast.children(node) {
            self.emit_statement(child, indent + 1);
        }
        self.write_indent(indent);
        self.token("}");
    }

    /// A loop body or `if` arm: a block on the same line, or a single
    /// statement inline.
    fn emit_embedded(&mut self, node: NodeId, indent: usize) {
        if self.ast[node].kind == NodeKind::Block {
            self.sp();
            self.emit_block(node, indent);
        } else {
            self.sp();
            self.emit_statement_core(node, indent);
        }
    }

    fn emit_if(&mut self, node: NodeId, indent: usize) {
        let children = self.ast.children(node).to_vec();
        self.token("if");
        self.sp();
        self.token("(");
        self.emit_expression(children[0], 1);
        self.token(")");
        self.emit_embedded(children[1], indent);
        if let Some(&else_branch) = children.get(2) {
            self.sp();
            self.token("else");
            if self.ast[else_branch].kind == NodeKind::If {
                // `else if` chains stay flat.
                self.sp();
                self.emit_if(else_branch, indent);
            } else {
                self.emit_embedded(else_branch, indent);
            }
        }
    }

    // ── Declarations ───────────────────────────────────────────────────

    fn emit_qualifiers(&mut self, flags: SymbolFlags) {
        if flags.contains(SymbolFlags::INVARIANT) {
            self.token("invariant");
        }
        if flags.contains(SymbolFlags::CONST) {
            self.token("const");
        }
        if flags.contains(SymbolFlags::ATTRIBUTE) {
            self.token("attribute");
        }
        if flags.contains(SymbolFlags::UNIFORM) {
            self.token("uniform");
        }
        if flags.contains(SymbolFlags::VARYING) {
            self.token("varying");
        }
        if flags.contains(SymbolFlags::IN) {
            self.token("in");
        }
        if flags.contains(SymbolFlags::OUT) {
            self.token("out");
        }
        if flags.contains(SymbolFlags::INOUT) {
            self.token("inout");
        }
        self.emit_precision_qualifier(flags);
    }

    fn emit_precision_qualifier(&mut self, flags: SymbolFlags) {
        if flags.contains(SymbolFlags::HIGHP) {
            self.token("highp");
        }
        if flags.contains(SymbolFlags::MEDIUMP) {
            self.token("mediump");
        }
        if flags.contains(SymbolFlags::LOWP) {
            self.token("lowp");
        }
    }

    fn emit_variables(&mut self, node: NodeId) {
        let declarators = self.ast.children(node).to_vec();
        let Some(&first) = declarators.first() else {
            return;
        };
        let Some(symbol) = self.ast[first].symbol else {
            return;
        };
        let flags = self.symbols[symbol].flags;
        let ty = self.symbols[symbol].ty;

        self.emit_qualifiers(flags);
        let text = self.type_text(ty);
        self.token(&text);

        for (index, &declarator) in declarators.iter().enumerate() {
            if index > 0 {
                self.token(",");
                self.sp();
            }
            self.emit_declarator(declarator);
        }
        self.token(";");
    }

    fn emit_declarator(&mut self, declarator: NodeId) {
        let Some(symbol) = self.ast[declarator].symbol else {
            return;
        };
        let name = self.symbols[symbol].output_name().to_string();
        self.token(&name);

        let size = self.ast.child(declarator, 0);
        if self.ast[size].kind != NodeKind::Empty {
            self.token("[");
            self.emit_expression(size, 1);
            self.token("]");
        } else if self.symbols[symbol].array_size == Some(None) {
            self.token("[");
            self.token("]");
        }

        if self.ast.children(declarator).len() > 1 {
            let init = self.ast.child(declarator, 1);
            if self.ast[init].kind != NodeKind::Empty {
                self.sp();
                self.token("=");
                self.sp();
                self.emit_expression(init, 2);
            }
        }
    }

    fn emit_function(&mut self, node: NodeId, indent: usize) {
        let Some(symbol) = self.ast[node].symbol else {
            return;
        };
        let return_text = self.type_text(self.symbols[symbol].ty);
        self.token(&return_text);
        let name = self.symbols[symbol].output_name().to_string();
        self.token(&name);
        self.token("(");

        let children = self.ast.children(node).to_vec();
        let mut wrote_parameter = false;
        for &child in &children {
            if self.ast[child].kind != NodeKind::Variable {
                continue;
            }
            if wrote_parameter {
                self.token(",");
                self.sp();
            }
            wrote_parameter = true;
            self.emit_parameter(child);
        }
        self.token(")");

        match children.last() {
            Some(&body) if self.ast[body].kind == NodeKind::Block => {
                self.sp();
                self.emit_block(body, indent);
            }
            _ => self.token(";"),
        }
    }

    fn emit_parameter(&mut self, parameter: NodeId) {
        let Some(symbol) = self.ast[parameter].symbol else {
            return;
        };
        self.emit_qualifiers(self.symbols[symbol].flags);
        let text = self.type_text(self.symbols[symbol].ty);
        self.token(&text);
        if !self.symbols[symbol].name.is_empty() {
            let name = self.symbols[symbol].output_name().to_string();
            self.token(&name);
        }
        let size = self.ast.child(parameter, 0);
        if self.ast[size].kind != NodeKind::Empty {
            self.token("[");
            self.emit_expression(size, 1);
            self.token("]");
        } else if self.symbols[symbol].array_size == Some(None) {
            self.token("[");
            self.token("]");
        }
    }

    fn emit_struct(&mut self, node: NodeId, indent: usize) {
        let Some(symbol) = self.ast[node].symbol else {
            return;
        };
        self.token("struct");
        let name = self.symbols[symbol].output_name().to_string();
        self.token(&name);
        self.sp();
        self.token("{");
        self.line_break();
        for &field in self.ast.children(node).to_vec().iter() {
            self.write_indent(indent + 1);
            self.emit_variables(field);
            self.line_break();
        }
        self.write_indent(indent);
        self.token("}");
        self.token(";");
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn emit_expression(&mut self, node: NodeId, min_precedence: u8) {
        let kind = self.ast[node].kind;
        let prec = precedence(kind);
        let parenthesize = prec < min_precedence;
        if parenthesize {
            self.token("(");
        }
        self.emit_expression_core(node, prec);
        if parenthesize {
            self.token(")");
        }
    }

    fn emit_expression_core(&mut self, node: NodeId, prec: u8) {
        let kind = self.ast[node].kind;
        match kind {
            NodeKind::BoolLiteral | NodeKind::IntLiteral | NodeKind::FloatLiteral => {
                let text = match &self.ast[node].literal {
                    Some(Literal::Bool(true)) => "true".to_string(),
                    Some(Literal::Bool(false)) => "false".to_string(),
                    Some(Literal::Int { text, .. }) => text.clone(),
                    Some(Literal::Float { text, .. }) => text.clone(),
                    _ => String::new(),
                };
                self.token(&text);
            }

            NodeKind::Name => {
                let text = match self.ast[node].symbol {
                    Some(symbol) => self.symbols[symbol].output_name().to_string(),
                    None => match (&self.ast[node].literal, self.ast[node].ty) {
                        (Some(Literal::Str(name)), _) => name.clone(),
                        (_, Some(ty)) => self.type_text(ty),
                        _ => String::new(),
                    },
                };
                self.token(&text);
            }

            NodeKind::Call => {
                let children = self.ast.children(node).to_vec();
                self.emit_expression(children[0], prec);
                self.token("(");
                for (index, &argument) in children[1..].iter().enumerate() {
                    if index > 0 {
                        self.token(",");
                        self.sp();
                    }
                    self.emit_expression(argument, 2);
                }
                self.token(")");
            }

            NodeKind::Dot => {
                let object = self.ast.child(node, 0);
                self.emit_expression(object, prec);
                self.token(".");
                let member = match (self.ast[node].symbol, &self.ast[node].literal) {
                    (Some(field), _) => self.symbols[field].output_name().to_string(),
                    (None, Some(Literal::Str(member))) => member.clone(),
                    _ => String::new(),
                };
                self.token(&member);
            }

            NodeKind::Index => {
                let object = self.ast.child(node, 0);
                let index = self.ast.child(node, 1);
                self.emit_expression(object, prec);
                self.token("[");
                self.emit_expression(index, 1);
                self.token("]");
            }

            NodeKind::Hook => {
                let children = self.ast.children(node).to_vec();
                self.emit_expression(children[0], prec + 1);
                self.sp();
                self.token("?");
                self.sp();
                self.emit_expression(children[1], 1);
                self.sp();
                self.token(":");
                self.sp();
                self.emit_expression(children[2], prec);
            }

            NodeKind::Sequence => {
                for (index, &child) in self.ast.children(node).to_vec().iter().enumerate() {
                    if index > 0 {
                        self.token(",");
                        self.sp();
                    }
                    self.emit_expression(child, 2);
                }
            }

            kind if kind.is_unary_prefix() => {
                let text = kind.operator_text().unwrap_or("");
                self.token(text);
                let operand = self.ast.child(node, 0);
                self.emit_expression(operand, prec);
            }

            kind if kind.is_unary_postfix() => {
                let operand = self.ast.child(node, 0);
                self.emit_expression(operand, prec);
                let text = kind.operator_text().unwrap_or("");
                self.token(text);
            }

            kind if kind.is_assign() => {
                let left = self.ast.child(node, 0);
                let right = self.ast.child(node, 1);
                self.emit_expression(left, prec + 1);
                self.sp();
                self.token(kind.operator_text().unwrap_or(""));
                self.sp();
                self.emit_expression(right, prec);
            }

            kind if kind.is_binary() => {
                let left = self.ast.child(node, 0);
                let right = self.ast.child(node, 1);
                self.emit_expression(left, prec);
                self.sp();
                self.token(kind.operator_text().unwrap_or(""));
                self.sp();
                self.emit_expression(right, prec + 1);
            }

            _ => {}
        }
    }
}
