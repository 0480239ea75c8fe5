//! Pratt expression parser.
//!
//! Operator precedence parsing with binding-power tables. The ladder,
//! loosest to tightest: comma, assignment (right-associative), the hook
//! `?:` (right-associative, tighter than assignment), `||`, `^^`, `&&`,
//! `|`, `^`, `&`, equality, relational, shifts, additive, multiplicative,
//! prefix unary, postfix (`++`, `--`, `.`, `[]`, calls).

use glisten_common::diag::DiagnosticKind;
use glisten_common::ids::NodeId;
use glisten_common::token::TokenKind;
use glisten_common::ty::Literal;

use crate::ast::NodeKind;

use super::{type_from_token, Parser};

// ── Binding power tables ───────────────────────────────────────────────

/// Returns (left_bp, right_bp) for infix operators.
///
/// Left < right is left-associative; left > right is right-associative
/// (assignment). The hook has its own constants below.
fn infix_binding_power(op: TokenKind) -> Option<(u8, u8)> {
    use TokenKind::*;
    match op {
        Comma => Some((1, 2)),

        Eq | PlusEq | MinusEq | StarEq | SlashEq | PercentEq | LtLtEq | GtGtEq | AmpEq
        | PipeEq | CaretEq => Some((4, 3)),

        PipePipe => Some((7, 8)),
        CaretCaret => Some((9, 10)),
        AmpAmp => Some((11, 12)),
        Pipe => Some((13, 14)),
        Caret => Some((15, 16)),
        Amp => Some((17, 18)),
        EqEq | NotEq => Some((19, 20)),
        Lt | Gt | LtEq | GtEq => Some((21, 22)),
        LtLt | GtGt => Some((23, 24)),
        Plus | Minus => Some((25, 26)),
        Star | Slash | Percent => Some((27, 28)),
        _ => None,
    }
}

/// The hook `?:` binds tighter than assignment and associates to the
/// right; its false arm parses at assignment level, so `a ? b : c = d`
/// is `a ? b : (c = d)`.
const HOOK_LEFT_BP: u8 = 6;
const HOOK_RIGHT_BP: u8 = 3;

const PREFIX_BP: u8 = 29;
const POSTFIX_BP: u8 = 31;

fn prefix_kind(op: TokenKind) -> Option<NodeKind> {
    Some(match op {
        TokenKind::Minus => NodeKind::Negative,
        TokenKind::Plus => NodeKind::Positive,
        TokenKind::Bang => NodeKind::Not,
        TokenKind::Tilde => NodeKind::BitNot,
        TokenKind::PlusPlus => NodeKind::PrefixIncrement,
        TokenKind::MinusMinus => NodeKind::PrefixDecrement,
        _ => return None,
    })
}

fn binary_kind(op: TokenKind) -> NodeKind {
    use TokenKind::*;
    match op {
        Plus => NodeKind::Add,
        Minus => NodeKind::Subtract,
        Star => NodeKind::Multiply,
        Slash => NodeKind::Divide,
        Percent => NodeKind::Remainder,
        LtLt => NodeKind::ShiftLeft,
        GtGt => NodeKind::ShiftRight,
        Lt => NodeKind::LessThan,
        Gt => NodeKind::GreaterThan,
        LtEq => NodeKind::LessThanEqual,
        GtEq => NodeKind::GreaterThanEqual,
        EqEq => NodeKind::Equal,
        NotEq => NodeKind::NotEqual,
        Amp => NodeKind::BitAnd,
        Caret => NodeKind::BitXor,
        Pipe => NodeKind::BitOr,
        AmpAmp => NodeKind::LogicalAnd,
        CaretCaret => NodeKind::LogicalXor,
        PipePipe => NodeKind::LogicalOr,
        Eq => NodeKind::Assign,
        PlusEq => NodeKind::AssignAdd,
        MinusEq => NodeKind::AssignSubtract,
        StarEq => NodeKind::AssignMultiply,
        SlashEq => NodeKind::AssignDivide,
        PercentEq => NodeKind::AssignRemainder,
        LtLtEq => NodeKind::AssignShiftLeft,
        GtGtEq => NodeKind::AssignShiftRight,
        AmpEq => NodeKind::AssignBitAnd,
        CaretEq => NodeKind::AssignBitXor,
        PipeEq => NodeKind::AssignBitOr,
        Comma => NodeKind::Sequence,
        _ => unreachable!("not a binary operator: {op:?}"),
    }
}

// ── Entry points ───────────────────────────────────────────────────────

/// Parse a full expression, comma operator included.
pub(crate) fn parse_expression(p: &mut Parser) -> Option<NodeId> {
    expr_bp(p, 0)
}

/// Parse one assignment-level expression: stops at a comma, so it is the
/// right entry point for call arguments, initializers, and array sizes.
pub(crate) fn parse_assignment_expression(p: &mut Parser) -> Option<NodeId> {
    expr_bp(p, 2)
}

// ── The Pratt loop ─────────────────────────────────────────────────────

fn expr_bp(p: &mut Parser, min_bp: u8) -> Option<NodeId> {
    let mut lhs = lhs(p)?;

    loop {
        let current = p.current();

        // ── Postfix: call ──
        if current == TokenKind::LParen && POSTFIX_BP >= min_bp {
            lhs = parse_call(p, lhs)?;
            continue;
        }

        // ── Postfix: member access / swizzle ──
        if current == TokenKind::Dot && POSTFIX_BP >= min_bp {
            p.advance();
            let member_range = p.current_range();
            let member = p.current_text().to_string();
            if !p.expect(TokenKind::Identifier) {
                return None;
            }
            let range = p.comp.ast[lhs].range.merge(member_range);
            let node = p.comp.ast.add(NodeKind::Dot, range);
            p.comp.ast.append_child(node, lhs);
            p.comp.ast[node].literal = Some(Literal::Str(member));
            lhs = node;
            continue;
        }

        // ── Postfix: index ──
        if current == TokenKind::LBracket && POSTFIX_BP >= min_bp {
            p.advance();
            let index = expr_bp(p, 0)?;
            let close = p.current_range();
            if !p.expect(TokenKind::RBracket) {
                return None;
            }
            let range = p.comp.ast[lhs].range.merge(close);
            let node = p.comp.ast.add(NodeKind::Index, range);
            p.comp.ast.append_child(node, lhs);
            p.comp.ast.append_child(node, index);
            lhs = node;
            continue;
        }

        // ── Postfix: increment / decrement ──
        if matches!(current, TokenKind::PlusPlus | TokenKind::MinusMinus) && POSTFIX_BP >= min_bp
        {
            let kind = if current == TokenKind::PlusPlus {
                NodeKind::PostfixIncrement
            } else {
                NodeKind::PostfixDecrement
            };
            let op_range = p.current_range();
            p.advance();
            let range = p.comp.ast[lhs].range.merge(op_range);
            let node = p.comp.ast.add(kind, range);
            p.comp.ast.append_child(node, lhs);
            lhs = node;
            continue;
        }

        // ── The hook ──
        if current == TokenKind::Question && HOOK_LEFT_BP >= min_bp {
            p.advance();
            let true_value = expr_bp(p, 0)?;
            if !p.expect(TokenKind::Colon) {
                return None;
            }
            let false_value = expr_bp(p, HOOK_RIGHT_BP)?;
            let range = p.comp.ast[lhs].range.merge(p.comp.ast[false_value].range);
            let node = p.comp.ast.add(NodeKind::Hook, range);
            p.comp.ast.append_child(node, lhs);
            p.comp.ast.append_child(node, true_value);
            p.comp.ast.append_child(node, false_value);
            lhs = node;
            continue;
        }

        // ── Infix operators ──
        if let Some((left_bp, right_bp)) = infix_binding_power(current) {
            if left_bp < min_bp {
                break;
            }
            let kind = binary_kind(current);
            p.advance();
            let rhs = expr_bp(p, right_bp)?;
            let range = p.comp.ast[lhs].range.merge(p.comp.ast[rhs].range);

            if kind == NodeKind::Sequence && p.comp.ast[lhs].kind == NodeKind::Sequence {
                // Flatten `a, b, c` into one sequence node.
                p.comp.ast.append_child(lhs, rhs);
                p.comp.ast[lhs].range = range;
            } else {
                let node = p.comp.ast.add(kind, range);
                p.comp.ast.append_child(node, lhs);
                p.comp.ast.append_child(node, rhs);
                lhs = node;
            }
            continue;
        }

        break;
    }

    Some(lhs)
}

// ── Atoms and prefix operators ─────────────────────────────────────────

fn lhs(p: &mut Parser) -> Option<NodeId> {
    let current = p.current();

    if let Some(kind) = prefix_kind(current) {
        let op_range = p.current_range();
        p.advance();
        let operand = expr_bp(p, PREFIX_BP)?;
        let range = op_range.merge(p.comp.ast[operand].range);
        let node = p.comp.ast.add(kind, range);
        p.comp.ast.append_child(node, operand);
        return Some(node);
    }

    match current {
        TokenKind::IntLiteral => {
            let range = p.current_range();
            let text = p.current_text().to_string();
            let value = glisten_lexer::decode_int_literal(&text);
            p.advance();
            let node = p.comp.ast.add(NodeKind::IntLiteral, range);
            p.comp.ast[node].literal = Some(Literal::Int { value, text });
            Some(node)
        }

        TokenKind::FloatLiteral => {
            let range = p.current_range();
            let text = p.current_text().to_string();
            let value = glisten_lexer::decode_float_literal(&text);
            p.advance();
            let node = p.comp.ast.add(NodeKind::FloatLiteral, range);
            p.comp.ast[node].literal = Some(Literal::Float { value, text });
            Some(node)
        }

        TokenKind::True | TokenKind::False => {
            let range = p.current_range();
            p.advance();
            let node = p.comp.ast.add(NodeKind::BoolLiteral, range);
            p.comp.ast[node].literal = Some(Literal::Bool(current == TokenKind::True));
            Some(node)
        }

        TokenKind::Identifier => {
            let range = p.current_range();
            let name = p.current_text().to_string();
            p.advance();
            let node = p.comp.ast.add(NodeKind::Name, range);
            // The spelling is kept so unresolved names still emit.
            p.comp.ast[node].literal = Some(Literal::Str(name.clone()));
            match p.comp.scopes.find(p.scope, &name) {
                Some(symbol) => p.comp.ast[node].symbol = Some(symbol),
                None => p.error(
                    DiagnosticKind::UndefinedSymbol,
                    format!("\"{name}\" is not defined"),
                    range,
                ),
            }
            Some(node)
        }

        // A type keyword in expression position is a constructor name.
        kind if kind.is_type_keyword() => {
            let range = p.current_range();
            let ty = type_from_token(kind).expect("type keyword");
            p.advance();
            let node = p.comp.ast.add(NodeKind::Name, range);
            p.comp.ast[node].ty = Some(ty);
            Some(node)
        }

        TokenKind::LParen => {
            p.advance();
            let inner = expr_bp(p, 0)?;
            if !p.expect(TokenKind::RParen) {
                return None;
            }
            Some(inner)
        }

        _ => {
            let found = p.current_text().to_string();
            if found.is_empty() {
                p.syntax_error("expected an expression");
            } else {
                p.syntax_error(format!("expected an expression but found \"{found}\""));
            }
            None
        }
    }
}

/// Parse `(args...)` and wrap `callee` in a call node.
fn parse_call(p: &mut Parser, callee: NodeId) -> Option<NodeId> {
    p.advance(); // (
    let node = p.comp.ast.add(NodeKind::Call, p.comp.ast[callee].range);
    p.comp.ast.append_child(node, callee);

    if !p.at(TokenKind::RParen) {
        loop {
            let arg = parse_assignment_expression(p)?;
            p.comp.ast.append_child(node, arg);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    let close = p.current_range();
    if !p.expect(TokenKind::RParen) {
        return None;
    }
    let range = p.comp.ast[node].range.merge(close);
    p.comp.ast[node].range = range;
    Some(node)
}
