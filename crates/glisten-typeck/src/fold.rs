//! Constant expression evaluation.
//!
//! Shared by the checker (`const` initializers, array sizes, constant `if`
//! tests) and the rewriter (constant folding). Evaluation reads through
//! `const` variables to their initializers; integer arithmetic wraps
//! two's-complement 32-bit; float arithmetic follows IEEE-754, and any
//! non-finite result abandons the fold because the shading language has no
//! literal syntax for NaN or infinity.

use glisten_common::ids::NodeId;
use glisten_common::ty::Literal;
use glisten_parser::ast::{Ast, NodeKind};
use glisten_parser::symbol::{SymbolArena, SymbolFlags, SymbolKind};

/// A fully evaluated scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f64),
}

impl Value {
    pub fn to_literal(self) -> Literal {
        match self {
            Value::Bool(b) => Literal::Bool(b),
            Value::Int(i) => Literal::int(i),
            Value::Float(f) => Literal::float(f),
        }
    }
}

/// Outcome of a fold attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fold {
    Value(Value),
    /// Integer division or remainder by a constant zero.
    DivisionByZero,
    NotConstant,
}

/// Evaluate `node` if it is a scalar constant expression.
pub fn fold(ast: &Ast, symbols: &SymbolArena, node: NodeId) -> Fold {
    use Fold::*;
    let kind = ast[node].kind;
    match kind {
        NodeKind::BoolLiteral | NodeKind::IntLiteral | NodeKind::FloatLiteral => {
            match ast[node].literal.as_ref() {
                Some(Literal::Bool(b)) => Value(self::Value::Bool(*b)),
                Some(Literal::Int { value, .. }) => Value(self::Value::Int(*value)),
                Some(Literal::Float { value, .. }) => Value(self::Value::Float(*value)),
                _ => NotConstant,
            }
        }

        // A const variable evaluates to its initializer.
        NodeKind::Name => {
            let Some(symbol) = ast[node].symbol else {
                return NotConstant;
            };
            let symbol = &symbols[symbol];
            if symbol.kind != SymbolKind::Variable
                || !symbol.flags.contains(SymbolFlags::CONST)
                || symbol.array_size.is_some()
            {
                return NotConstant;
            }
            let declarator = symbol.node;
            if ast[declarator].kind != NodeKind::Variable || ast.children(declarator).len() < 2 {
                return NotConstant;
            }
            let init = ast.child(declarator, 1);
            if ast[init].kind == NodeKind::Empty {
                return NotConstant;
            }
            fold(ast, symbols, init)
        }

        NodeKind::Positive => fold(ast, symbols, ast.child(node, 0)),
        NodeKind::Negative => match fold(ast, symbols, ast.child(node, 0)) {
            Value(self::Value::Int(i)) => Value(self::Value::Int(i.wrapping_neg())),
            Value(self::Value::Float(f)) => Value(self::Value::Float(-f)),
            other => not_value(other),
        },
        NodeKind::Not => match fold(ast, symbols, ast.child(node, 0)) {
            Value(self::Value::Bool(b)) => Value(self::Value::Bool(!b)),
            other => not_value(other),
        },
        NodeKind::BitNot => match fold(ast, symbols, ast.child(node, 0)) {
            Value(self::Value::Int(i)) => Value(self::Value::Int(!i)),
            other => not_value(other),
        },

        // Short-circuit operators evaluate lazily: a constant-false left
        // side decides `&&` no matter what the right side is.
        NodeKind::LogicalAnd => match fold(ast, symbols, ast.child(node, 0)) {
            Value(self::Value::Bool(false)) => Value(self::Value::Bool(false)),
            Value(self::Value::Bool(true)) => match fold(ast, symbols, ast.child(node, 1)) {
                Value(self::Value::Bool(b)) => Value(self::Value::Bool(b)),
                other => not_value(other),
            },
            other => not_value(other),
        },
        NodeKind::LogicalOr => match fold(ast, symbols, ast.child(node, 0)) {
            Value(self::Value::Bool(true)) => Value(self::Value::Bool(true)),
            Value(self::Value::Bool(false)) => match fold(ast, symbols, ast.child(node, 1)) {
                Value(self::Value::Bool(b)) => Value(self::Value::Bool(b)),
                other => not_value(other),
            },
            other => not_value(other),
        },

        NodeKind::Hook => match fold(ast, symbols, ast.child(node, 0)) {
            Value(self::Value::Bool(test)) => {
                let arm = if test { 1 } else { 2 };
                fold(ast, symbols, ast.child(node, arm))
            }
            other => not_value(other),
        },

        kind if kind.is_binary() => {
            let left = match fold(ast, symbols, ast.child(node, 0)) {
                Value(v) => v,
                other => return not_value(other),
            };
            let right = match fold(ast, symbols, ast.child(node, 1)) {
                Value(v) => v,
                other => return not_value(other),
            };
            fold_binary(kind, left, right)
        }

        _ => NotConstant,
    }
}

/// Evaluate a constant test to a boolean, for control-flow analysis and
/// dead-branch elimination.
pub fn fold_bool(ast: &Ast, symbols: &SymbolArena, node: NodeId) -> Option<bool> {
    match fold(ast, symbols, node) {
        Fold::Value(Value::Bool(b)) => Some(b),
        _ => None,
    }
}

/// Propagate division-by-zero; anything else non-value becomes NotConstant.
fn not_value(fold: Fold) -> Fold {
    match fold {
        Fold::DivisionByZero => Fold::DivisionByZero,
        _ => Fold::NotConstant,
    }
}

fn fold_binary(op: NodeKind, left: Value, right: Value) -> Fold {
    use Fold::*;
    use NodeKind::*;
    match (left, right) {
        (self::Value::Int(a), self::Value::Int(b)) => match op {
            Add => Value(self::Value::Int(a.wrapping_add(b))),
            Subtract => Value(self::Value::Int(a.wrapping_sub(b))),
            Multiply => Value(self::Value::Int(a.wrapping_mul(b))),
            Divide => {
                if b == 0 {
                    DivisionByZero
                } else {
                    Value(self::Value::Int(a.wrapping_div(b)))
                }
            }
            Remainder => {
                if b == 0 {
                    DivisionByZero
                } else {
                    Value(self::Value::Int(a.wrapping_rem(b)))
                }
            }
            ShiftLeft => Value(self::Value::Int(a.wrapping_shl(b as u32))),
            ShiftRight => Value(self::Value::Int(a.wrapping_shr(b as u32))),
            BitAnd => Value(self::Value::Int(a & b)),
            BitXor => Value(self::Value::Int(a ^ b)),
            BitOr => Value(self::Value::Int(a | b)),
            LessThan => Value(self::Value::Bool(a < b)),
            GreaterThan => Value(self::Value::Bool(a > b)),
            LessThanEqual => Value(self::Value::Bool(a <= b)),
            GreaterThanEqual => Value(self::Value::Bool(a >= b)),
            Equal => Value(self::Value::Bool(a == b)),
            NotEqual => Value(self::Value::Bool(a != b)),
            _ => NotConstant,
        },

        (self::Value::Float(a), self::Value::Float(b)) => match op {
            Add | Subtract | Multiply | Divide => {
                let result = match op {
                    Add => a + b,
                    Subtract => a - b,
                    Multiply => a * b,
                    _ => a / b,
                };
                if result.is_finite() {
                    Value(self::Value::Float(result))
                } else {
                    // No NaN/Inf literals: leave the expression as written.
                    NotConstant
                }
            }
            LessThan => Value(self::Value::Bool(a < b)),
            GreaterThan => Value(self::Value::Bool(a > b)),
            LessThanEqual => Value(self::Value::Bool(a <= b)),
            GreaterThanEqual => Value(self::Value::Bool(a >= b)),
            Equal => Value(self::Value::Bool(a == b)),
            NotEqual => Value(self::Value::Bool(a != b)),
            _ => NotConstant,
        },

        (self::Value::Bool(a), self::Value::Bool(b)) => match op {
            LogicalXor => Value(self::Value::Bool(a != b)),
            Equal => Value(self::Value::Bool(a == b)),
            NotEqual => Value(self::Value::Bool(a != b)),
            _ => NotConstant,
        },

        // No implicit conversions.
        _ => NotConstant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glisten_common::source::{Range, SourceId};

    fn range() -> Range {
        Range::new(SourceId(0), 0, 0)
    }

    fn int(ast: &mut Ast, value: i32) -> NodeId {
        let node = ast.add(NodeKind::IntLiteral, range());
        ast[node].literal = Some(Literal::int(value));
        node
    }

    fn float(ast: &mut Ast, value: f64) -> NodeId {
        let node = ast.add(NodeKind::FloatLiteral, range());
        ast[node].literal = Some(Literal::float(value));
        node
    }

    fn binary(ast: &mut Ast, kind: NodeKind, lhs: NodeId, rhs: NodeId) -> NodeId {
        let node = ast.add(kind, range());
        ast.append_child(node, lhs);
        ast.append_child(node, rhs);
        node
    }

    #[test]
    fn int_arithmetic_wraps() {
        let mut ast = Ast::new();
        let symbols = SymbolArena::new();
        let a = int(&mut ast, i32::MAX);
        let b = int(&mut ast, 1);
        let sum = binary(&mut ast, NodeKind::Add, a, b);
        assert_eq!(
            fold(&ast, &symbols, sum),
            Fold::Value(Value::Int(i32::MIN))
        );
    }

    #[test]
    fn division_by_zero_is_flagged() {
        let mut ast = Ast::new();
        let symbols = SymbolArena::new();
        let a = int(&mut ast, 4);
        let b = int(&mut ast, 0);
        let div = binary(&mut ast, NodeKind::Divide, a, b);
        assert_eq!(fold(&ast, &symbols, div), Fold::DivisionByZero);
    }

    #[test]
    fn float_division_by_zero_is_left_unfolded() {
        let mut ast = Ast::new();
        let symbols = SymbolArena::new();
        let a = float(&mut ast, 1.0);
        let b = float(&mut ast, 0.0);
        let div = binary(&mut ast, NodeKind::Divide, a, b);
        assert_eq!(fold(&ast, &symbols, div), Fold::NotConstant);
    }

    #[test]
    fn mixed_scalar_kinds_do_not_fold() {
        let mut ast = Ast::new();
        let symbols = SymbolArena::new();
        let a = int(&mut ast, 1);
        let b = float(&mut ast, 1.0);
        let sum = binary(&mut ast, NodeKind::Add, a, b);
        assert_eq!(fold(&ast, &symbols, sum), Fold::NotConstant);
    }

    #[test]
    fn short_circuit_ignores_non_constant_right_side() {
        let mut ast = Ast::new();
        let symbols = SymbolArena::new();
        let lhs = ast.add(NodeKind::BoolLiteral, range());
        ast[lhs].literal = Some(Literal::Bool(false));
        // An unresolved name is not constant.
        let rhs = ast.add(NodeKind::Name, range());
        let and = binary(&mut ast, NodeKind::LogicalAnd, lhs, rhs);
        assert_eq!(fold(&ast, &symbols, and), Fold::Value(Value::Bool(false)));
    }

    #[test]
    fn hook_takes_the_constant_branch() {
        let mut ast = Ast::new();
        let symbols = SymbolArena::new();
        let cond = ast.add(NodeKind::BoolLiteral, range());
        ast[cond].literal = Some(Literal::Bool(true));
        let a = int(&mut ast, 1);
        let b = int(&mut ast, 2);
        let hook = ast.add(NodeKind::Hook, range());
        ast.append_child(hook, cond);
        ast.append_child(hook, a);
        ast.append_child(hook, b);
        assert_eq!(fold(&ast, &symbols, hook), Fold::Value(Value::Int(1)));
    }
}
