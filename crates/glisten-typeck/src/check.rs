//! The resolver / type checker.
//!
//! One walk over the tree: declarations first (array sizes, initializers,
//! `const` rules), expressions bottom-up. Every expression node gets a
//! type; failures produce `Type::Error`, which propagates silently so one
//! mistake does not storm the log. The checker never halts early.

use glisten_common::diag::DiagnosticKind;
use glisten_common::ids::NodeId;
use glisten_common::ty::{Literal, Type};
use glisten_parser::ast::NodeKind;
use glisten_parser::symbol::{SymbolFlags, SymbolKind};
use glisten_parser::Compilation;

use crate::fold::{self, Fold, Value};

/// Type-check the whole compilation.
pub fn check(comp: &mut Compilation) {
    let root = comp.global_node;
    let mut checker = Checker {
        comp,
        return_type: None,
        loop_depth: 0,
    };
    checker.check_statement(root);
}

struct Checker<'c> {
    comp: &'c mut Compilation,
    /// Return type of the function being checked.
    return_type: Option<Type>,
    loop_depth: u32,
}

impl Checker<'_> {
    fn error(&mut self, kind: DiagnosticKind, message: String, node: NodeId) {
        let range = self.comp.ast[node].range;
        self.comp.log.error(kind, message, range);
    }

    /// Human name for a type; structs print their declared name.
    fn type_name(&self, ty: Type) -> String {
        match ty {
            Type::Struct(symbol) => self.comp.symbols[symbol].name.clone(),
            other => other.to_string(),
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn check_statement(&mut self, node: NodeId) {
        let kind = self.comp.ast[node].kind;
        match kind {
            NodeKind::Global | NodeKind::Block | NodeKind::ModifierBlock | NodeKind::StructDef => {
                for child in self.comp.ast.children(node).to_vec() {
                    self.check_statement(child);
                }
            }

            NodeKind::Variables => {
                for child in self.comp.ast.children(node).to_vec() {
                    self.check_variable(child);
                }
            }

            NodeKind::Function => {
                let children = self.comp.ast.children(node).to_vec();
                let symbol = self.comp.ast[node].symbol;
                for &child in &children {
                    if self.comp.ast[child].kind == NodeKind::Variable {
                        self.check_variable(child);
                    }
                }
                if let Some(&body) = children.last() {
                    if self.comp.ast[body].kind == NodeKind::Block {
                        let saved = self.return_type.take();
                        let saved_depth = self.loop_depth;
                        self.return_type = symbol.map(|s| self.comp.symbols[s].ty);
                        self.loop_depth = 0;
                        self.check_statement(body);
                        self.return_type = saved;
                        self.loop_depth = saved_depth;
                    }
                }
            }

            NodeKind::If => {
                let condition = self.comp.ast.child(node, 0);
                self.check_condition(condition);
                let children = self.comp.ast.children(node).to_vec();
                self.check_statement(children[1]);
                if let Some(&else_branch) = children.get(2) {
                    self.check_statement(else_branch);
                }
            }

            NodeKind::While => {
                let condition = self.comp.ast.child(node, 0);
                self.check_condition(condition);
                let body = self.comp.ast.child(node, 1);
                self.loop_depth += 1;
                self.check_statement(body);
                self.loop_depth -= 1;
            }

            NodeKind::DoWhile => {
                let body = self.comp.ast.child(node, 0);
                self.loop_depth += 1;
                self.check_statement(body);
                self.loop_depth -= 1;
                let condition = self.comp.ast.child(node, 1);
                self.check_condition(condition);
            }

            NodeKind::For => {
                let init = self.comp.ast.child(node, 0);
                self.check_statement(init);
                let test = self.comp.ast.child(node, 1);
                if self.comp.ast[test].kind != NodeKind::Empty {
                    self.check_condition(test);
                }
                let update = self.comp.ast.child(node, 2);
                if self.comp.ast[update].kind != NodeKind::Empty {
                    self.check_expression(update);
                }
                let body = self.comp.ast.child(node, 3);
                self.loop_depth += 1;
                self.check_statement(body);
                self.loop_depth -= 1;
            }

            NodeKind::Return => {
                let expected = self.return_type.unwrap_or(Type::Error);
                let value = self.comp.ast.children(node).first().copied();
                match value {
                    Some(value) => {
                        let found = self.check_expression(value);
                        if expected == Type::Void {
                            self.error(
                                DiagnosticKind::TypeMismatch,
                                "cannot return a value from a void function".to_string(),
                                node,
                            );
                        } else if found != expected && found != Type::Error && expected != Type::Error
                        {
                            self.error(
                                DiagnosticKind::TypeMismatch,
                                format!(
                                    "expected a return value of type \"{}\" but found \"{}\"",
                                    self.type_name(expected),
                                    self.type_name(found)
                                ),
                                value,
                            );
                        }
                    }
                    None => {
                        if expected != Type::Void && expected != Type::Error {
                            self.error(
                                DiagnosticKind::TypeMismatch,
                                format!(
                                    "must return a value of type \"{}\"",
                                    self.type_name(expected)
                                ),
                                node,
                            );
                        }
                    }
                }
            }

            NodeKind::Break | NodeKind::Continue => {
                if self.loop_depth == 0 {
                    let what = if kind == NodeKind::Break {
                        "break"
                    } else {
                        "continue"
                    };
                    self.error(
                        DiagnosticKind::OutsideLoop,
                        format!("cannot use \"{what}\" outside a loop"),
                        node,
                    );
                }
            }

            NodeKind::ExpressionStmt => {
                let expr = self.comp.ast.child(node, 0);
                self.check_expression(expr);
            }

            NodeKind::Discard
            | NodeKind::Empty
            | NodeKind::Precision
            | NodeKind::Version
            | NodeKind::Extension
            | NodeKind::Pragma => {}

            _ => {}
        }
    }

    fn check_condition(&mut self, node: NodeId) {
        let ty = self.check_expression(node);
        if ty != Type::Bool && ty != Type::Error {
            self.error(
                DiagnosticKind::TypeMismatch,
                format!(
                    "expected a condition of type \"bool\" but found \"{}\"",
                    self.type_name(ty)
                ),
                node,
            );
        }
    }

    /// One declarator: array size, initializer, `const` rules.
    fn check_variable(&mut self, node: NodeId) {
        let Some(symbol) = self.comp.ast[node].symbol else {
            return;
        };
        let declared = self.comp.symbols[symbol].ty;
        let flags = self.comp.symbols[symbol].flags;

        let size = self.comp.ast.child(node, 0);
        if self.comp.ast[size].kind != NodeKind::Empty {
            let size_ty = self.check_expression(size);
            if size_ty != Type::Int && size_ty != Type::Error {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    "array size must be an int".to_string(),
                    size,
                );
            } else {
                match fold::fold(&self.comp.ast, &self.comp.symbols, size) {
                    Fold::Value(Value::Int(n)) if n > 0 => {
                        self.comp.symbols[symbol].array_size = Some(Some(n as u32));
                    }
                    Fold::Value(Value::Int(_)) => {
                        self.error(
                            DiagnosticKind::TypeMismatch,
                            "array size must be greater than zero".to_string(),
                            size,
                        );
                    }
                    _ if size_ty == Type::Error => {}
                    _ => {
                        self.error(
                            DiagnosticKind::TypeMismatch,
                            "array size must be a constant".to_string(),
                            size,
                        );
                    }
                }
            }
        }

        let init = self.comp.ast.child(node, 1);
        let has_init = self.comp.ast[init].kind != NodeKind::Empty;
        if has_init {
            let found = self.check_expression(init);
            if found != declared && found != Type::Error && declared != Type::Error {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "cannot initialize \"{}\" of type \"{}\" with \"{}\"",
                        self.comp.symbols[symbol].name,
                        self.type_name(declared),
                        self.type_name(found)
                    ),
                    init,
                );
            }
        }

        if flags.contains(SymbolFlags::CONST) {
            if !has_init {
                self.error(
                    DiagnosticKind::ConstNeedsLiteralInit,
                    format!(
                        "\"{}\" is const and must be initialized",
                        self.comp.symbols[symbol].name
                    ),
                    node,
                );
            } else if !self.is_constant_expression(init) {
                self.error(
                    DiagnosticKind::ConstNeedsLiteralInit,
                    format!(
                        "the initializer of \"{}\" must be a constant expression",
                        self.comp.symbols[symbol].name
                    ),
                    init,
                );
            }
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn set(&mut self, node: NodeId, ty: Type) -> Type {
        self.comp.ast[node].ty = Some(ty);
        ty
    }

    fn check_expression(&mut self, node: NodeId) -> Type {
        let kind = self.comp.ast[node].kind;
        match kind {
            NodeKind::BoolLiteral => self.set(node, Type::Bool),
            NodeKind::IntLiteral => self.set(node, Type::Int),
            NodeKind::FloatLiteral => self.set(node, Type::Float),

            NodeKind::Name => {
                if let Some(symbol) = self.comp.ast[node].symbol {
                    match self.comp.symbols[symbol].kind {
                        SymbolKind::Variable => {
                            let ty = self.comp.symbols[symbol].ty;
                            self.set(node, ty)
                        }
                        SymbolKind::Function => {
                            self.error(
                                DiagnosticKind::TypeMismatch,
                                format!(
                                    "the function \"{}\" must be called",
                                    self.comp.symbols[symbol].name
                                ),
                                node,
                            );
                            self.set(node, Type::Error)
                        }
                        SymbolKind::Struct => {
                            self.error(
                                DiagnosticKind::TypeMismatch,
                                format!(
                                    "cannot use the type \"{}\" as a value",
                                    self.comp.symbols[symbol].name
                                ),
                                node,
                            );
                            self.set(node, Type::Error)
                        }
                    }
                } else if self.comp.ast[node].ty.is_some() {
                    // A bare type keyword outside of a constructor call.
                    self.error(
                        DiagnosticKind::TypeMismatch,
                        "expected an expression".to_string(),
                        node,
                    );
                    self.set(node, Type::Error)
                } else {
                    // Unresolved; already reported by the parser.
                    self.set(node, Type::Error)
                }
            }

            NodeKind::Negative | NodeKind::Positive => {
                let operand = self.comp.ast.child(node, 0);
                let ty = self.check_expression(operand);
                if ty == Type::Error || is_arithmetic(ty) {
                    self.set(node, ty)
                } else {
                    self.unary_mismatch(node, kind, ty)
                }
            }

            NodeKind::Not => {
                let operand = self.comp.ast.child(node, 0);
                let ty = self.check_expression(operand);
                if ty == Type::Bool || ty == Type::Error {
                    self.set(node, ty)
                } else {
                    self.unary_mismatch(node, kind, ty)
                }
            }

            NodeKind::BitNot => {
                let operand = self.comp.ast.child(node, 0);
                let ty = self.check_expression(operand);
                if ty == Type::Int || ty == Type::Error {
                    self.set(node, ty)
                } else {
                    self.unary_mismatch(node, kind, ty)
                }
            }

            NodeKind::PrefixIncrement
            | NodeKind::PrefixDecrement
            | NodeKind::PostfixIncrement
            | NodeKind::PostfixDecrement => {
                let operand = self.comp.ast.child(node, 0);
                let ty = self.check_expression(operand);
                if ty == Type::Error {
                    return self.set(node, ty);
                }
                if !is_arithmetic(ty) {
                    return self.unary_mismatch(node, kind, ty);
                }
                if !self.is_lvalue(operand) {
                    self.error(
                        DiagnosticKind::BadLValue,
                        "the operand of an increment or decrement must be assignable"
                            .to_string(),
                        operand,
                    );
                    return self.set(node, Type::Error);
                }
                self.set(node, ty)
            }

            kind if kind.is_binary() => {
                let left_node = self.comp.ast.child(node, 0);
                let right_node = self.comp.ast.child(node, 1);
                let left = self.check_expression(left_node);
                let right = self.check_expression(right_node);
                match binary_result_type(kind, left, right) {
                    Some(ty) => self.set(node, ty),
                    None => {
                        self.error(
                            DiagnosticKind::TypeMismatch,
                            format!(
                                "no operator \"{}\" for \"{}\" and \"{}\"",
                                kind.operator_text().unwrap_or("?"),
                                self.type_name(left),
                                self.type_name(right)
                            ),
                            node,
                        );
                        self.set(node, Type::Error)
                    }
                }
            }

            kind if kind.is_assign() => self.check_assignment(node, kind),

            NodeKind::Dot => self.check_dot(node),
            NodeKind::Index => self.check_index(node),

            NodeKind::Hook => {
                let condition = self.comp.ast.child(node, 0);
                self.check_condition(condition);
                let true_node = self.comp.ast.child(node, 1);
                let false_node = self.comp.ast.child(node, 2);
                let true_ty = self.check_expression(true_node);
                let false_ty = self.check_expression(false_node);
                if true_ty == Type::Error || false_ty == Type::Error {
                    self.set(node, Type::Error)
                } else if true_ty == false_ty {
                    self.set(node, true_ty)
                } else {
                    self.error(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "both arms of \"?:\" must have the same type, found \"{}\" and \"{}\"",
                            self.type_name(true_ty),
                            self.type_name(false_ty)
                        ),
                        node,
                    );
                    self.set(node, Type::Error)
                }
            }

            NodeKind::Sequence => {
                let mut last = Type::Error;
                for child in self.comp.ast.children(node).to_vec() {
                    last = self.check_expression(child);
                }
                self.set(node, last)
            }

            NodeKind::Call => self.check_call(node),

            _ => Type::Error,
        }
    }

    fn unary_mismatch(&mut self, node: NodeId, kind: NodeKind, ty: Type) -> Type {
        self.error(
            DiagnosticKind::TypeMismatch,
            format!(
                "no operator \"{}\" for \"{}\"",
                kind.operator_text().unwrap_or("?"),
                self.type_name(ty)
            ),
            node,
        );
        self.set(node, Type::Error)
    }

    fn check_assignment(&mut self, node: NodeId, kind: NodeKind) -> Type {
        let left_node = self.comp.ast.child(node, 0);
        let right_node = self.comp.ast.child(node, 1);
        let left = self.check_expression(left_node);
        let right = self.check_expression(right_node);

        if left != Type::Error && !self.is_lvalue(left_node) {
            self.error(
                DiagnosticKind::BadLValue,
                "the target of an assignment must be assignable".to_string(),
                left_node,
            );
            return self.set(node, Type::Error);
        }
        if left == Type::Error || right == Type::Error {
            return self.set(node, Type::Error);
        }

        let ok = match kind.assign_operator() {
            // Plain `=` requires equal types.
            None => left == right,
            // Compound assignment requires the operator to produce the
            // target's type back.
            Some(op) => binary_result_type(op, left, right) == Some(left),
        };
        if !ok {
            self.error(
                DiagnosticKind::TypeMismatch,
                format!(
                    "cannot assign \"{}\" to \"{}\"",
                    self.type_name(right),
                    self.type_name(left)
                ),
                node,
            );
            return self.set(node, Type::Error);
        }
        self.set(node, left)
    }

    fn check_dot(&mut self, node: NodeId) -> Type {
        let object = self.comp.ast.child(node, 0);
        let object_ty = self.check_expression(object);
        let member = match &self.comp.ast[node].literal {
            Some(Literal::Str(member)) => member.clone(),
            _ => return self.set(node, Type::Error),
        };

        match object_ty {
            Type::Error => self.set(node, Type::Error),

            Type::Struct(struct_symbol) => {
                let field = self.comp.symbols[struct_symbol]
                    .fields
                    .iter()
                    .copied()
                    .find(|&f| self.comp.symbols[f].name == member);
                match field {
                    Some(field) => {
                        self.comp.ast[node].symbol = Some(field);
                        let ty = self.comp.symbols[field].ty;
                        self.set(node, ty)
                    }
                    None => {
                        self.error(
                            DiagnosticKind::UndefinedSymbol,
                            format!(
                                "\"{member}\" does not exist on \"{}\"",
                                self.comp.symbols[struct_symbol].name
                            ),
                            node,
                        );
                        self.set(node, Type::Error)
                    }
                }
            }

            ty if ty.is_vector() => match swizzle_type(ty, &member) {
                Ok(result) => self.set(node, result),
                Err(message) => {
                    self.error(DiagnosticKind::BadSwizzle, message, node);
                    self.set(node, Type::Error)
                }
            },

            other => {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    format!("\"{}\" has no members", self.type_name(other)),
                    node,
                );
                self.set(node, Type::Error)
            }
        }
    }

    fn check_index(&mut self, node: NodeId) -> Type {
        let object = self.comp.ast.child(node, 0);
        let index = self.comp.ast.child(node, 1);
        let object_ty = self.check_expression(object);
        let index_ty = self.check_expression(index);

        if index_ty != Type::Int && index_ty != Type::Error {
            self.error(
                DiagnosticKind::TypeMismatch,
                "an index must be an int".to_string(),
                index,
            );
        }
        if object_ty == Type::Error {
            return self.set(node, Type::Error);
        }

        // Indexing an array variable yields its element type.
        if let Some(symbol) = self.comp.ast[object].symbol {
            if self.comp.symbols[symbol].array_size.is_some() {
                return self.set(node, object_ty);
            }
        }

        match object_ty.index_result() {
            Some(result) => self.set(node, result),
            None => {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    format!("cannot index \"{}\"", self.type_name(object_ty)),
                    node,
                );
                self.set(node, Type::Error)
            }
        }
    }

    fn check_call(&mut self, node: NodeId) -> Type {
        let children = self.comp.ast.children(node).to_vec();
        let callee = children[0];
        let arguments = &children[1..];
        let argument_types: Vec<Type> = arguments
            .iter()
            .map(|&a| self.check_expression(a))
            .collect();

        if self.comp.ast[callee].kind != NodeKind::Name {
            self.error(
                DiagnosticKind::TypeMismatch,
                "this expression cannot be called".to_string(),
                callee,
            );
            return self.set(node, Type::Error);
        }

        // Built-in type constructor: `vec4(...)`.
        if self.comp.ast[callee].symbol.is_none() {
            if let Some(target) = self.comp.ast[callee].ty {
                let result = self.check_constructor(node, target, &argument_types);
                return self.set(node, result);
            }
            // Unresolved callee, already reported.
            return self.set(node, Type::Error);
        }

        let symbol = self.comp.ast[callee].symbol.unwrap();
        match self.comp.symbols[symbol].kind {
            SymbolKind::Struct => {
                let result = self.check_struct_constructor(node, symbol, &argument_types);
                self.comp.ast[callee].ty = Some(result);
                self.set(node, result)
            }
            SymbolKind::Function => {
                self.resolve_overload(node, callee, symbol, arguments, &argument_types)
            }
            SymbolKind::Variable => {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "cannot call the variable \"{}\"",
                        self.comp.symbols[symbol].name
                    ),
                    callee,
                );
                self.set(node, Type::Error)
            }
        }
    }

    /// `T(args...)` for scalar, vector, and matrix types.
    fn check_constructor(&mut self, node: NodeId, target: Type, arguments: &[Type]) -> Type {
        if arguments.iter().any(|&a| a == Type::Error) {
            return Type::Error;
        }

        let bad = |checker: &mut Self, message: String| {
            checker.error(DiagnosticKind::BadConstructor, message, node);
            Type::Error
        };

        if target.is_scalar() {
            // Scalar constructors are explicit conversions.
            return if arguments.len() == 1 && arguments[0].is_scalar() {
                target
            } else {
                bad(
                    self,
                    format!("\"{target}\" takes exactly one scalar argument"),
                )
            };
        }

        if target.is_vector() || target.is_matrix() {
            if arguments.is_empty() {
                return bad(self, format!("\"{target}\" needs arguments"));
            }
            // Single scalar: broadcast (or the diagonal, for matrices).
            if arguments.len() == 1 && arguments[0].is_scalar() {
                return target;
            }
            // Matrix from matrix.
            if target.is_matrix() && arguments.len() == 1 && arguments[0].is_matrix() {
                return target;
            }
            // Component-count rule.
            if target.is_vector() && arguments.iter().any(|a| a.is_matrix()) {
                return bad(
                    self,
                    format!("cannot construct \"{target}\" from a matrix"),
                );
            }
            if arguments
                .iter()
                .any(|a| !a.is_scalar() && !a.is_vector() && !a.is_matrix())
            {
                return bad(self, format!("invalid arguments to \"{target}\""));
            }
            let total: u32 = arguments.iter().map(|a| a.component_count()).sum();
            return if total == target.component_count() {
                target
            } else {
                bad(
                    self,
                    format!(
                        "\"{target}\" needs {} components but {total} were provided",
                        target.component_count()
                    ),
                )
            };
        }

        let message = format!("cannot construct \"{}\"", self.type_name(target));
        bad(self, message)
    }

    /// `S(args...)`: one argument per field, exact types, in order.
    fn check_struct_constructor(
        &mut self,
        node: NodeId,
        struct_symbol: glisten_common::ids::SymbolId,
        arguments: &[Type],
    ) -> Type {
        if arguments.iter().any(|&a| a == Type::Error) {
            return Type::Error;
        }
        let fields = self.comp.symbols[struct_symbol].fields.clone();
        let name = self.comp.symbols[struct_symbol].name.clone();
        if fields.len() != arguments.len() {
            self.error(
                DiagnosticKind::BadConstructor,
                format!(
                    "\"{name}\" needs {} arguments but {} were provided",
                    fields.len(),
                    arguments.len()
                ),
                node,
            );
            return Type::Error;
        }
        for (index, (&field, &argument)) in fields.iter().zip(arguments.iter()).enumerate() {
            let expected = self.comp.symbols[field].ty;
            if expected != argument {
                self.error(
                    DiagnosticKind::BadConstructor,
                    format!(
                        "argument {} of \"{name}\" must be \"{}\" but \"{}\" was provided",
                        index + 1,
                        self.type_name(expected),
                        self.type_name(argument)
                    ),
                    node,
                );
                return Type::Error;
            }
        }
        Type::Struct(struct_symbol)
    }

    /// Exact-match overload resolution over the chain starting at `head`.
    fn resolve_overload(
        &mut self,
        node: NodeId,
        callee: NodeId,
        head: glisten_common::ids::SymbolId,
        arguments: &[NodeId],
        argument_types: &[Type],
    ) -> Type {
        if argument_types.iter().any(|&a| a == Type::Error) {
            return self.set(node, Type::Error);
        }

        let mut candidates = Vec::new();
        let mut cursor = Some(head);
        while let Some(current) = cursor {
            let parameters = &self.comp.symbols[current].parameters;
            if parameters.len() == argument_types.len()
                && parameters
                    .iter()
                    .zip(argument_types.iter())
                    .all(|(&p, &a)| self.comp.symbols[p].ty == a)
            {
                candidates.push(current);
            }
            cursor = self.comp.symbols[current].overload;
        }

        let name = self.comp.symbols[head].name.clone();
        match candidates.len() {
            0 => {
                let provided: Vec<String> =
                    argument_types.iter().map(|&t| self.type_name(t)).collect();
                self.error(
                    DiagnosticKind::NoMatchingOverload,
                    format!(
                        "no overload of \"{name}\" matches ({})",
                        provided.join(", ")
                    ),
                    node,
                );
                self.set(node, Type::Error)
            }
            1 => {
                let chosen = candidates[0];
                self.comp.ast[callee].symbol = Some(chosen);
                let return_type = self.comp.symbols[chosen].ty;
                self.comp.ast[callee].ty = Some(return_type);

                // `out` / `inout` arguments must be assignable.
                let parameters = self.comp.symbols[chosen].parameters.clone();
                for (&parameter, &argument) in parameters.iter().zip(arguments.iter()) {
                    let direction = self.comp.symbols[parameter].flags.parameter_direction();
                    if direction.intersects(SymbolFlags::OUT | SymbolFlags::INOUT)
                        && !self.is_lvalue(argument)
                    {
                        self.error(
                            DiagnosticKind::BadLValue,
                            format!(
                                "the argument for the \"{}\" parameter \"{}\" must be assignable",
                                if direction.contains(SymbolFlags::OUT) {
                                    "out"
                                } else {
                                    "inout"
                                },
                                self.comp.symbols[parameter].name
                            ),
                            argument,
                        );
                    }
                }
                self.set(node, return_type)
            }
            _ => {
                self.error(
                    DiagnosticKind::AmbiguousCall,
                    format!("the call to \"{name}\" is ambiguous"),
                    node,
                );
                self.set(node, Type::Error)
            }
        }
    }

    // ── L-values and constant expressions ──────────────────────────────

    fn is_lvalue(&self, node: NodeId) -> bool {
        match self.comp.ast[node].kind {
            NodeKind::Name => match self.comp.ast[node].symbol {
                Some(symbol) => {
                    let symbol = &self.comp.symbols[symbol];
                    symbol.kind == SymbolKind::Variable
                        && !symbol.flags.intersects(
                            SymbolFlags::CONST | SymbolFlags::UNIFORM | SymbolFlags::ATTRIBUTE,
                        )
                }
                None => false,
            },
            NodeKind::Dot => {
                let object = self.comp.ast.child(node, 0);
                if self.comp.ast[node].symbol.is_some() {
                    // Struct field access.
                    self.is_lvalue(object)
                } else {
                    // A swizzle is assignable iff no component repeats.
                    let no_repeats = match &self.comp.ast[node].literal {
                        Some(Literal::Str(member)) => !has_repeated_chars(member),
                        _ => false,
                    };
                    no_repeats && self.is_lvalue(object)
                }
            }
            NodeKind::Index => self.is_lvalue(self.comp.ast.child(node, 0)),
            _ => false,
        }
    }

    /// Conservative syntactic constancy, for `const` initializers.
    fn is_constant_expression(&self, node: NodeId) -> bool {
        match self.comp.ast[node].kind {
            NodeKind::BoolLiteral | NodeKind::IntLiteral | NodeKind::FloatLiteral => true,
            NodeKind::Name => match self.comp.ast[node].symbol {
                Some(symbol) => self.comp.symbols[symbol].flags.contains(SymbolFlags::CONST),
                None => false,
            },
            NodeKind::Negative | NodeKind::Positive | NodeKind::Not | NodeKind::BitNot => {
                self.is_constant_expression(self.comp.ast.child(node, 0))
            }
            NodeKind::Hook => self
                .comp
                .ast
                .children(node)
                .iter()
                .all(|&c| self.is_constant_expression(c)),
            kind if kind.is_binary() => self
                .comp
                .ast
                .children(node)
                .iter()
                .all(|&c| self.is_constant_expression(c)),
            NodeKind::Call => {
                // Constructor calls over constants are constant.
                let children = self.comp.ast.children(node);
                let callee = children[0];
                let is_constructor = self.comp.ast[callee].kind == NodeKind::Name
                    && (self.comp.ast[callee].symbol.is_none()
                        || self.comp.ast[callee]
                            .symbol
                            .is_some_and(|s| self.comp.symbols[s].is_struct()))
                    && self.comp.ast[callee].ty.is_some();
                is_constructor
                    && children[1..]
                        .iter()
                        .all(|&c| self.is_constant_expression(c))
            }
            _ => false,
        }
    }
}

// ── Swizzles ───────────────────────────────────────────────────────────

const SWIZZLE_ALPHABETS: [&str; 3] = ["xyzw", "stpq", "rgba"];

/// Validate a swizzle against a vector type and compute the result type.
///
/// Every character must come from one alphabet (no mixing), every index
/// must be inside the vector, and at most four components may be named.
fn swizzle_type(base: Type, member: &str) -> Result<Type, String> {
    if member.is_empty() || member.len() > 4 {
        return Err(format!("invalid swizzle \"{member}\""));
    }
    let first = member.chars().next().unwrap();
    let Some(alphabet) = SWIZZLE_ALPHABETS.iter().find(|a| a.contains(first)) else {
        return Err(format!("invalid swizzle character \"{first}\""));
    };
    let len = base.vector_len();
    for c in member.chars() {
        let Some(index) = alphabet.find(c) else {
            return Err(format!(
                "the swizzle \"{member}\" mixes components from different alphabets"
            ));
        };
        if index as u32 >= len {
            return Err(format!(
                "the component \"{c}\" is out of bounds for \"{base}\""
            ));
        }
    }
    Type::vector_of(base.component_type(), member.len() as u32)
        .ok_or_else(|| format!("invalid swizzle \"{member}\""))
}

fn has_repeated_chars(member: &str) -> bool {
    member
        .chars()
        .enumerate()
        .any(|(i, c)| member[i + 1..].contains(c))
}

// ── Binary operator typing ─────────────────────────────────────────────

fn is_arithmetic(ty: Type) -> bool {
    matches!(ty, Type::Int | Type::Float)
        || (ty.is_vector() && ty.component_type() != Type::Bool)
        || ty.is_matrix()
}

fn binary_result_type(op: NodeKind, left: Type, right: Type) -> Option<Type> {
    use NodeKind::*;
    if left == Type::Error || right == Type::Error {
        return Some(Type::Error);
    }
    match op {
        Add | Subtract | Multiply | Divide => arithmetic_result(op, left, right),
        Remainder | ShiftLeft | ShiftRight | BitAnd | BitXor | BitOr => {
            (left == Type::Int && right == Type::Int).then_some(Type::Int)
        }
        LessThan | GreaterThan | LessThanEqual | GreaterThanEqual => {
            (left == right && matches!(left, Type::Int | Type::Float)).then_some(Type::Bool)
        }
        Equal | NotEqual => {
            (left == right && left != Type::Void && !left.is_sampler()).then_some(Type::Bool)
        }
        LogicalAnd | LogicalOr | LogicalXor => {
            (left == Type::Bool && right == Type::Bool).then_some(Type::Bool)
        }
        _ => None,
    }
}

fn arithmetic_result(op: NodeKind, left: Type, right: Type) -> Option<Type> {
    // Componentwise on equal types (matrix `*` is the linear-algebra
    // product, which still yields the same square type).
    if left == right && is_arithmetic(left) {
        return Some(left);
    }
    // Scalar with a vector or matrix of the same component type.
    if left.is_scalar() && (right.is_vector() || right.is_matrix()) {
        if right.component_type() == left {
            return Some(right);
        }
        return None;
    }
    if right.is_scalar() && (left.is_vector() || left.is_matrix()) {
        if left.component_type() == right {
            return Some(left);
        }
        return None;
    }
    // Matrix-vector products.
    if op == NodeKind::Multiply {
        if left.is_matrix() && right.is_vector() && right.component_type() == Type::Float {
            return (left.vector_len() == right.vector_len()).then_some(right);
        }
        if left.is_vector() && right.is_matrix() && left.component_type() == Type::Float {
            return (left.vector_len() == right.vector_len()).then_some(left);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swizzle_types() {
        assert_eq!(swizzle_type(Type::Vec4, "xyz"), Ok(Type::Vec3));
        assert_eq!(swizzle_type(Type::Vec2, "yx"), Ok(Type::Vec2));
        assert_eq!(swizzle_type(Type::Vec3, "rgb"), Ok(Type::Vec3));
        assert_eq!(swizzle_type(Type::IVec2, "x"), Ok(Type::Int));
        assert_eq!(swizzle_type(Type::Vec4, "xxxx"), Ok(Type::Vec4));
    }

    #[test]
    fn swizzle_out_of_bounds() {
        assert!(swizzle_type(Type::Vec2, "xyz").is_err());
        assert!(swizzle_type(Type::Vec3, "w").is_err());
    }

    #[test]
    fn swizzle_cannot_mix_alphabets() {
        assert!(swizzle_type(Type::Vec4, "xr").is_err());
        assert!(swizzle_type(Type::Vec4, "rs").is_err());
    }

    #[test]
    fn swizzle_too_long() {
        assert!(swizzle_type(Type::Vec4, "xyzwx").is_err());
    }

    #[test]
    fn repeated_components() {
        assert!(has_repeated_chars("xx"));
        assert!(has_repeated_chars("xyx"));
        assert!(!has_repeated_chars("xyzw"));
    }

    #[test]
    fn scalar_vector_arithmetic() {
        assert_eq!(
            binary_result_type(NodeKind::Multiply, Type::Vec3, Type::Float),
            Some(Type::Vec3)
        );
        assert_eq!(
            binary_result_type(NodeKind::Add, Type::Float, Type::Vec2),
            Some(Type::Vec2)
        );
        assert_eq!(
            binary_result_type(NodeKind::Add, Type::Int, Type::Vec2),
            None
        );
    }

    #[test]
    fn matrix_vector_products() {
        assert_eq!(
            binary_result_type(NodeKind::Multiply, Type::Mat4, Type::Vec4),
            Some(Type::Vec4)
        );
        assert_eq!(
            binary_result_type(NodeKind::Multiply, Type::Vec3, Type::Mat3),
            Some(Type::Vec3)
        );
        assert_eq!(
            binary_result_type(NodeKind::Multiply, Type::Mat4, Type::Vec3),
            None
        );
    }

    #[test]
    fn no_implicit_int_to_float() {
        assert_eq!(binary_result_type(NodeKind::Add, Type::Int, Type::Float), None);
    }

    #[test]
    fn errors_propagate_silently() {
        assert_eq!(
            binary_result_type(NodeKind::Add, Type::Error, Type::Float),
            Some(Type::Error)
        );
    }
}
