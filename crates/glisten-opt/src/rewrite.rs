//! The rewriter.
//!
//! Runs once per export entry over a private clone of the resolved tree.
//! Each pass loops to a fixed point: constant folding, limited algebraic
//! simplification, liveness-driven dead-code elimination, export-root
//! reachability trimming, and optional compaction. NATIVE declarations
//! are never touched, and the rewriter emits only warnings.

use glisten_common::diag::{DiagnosticKind, Log};
use glisten_common::ids::{NodeId, SymbolId};
use glisten_common::ty::{Literal, Type};
use glisten_parser::ast::{Ast, NodeKind};
use glisten_parser::scope::{ScopeArena, ScopeKind};
use glisten_parser::symbol::{SymbolArena, SymbolFlags, SymbolKind};
use glisten_typeck::controlflow;
use glisten_typeck::fold::{self, Fold, Value};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Copy)]
pub struct RewriteOptions {
    /// Merge adjacent declarations and inline single-use const locals.
    pub compact_syntax_tree: bool,
    /// Delete top-level declarations unreachable from the export root.
    pub trim_symbols: bool,
}

/// Rewrite `ast` for one export entry.
pub fn rewrite(
    ast: &mut Ast,
    symbols: &mut SymbolArena,
    scopes: &ScopeArena,
    log: &mut Log,
    root: NodeId,
    export: SymbolId,
    options: &RewriteOptions,
) {
    dissolve_modifier_blocks(ast, root);

    // Fixed point, with a generous bound against pathological flip-flop.
    for _ in 0..16 {
        let mut changed = false;
        if options.compact_syntax_tree {
            changed |= fold_constants(ast, symbols, log, root);
            changed |= simplify_algebra(ast, symbols, root);
            controlflow::analyze(ast, symbols, root);
            changed |= remove_dead_code(ast, symbols, root);
            changed |= compact(ast, symbols, scopes, root);
        }
        if options.trim_symbols {
            changed |= trim_unreachable(ast, symbols, root, export);
        }
        if !changed {
            break;
        }
    }
}

/// Modifier blocks are a grouping syntax only; their qualifiers already
/// live on the symbols, so splice the declarations into the parent.
fn dissolve_modifier_blocks(ast: &mut Ast, root: NodeId) {
    let mut rebuilt = Vec::new();
    let mut found = false;
    for &child in ast.children(root) {
        if ast[child].kind == NodeKind::ModifierBlock {
            found = true;
            rebuilt.extend(ast.children(child).iter().copied());
        } else {
            rebuilt.push(child);
        }
    }
    if found {
        ast.set_children(root, rebuilt);
    }
}

// ── Constant folding ───────────────────────────────────────────────────

/// Kinds the folder may replace in place. Bare names are deliberately
/// excluded: inlining a multi-use constant would grow the output, so that
/// decision belongs to compaction.
fn is_foldable_operator(kind: NodeKind) -> bool {
    kind.is_binary()
        || matches!(
            kind,
            NodeKind::Negative | NodeKind::Positive | NodeKind::Not | NodeKind::BitNot | NodeKind::Hook
        )
}

fn fold_constants(ast: &mut Ast, symbols: &SymbolArena, log: &mut Log, root: NodeId) -> bool {
    let mut nodes = Vec::new();
    ast.visit(root, &mut |id| nodes.push(id));

    let mut changed = false;
    // Reverse order visits leaves first.
    for node in nodes.into_iter().rev() {
        let kind = ast[node].kind;
        if !is_foldable_operator(kind) {
            continue;
        }
        if ast[node].ty == Some(Type::Error) {
            continue;
        }
        match fold::fold(ast, symbols, node) {
            Fold::Value(value) => {
                let (kind, ty) = match value {
                    Value::Bool(_) => (NodeKind::BoolLiteral, Type::Bool),
                    Value::Int(_) => (NodeKind::IntLiteral, Type::Int),
                    Value::Float(_) => (NodeKind::FloatLiteral, Type::Float),
                };
                ast.replace_with_literal(node, kind, value.to_literal(), ty);
                changed = true;
            }
            Fold::DivisionByZero => {
                log.warning(
                    DiagnosticKind::Warning,
                    "division by zero",
                    ast[node].range,
                );
                ast[node].ty = Some(Type::Error);
                changed = true;
            }
            Fold::NotConstant => {}
        }
    }
    changed
}

// ── Algebraic simplification ───────────────────────────────────────────

fn literal_int(ast: &Ast, node: NodeId) -> Option<i32> {
    match &ast[node].literal {
        Some(Literal::Int { value, .. }) if ast[node].kind == NodeKind::IntLiteral => Some(*value),
        _ => None,
    }
}

fn literal_float(ast: &Ast, node: NodeId) -> Option<f64> {
    match &ast[node].literal {
        Some(Literal::Float { value, .. }) if ast[node].kind == NodeKind::FloatLiteral => {
            Some(*value)
        }
        _ => None,
    }
}

fn literal_bool(ast: &Ast, node: NodeId) -> Option<bool> {
    match &ast[node].literal {
        Some(Literal::Bool(value)) if ast[node].kind == NodeKind::BoolLiteral => Some(*value),
        _ => None,
    }
}

fn is_zero(ast: &Ast, node: NodeId) -> bool {
    literal_int(ast, node) == Some(0) || literal_float(ast, node) == Some(0.0)
}

fn is_one(ast: &Ast, node: NodeId) -> bool {
    literal_int(ast, node) == Some(1) || literal_float(ast, node) == Some(1.0)
}

/// Conservative side-effect freedom: pure leaf reads, pure operators, and
/// calls to NATIVE functions or constructors over pure arguments.
pub(crate) fn has_no_side_effects(ast: &Ast, symbols: &SymbolArena, node: NodeId) -> bool {
    let kind = ast[node].kind;
    match kind {
        NodeKind::BoolLiteral | NodeKind::IntLiteral | NodeKind::FloatLiteral | NodeKind::Name => {
            true
        }
        NodeKind::Dot | NodeKind::Index | NodeKind::Hook | NodeKind::Sequence => ast
            .children(node)
            .iter()
            .all(|&c| has_no_side_effects(ast, symbols, c)),
        NodeKind::Negative | NodeKind::Positive | NodeKind::Not | NodeKind::BitNot => {
            has_no_side_effects(ast, symbols, ast.child(node, 0))
        }
        NodeKind::Call => {
            let callee = ast.child(node, 0);
            let callee_is_pure = match ast[callee].symbol {
                // Constructors.
                None => ast[callee].ty.is_some(),
                Some(symbol) => match symbols[symbol].kind {
                    SymbolKind::Struct => true,
                    SymbolKind::Function => symbols[symbol].is_native(),
                    SymbolKind::Variable => false,
                },
            };
            callee_is_pure
                && ast.children(node)[1..]
                    .iter()
                    .all(|&c| has_no_side_effects(ast, symbols, c))
        }
        kind if kind.is_binary() => ast
            .children(node)
            .iter()
            .all(|&c| has_no_side_effects(ast, symbols, c)),
        _ => false,
    }
}

fn replace_in_parent(ast: &mut Ast, node: NodeId, replacement: NodeId) -> bool {
    let Some(parent) = ast[node].parent else {
        return false;
    };
    let Some(index) = ast.children(parent).iter().position(|&c| c == node) else {
        return false;
    };
    ast.replace_child_at(parent, index, replacement);
    true
}

fn simplify_algebra(ast: &mut Ast, symbols: &SymbolArena, root: NodeId) -> bool {
    let mut nodes = Vec::new();
    ast.visit(root, &mut |id| nodes.push(id));

    let mut changed = false;
    for node in nodes.into_iter().rev() {
        let kind = ast[node].kind;
        if !kind.is_binary() && kind != NodeKind::Not {
            continue;
        }
        if ast[node].ty == Some(Type::Error) {
            continue;
        }

        // `!!x` -> `x`
        if kind == NodeKind::Not {
            let inner = ast.child(node, 0);
            if ast[inner].kind == NodeKind::Not {
                let x = ast.child(inner, 0);
                changed |= replace_in_parent(ast, node, x);
            }
            continue;
        }

        let left = ast.child(node, 0);
        let right = ast.child(node, 1);
        let node_ty = ast[node].ty;

        let replacement = match kind {
            NodeKind::Add => {
                if is_zero(ast, right) && ast[left].ty == node_ty {
                    Some(left)
                } else if is_zero(ast, left) && ast[right].ty == node_ty {
                    Some(right)
                } else {
                    None
                }
            }
            NodeKind::Subtract => {
                if is_zero(ast, right) && ast[left].ty == node_ty {
                    Some(left)
                } else if is_zero(ast, left) && ast[right].ty == node_ty {
                    // `0 - x` -> `-x`
                    let negative = ast.add(NodeKind::Negative, ast[node].range);
                    ast[negative].ty = node_ty;
                    let x = ast.remove_child_at(node, 1);
                    ast.append_child(negative, x);
                    Some(negative)
                } else {
                    None
                }
            }
            NodeKind::Multiply => {
                if is_one(ast, right) && ast[left].ty == node_ty {
                    Some(left)
                } else if is_one(ast, left) && ast[right].ty == node_ty {
                    Some(right)
                } else if is_zero(ast, right)
                    && ast[left].ty == ast[right].ty
                    && has_no_side_effects(ast, symbols, left)
                {
                    Some(right)
                } else if is_zero(ast, left)
                    && ast[left].ty == ast[right].ty
                    && has_no_side_effects(ast, symbols, right)
                {
                    Some(left)
                } else {
                    None
                }
            }
            NodeKind::Divide => {
                if is_one(ast, right) && ast[left].ty == node_ty {
                    Some(left)
                } else {
                    None
                }
            }
            NodeKind::LogicalAnd => match (literal_bool(ast, left), literal_bool(ast, right)) {
                (Some(true), _) => Some(right),
                (Some(false), _) => Some(left),
                (_, Some(true)) => Some(left),
                (_, Some(false)) if has_no_side_effects(ast, symbols, left) => Some(right),
                _ => None,
            },
            NodeKind::LogicalOr => match (literal_bool(ast, left), literal_bool(ast, right)) {
                (Some(false), _) => Some(right),
                (Some(true), _) => Some(left),
                (_, Some(false)) => Some(left),
                (_, Some(true)) if has_no_side_effects(ast, symbols, left) => Some(right),
                _ => None,
            },
            _ => None,
        };

        if let Some(replacement) = replacement {
            changed |= replace_in_parent(ast, node, replacement);
        }
    }
    changed
}

// ── Dead code elimination ──────────────────────────────────────────────

/// Whether running this statement could matter.
fn statement_has_effects(ast: &Ast, symbols: &SymbolArena, node: NodeId) -> bool {
    match ast[node].kind {
        NodeKind::Empty => false,
        NodeKind::Block => ast
            .children(node)
            .iter()
            .any(|&c| statement_has_effects(ast, symbols, c)),
        NodeKind::ExpressionStmt => {
            !has_no_side_effects(ast, symbols, ast.child(node, 0))
        }
        NodeKind::If => {
            let children = ast.children(node);
            !has_no_side_effects(ast, symbols, children[0])
                || children[1..]
                    .iter()
                    .any(|&c| statement_has_effects(ast, symbols, c))
        }
        _ => true,
    }
}

fn remove_dead_code(ast: &mut Ast, symbols: &SymbolArena, root: NodeId) -> bool {
    let mut nodes = Vec::new();
    ast.visit(root, &mut |id| nodes.push(id));

    let mut changed = false;
    for node in nodes.into_iter().rev() {
        match ast[node].kind {
            // Constant-test conditionals reduce to the taken branch.
            NodeKind::If => {
                let test = ast.child(node, 0);
                match fold::fold_bool(ast, symbols, test) {
                    Some(true) => {
                        let then_branch = ast.child(node, 1);
                        changed |= replace_in_parent(ast, node, then_branch);
                    }
                    Some(false) => {
                        let children = ast.children(node).to_vec();
                        let replacement = match children.get(2) {
                            Some(&else_branch) => else_branch,
                            None => {
                                let empty = ast.add(NodeKind::Empty, ast[node].range);
                                empty
                            }
                        };
                        changed |= replace_in_parent(ast, node, replacement);
                    }
                    None => {
                        // An `if` with no effects anywhere is dropped.
                        if !statement_has_effects(ast, symbols, node) {
                            let empty = ast.add(NodeKind::Empty, ast[node].range);
                            changed |= replace_in_parent(ast, node, empty);
                        }
                    }
                }
            }

            // `while (false)` never runs.
            NodeKind::While => {
                let test = ast.child(node, 0);
                if fold::fold_bool(ast, symbols, test) == Some(false) {
                    let empty = ast.add(NodeKind::Empty, ast[node].range);
                    changed |= replace_in_parent(ast, node, empty);
                }
            }

            NodeKind::Block => {
                changed |= clean_statement_list(ast, node);
            }

            _ => {}
        }
    }
    changed
}

/// Drop unreachable statements (everything after the first statement that
/// control cannot flow past), empty statements, and empty blocks.
fn clean_statement_list(ast: &mut Ast, block: NodeId) -> bool {
    let children = ast.children(block).to_vec();
    let mut kept = Vec::new();
    let mut live = true;
    for child in children {
        if !live {
            break;
        }
        let kind = ast[child].kind;
        let drop = kind == NodeKind::Empty
            || (kind == NodeKind::Block && ast.children(child).is_empty());
        if !drop {
            kept.push(child);
        }
        if !ast[child].has_control_flow_at_end {
            live = false;
        }
    }
    if kept.len() != ast.children(block).len() {
        ast.set_children(block, kept);
        return true;
    }
    false
}

// ── Reachability ───────────────────────────────────────────────────────

/// Mark USED from the export root, then delete unmarked top-level
/// declarations. NATIVE declarations are kept (the emitter skips them).
fn trim_unreachable(
    ast: &mut Ast,
    symbols: &mut SymbolArena,
    root: NodeId,
    export: SymbolId,
) -> bool {
    for symbol in symbols.iter_mut() {
        symbol.flags.remove(SymbolFlags::USED);
    }

    let mut worklist = vec![export];
    let mut seen = FxHashSet::default();
    while let Some(symbol) = worklist.pop() {
        if !seen.insert(symbol) {
            continue;
        }
        symbols[symbol].flags.insert(SymbolFlags::USED);

        let mut related = Vec::new();
        if let Some(sibling) = symbols[symbol].sibling {
            related.push(sibling);
        }
        if let Type::Struct(s) = symbols[symbol].ty {
            related.push(s);
        }
        related.extend(symbols[symbol].parameters.iter().copied());
        related.extend(symbols[symbol].fields.iter().copied());

        // Everything referenced from the defining node's subtree.
        let node = symbols[symbol].node;
        ast.visit(node, &mut |id| {
            if let Some(referenced) = ast[id].symbol {
                related.push(referenced);
            }
            if let Some(Type::Struct(s)) = ast[id].ty {
                related.push(s);
            }
        });
        worklist.extend(related);
    }

    let mut changed = false;
    let top = ast.children(root).to_vec();
    let mut kept = Vec::new();
    for child in top {
        let keep = match ast[child].kind {
            NodeKind::Function | NodeKind::StructDef => match ast[child].symbol {
                Some(symbol) => {
                    let s = &symbols[symbol];
                    s.is_native() || s.flags.contains(SymbolFlags::USED)
                }
                None => true,
            },
            NodeKind::Variables => {
                let declarators = ast.children(child).to_vec();
                let mut kept_vars = Vec::new();
                for declarator in declarators {
                    let keep = match ast[declarator].symbol {
                        Some(symbol) => {
                            let s = &symbols[symbol];
                            s.is_native() || s.flags.contains(SymbolFlags::USED)
                        }
                        None => true,
                    };
                    if keep {
                        kept_vars.push(declarator);
                    } else {
                        changed = true;
                    }
                }
                let keep_decl = !kept_vars.is_empty();
                if keep_decl {
                    ast.set_children(child, kept_vars);
                }
                keep_decl
            }
            _ => true,
        };
        if keep {
            kept.push(child);
        } else {
            changed = true;
        }
    }
    if changed {
        ast.set_children(root, kept);
    }
    changed
}

// ── Compaction ─────────────────────────────────────────────────────────

fn compact(ast: &mut Ast, symbols: &mut SymbolArena, scopes: &ScopeArena, root: NodeId) -> bool {
    let mut changed = merge_adjacent_variables(ast, symbols, root);
    changed |= inline_single_use_consts(ast, symbols, scopes, root);
    changed
}

/// Qualifier bits that must agree for two declarations to merge.
const MERGE_FLAGS: SymbolFlags = SymbolFlags::CONST
    .union(SymbolFlags::UNIFORM)
    .union(SymbolFlags::ATTRIBUTE)
    .union(SymbolFlags::VARYING)
    .union(SymbolFlags::INVARIANT)
    .union(SymbolFlags::HIGHP)
    .union(SymbolFlags::MEDIUMP)
    .union(SymbolFlags::LOWP);

fn declaration_shape(ast: &Ast, symbols: &SymbolArena, vars: NodeId) -> Option<(Type, SymbolFlags)> {
    let first = ast.children(vars).first()?;
    let symbol = ast[*first].symbol?;
    let s = &symbols[symbol];
    Some((s.ty, s.flags & MERGE_FLAGS))
}

/// `float a; float b;` -> `float a, b;` for adjacent declarations with the
/// same type and qualifiers.
fn merge_adjacent_variables(ast: &mut Ast, symbols: &SymbolArena, root: NodeId) -> bool {
    let mut lists = vec![root];
    ast.visit(root, &mut |id| {
        if ast[id].kind == NodeKind::Block {
            lists.push(id);
        }
    });

    let mut changed = false;
    for list in lists {
        let mut index = 1;
        while index < ast.children(list).len() {
            let previous = ast.child(list, index - 1);
            let current = ast.child(list, index);
            let mergeable = ast[previous].kind == NodeKind::Variables
                && ast[current].kind == NodeKind::Variables
                && declaration_shape(ast, symbols, previous).is_some()
                && declaration_shape(ast, symbols, previous)
                    == declaration_shape(ast, symbols, current);
            if mergeable {
                let moved = ast.children(current).to_vec();
                for declarator in moved {
                    ast.append_child(previous, declarator);
                }
                ast.remove_child_at(list, index);
                changed = true;
            } else {
                index += 1;
            }
        }
    }
    changed
}

/// Inline single-use `const` locals whose initializer is a literal, and
/// drop the declaration.
fn inline_single_use_consts(
    ast: &mut Ast,
    symbols: &mut SymbolArena,
    scopes: &ScopeArena,
    root: NodeId,
) -> bool {
    // Count name references and remember where they are.
    let mut references: FxHashMap<SymbolId, Vec<NodeId>> = FxHashMap::default();
    ast.visit(root, &mut |id| {
        if ast[id].kind == NodeKind::Name {
            if let Some(symbol) = ast[id].symbol {
                references.entry(symbol).or_default().push(id);
            }
        }
    });

    let mut changed = false;
    let mut declarations = Vec::new();
    ast.visit(root, &mut |id| {
        if ast[id].kind == NodeKind::Variable {
            declarations.push(id);
        }
    });

    for declarator in declarations {
        let Some(symbol) = ast[declarator].symbol else {
            continue;
        };
        let s = &symbols[symbol];
        if !s.flags.contains(SymbolFlags::CONST)
            || s.is_native()
            || s.array_size.is_some()
            || scopes.get(s.scope).kind == ScopeKind::Global
        {
            continue;
        }
        let uses = match references.get(&symbol) {
            Some(uses) if uses.len() == 1 => uses.clone(),
            _ => continue,
        };
        if ast.children(declarator).len() < 2 {
            continue;
        }
        let init = ast.child(declarator, 1);
        if !ast[init].kind.is_literal() {
            continue;
        }
        let literal = ast[init].literal.clone();
        let ty = ast[init].ty.unwrap_or(symbols[symbol].ty);
        let (Some(literal), use_site) = (literal, uses[0]) else {
            continue;
        };

        ast.replace_with_literal(use_site, ast[init].kind, literal, ty);

        // Remove the declarator from its declaration.
        if let Some(vars) = ast[declarator].parent {
            if let Some(index) = ast.children(vars).iter().position(|&c| c == declarator) {
                ast.remove_child_at(vars, index);
                if ast.children(vars).is_empty() {
                    // The whole declaration is gone; leave an Empty for
                    // the next cleanup pass.
                    let empty = ast.add(NodeKind::Empty, ast[vars].range);
                    replace_in_parent(ast, vars, empty);
                }
            }
        }
        changed = true;
    }
    changed
}
