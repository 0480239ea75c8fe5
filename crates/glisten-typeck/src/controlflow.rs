//! Control-flow analysis.
//!
//! Walks each function body with two pieces of state: whether the current
//! point is reachable, and whether the innermost enclosing loop has seen a
//! reachable `break`. Every statement node is annotated with
//! `has_control_flow_at_end`: whether control can flow past it once it is
//! reached. A loop whose test is constant-true (or absent) and whose body
//! contains no reachable `break` never lets control past it.
//!
//! The rewriter re-runs this after each change, so constant tests are
//! evaluated through [`fold`] rather than requiring literal nodes.

use glisten_common::ids::NodeId;
use glisten_parser::ast::{Ast, NodeKind};
use glisten_parser::symbol::SymbolArena;

use crate::fold::fold_bool;

/// Annotate every function body under `root`.
pub fn analyze(ast: &mut Ast, symbols: &SymbolArena, root: NodeId) {
    analyze_container(ast, symbols, root);
}

fn analyze_container(ast: &mut Ast, symbols: &SymbolArena, node: NodeId) {
    for child in ast.children(node).to_vec() {
        match ast[child].kind {
            NodeKind::ModifierBlock => analyze_container(ast, symbols, child),
            NodeKind::Function => {
                let children = ast.children(child).to_vec();
                if let Some(&body) = children.last() {
                    if ast[body].kind == NodeKind::Block {
                        let mut loops = Vec::new();
                        exits(ast, symbols, body, &mut loops);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Whether control can flow past `node` once it is reached. Writes the
/// answer onto the node. `loops` holds one break-seen flag per enclosing
/// loop, innermost last.
fn exits(ast: &mut Ast, symbols: &SymbolArena, node: NodeId, loops: &mut Vec<bool>) -> bool {
    let kind = ast[node].kind;
    let result = match kind {
        NodeKind::Return | NodeKind::Discard | NodeKind::Continue => false,

        NodeKind::Break => {
            if let Some(innermost) = loops.last_mut() {
                *innermost = true;
            }
            false
        }

        NodeKind::Block => {
            let mut live = true;
            for child in ast.children(node).to_vec() {
                // Statements after a dead point stay unvisited; the
                // rewriter drops them.
                if live {
                    live = exits(ast, symbols, child, loops);
                }
            }
            live
        }

        NodeKind::If => {
            let children = ast.children(node).to_vec();
            let test = fold_bool(ast, symbols, children[0]);
            let then_exits = if test == Some(false) {
                true
            } else {
                exits(ast, symbols, children[1], loops)
            };
            let else_exits = match children.get(2) {
                Some(&else_branch) if test != Some(true) => {
                    exits(ast, symbols, else_branch, loops)
                }
                Some(_) => true,
                None => true,
            };
            match test {
                Some(true) => then_exits,
                Some(false) => {
                    if children.len() > 2 {
                        else_exits
                    } else {
                        true
                    }
                }
                None => then_exits || else_exits,
            }
        }

        NodeKind::While => {
            let children = ast.children(node).to_vec();
            let test = fold_bool(ast, symbols, children[0]);
            loops.push(false);
            exits(ast, symbols, children[1], loops);
            let broke = loops.pop().unwrap_or(false);
            !(test == Some(true) && !broke)
        }

        NodeKind::DoWhile => {
            let children = ast.children(node).to_vec();
            loops.push(false);
            let body_exits = exits(ast, symbols, children[0], loops);
            let broke = loops.pop().unwrap_or(false);
            let test = fold_bool(ast, symbols, children[1]);
            if test == Some(true) && !broke {
                false
            } else {
                // The body runs at least once.
                body_exits || broke
            }
        }

        NodeKind::For => {
            let children = ast.children(node).to_vec();
            exits(ast, symbols, children[0], loops);
            // An absent test is constant-true.
            let test = if ast[children[1]].kind == NodeKind::Empty {
                Some(true)
            } else {
                fold_bool(ast, symbols, children[1])
            };
            loops.push(false);
            exits(ast, symbols, children[3], loops);
            let broke = loops.pop().unwrap_or(false);
            !(test == Some(true) && !broke)
        }

        _ => true,
    };
    ast[node].has_control_flow_at_end = result;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use glisten_parser::Compilation;

    fn analyzed(source: &str) -> Compilation {
        let mut comp = Compilation::new();
        let id = comp.sources.add("test.glsl", source);
        glisten_parser::parse(&mut comp, id, None);
        assert!(!comp.log.has_errors(), "{:?}", comp.log.diagnostics());
        let root = comp.global_node;
        analyze(&mut comp.ast, &comp.symbols, root);
        comp
    }

    fn body_of(comp: &Compilation, name: &str) -> NodeId {
        let symbol = comp.symbols.iter().find(|s| s.name == name).unwrap();
        *comp.ast.children(symbol.node).last().unwrap()
    }

    #[test]
    fn straight_line_code_reaches_the_end() {
        let comp = analyzed("void f() { int x; x = 1; }");
        let body = body_of(&comp, "f");
        assert!(comp.ast[body].has_control_flow_at_end);
    }

    #[test]
    fn return_kills_the_block_end() {
        let comp = analyzed("void f() { return; }");
        let body = body_of(&comp, "f");
        assert!(!comp.ast[body].has_control_flow_at_end);
    }

    #[test]
    fn an_if_does_not_kill_unless_both_arms_do() {
        let comp = analyzed("void f(bool b) { if (b) return; }");
        let body = body_of(&comp, "f");
        assert!(comp.ast[body].has_control_flow_at_end);

        let comp = analyzed("void f(bool b) { if (b) return; else return; }");
        let body = body_of(&comp, "f");
        assert!(!comp.ast[body].has_control_flow_at_end);
    }

    #[test]
    fn infinite_loop_without_break_kills_the_end() {
        let comp = analyzed("void f() { while (true) {} }");
        let body = body_of(&comp, "f");
        assert!(!comp.ast[body].has_control_flow_at_end);

        let comp = analyzed("void f() { for (;;) {} }");
        let body = body_of(&comp, "f");
        assert!(!comp.ast[body].has_control_flow_at_end);
    }

    #[test]
    fn a_reachable_break_lets_the_loop_exit() {
        let comp = analyzed("void f(bool b) { while (true) { if (b) break; } }");
        let body = body_of(&comp, "f");
        assert!(comp.ast[body].has_control_flow_at_end);
    }

    #[test]
    fn a_break_in_an_inner_loop_does_not_count() {
        let comp = analyzed("void f() { while (true) { while (true) { break; } } }");
        let body = body_of(&comp, "f");
        assert!(!comp.ast[body].has_control_flow_at_end);
    }

    #[test]
    fn non_constant_loops_exit() {
        let comp = analyzed("void f(bool b) { while (b) {} int x; }");
        let body = body_of(&comp, "f");
        assert!(comp.ast[body].has_control_flow_at_end);
    }
}
