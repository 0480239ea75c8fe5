//! The cross-shader renamer.
//!
//! Works over the union of all per-export trees so that a helper shared
//! by two shaders gets exactly one new name. Candidate names are
//! enumerated shortest-first from the identifier alphabet (53 possible
//! first characters, 63 continuation characters), skipping keywords,
//! reserved words, built-in API names, and anything else in the
//! blacklist. Symbols are processed in descending order of reference
//! count, ties broken by ascending id for determinism; prototypes and
//! definitions (and whole overload chains) rename as one unit.

use std::collections::BTreeMap;

use glisten_common::ids::{NodeId, ScopeId, SymbolId};
use glisten_common::token::{KEYWORDS, RESERVED_WORDS};
use glisten_parser::ast::{Ast, NodeKind};
use glisten_parser::scope::ScopeArena;
use glisten_parser::symbol::{SymbolArena, SymbolFlags, SymbolKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// Which symbols the renamer touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameSymbols {
    /// Everything that is not blacklisted; export entry points become
    /// `main`.
    All,
    /// Only symbols that are neither exported nor imported; entry points
    /// keep their names so shaders can be composed by a host.
    Internal,
    /// Identity.
    None,
}

/// Shortest-first, lexicographic-within-a-length identifier generator.
pub struct NameGenerator {
    indices: Vec<usize>,
}

const FIRST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";
const REST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_0123456789";

impl NameGenerator {
    pub fn new() -> Self {
        Self { indices: vec![0] }
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for NameGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let name: String = self
            .indices
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                let alphabet = if position == 0 { FIRST } else { REST };
                alphabet[index] as char
            })
            .collect();

        // Odometer increment, rightmost position fastest.
        let mut position = self.indices.len();
        loop {
            if position == 0 {
                // Every position overflowed: grow by one character.
                let length = self.indices.len() + 1;
                self.indices.clear();
                self.indices.resize(length, 0);
                break;
            }
            position -= 1;
            let limit = if position == 0 { FIRST.len() } else { REST.len() };
            self.indices[position] += 1;
            if self.indices[position] < limit {
                break;
            }
            self.indices[position] = 0;
        }
        Some(name)
    }
}

/// Rename across all per-export trees. Returns the original-name to
/// new-name map for every renamed symbol.
pub fn rename(
    trees: &[(SymbolId, Ast)],
    root: NodeId,
    symbols: &mut SymbolArena,
    scopes: &ScopeArena,
    policy: RenameSymbols,
) -> BTreeMap<String, String> {
    for symbol in symbols.iter_mut() {
        symbol.new_name = None;
        symbol.use_count = 0;
    }
    if policy == RenameSymbols::None {
        return BTreeMap::new();
    }

    // Which symbols appear anywhere, and how often they are referenced.
    let mut present: FxHashSet<SymbolId> = FxHashSet::default();
    for (_, ast) in trees {
        ast.visit(root, &mut |id| {
            if let Some(symbol) = ast[id].symbol {
                present.insert(symbol);
                if matches!(ast[id].kind, NodeKind::Name | NodeKind::Dot) {
                    symbols[symbol].use_count += 1;
                }
            }
        });
    }

    let renameable = |symbol: &glisten_parser::symbol::Symbol| {
        !symbol.flags.contains(SymbolFlags::NATIVE)
            && !symbol.flags.contains(SymbolFlags::IMPORTED)
            && !symbol.name.is_empty()
            && (policy == RenameSymbols::All || !symbol.flags.contains(SymbolFlags::EXPORTED))
    };

    // Names that must never be produced or clobbered.
    let mut blacklist: FxHashSet<String> = FxHashSet::default();
    blacklist.extend(KEYWORDS.iter().map(|s| s.to_string()));
    blacklist.extend(RESERVED_WORDS.iter().map(|s| s.to_string()));
    blacklist.insert("main".to_string());
    for symbol in symbols.iter() {
        if symbol.is_native() || (present.contains(&symbol.id) && !renameable(symbol)) {
            blacklist.insert(symbol.name.clone());
        }
    }

    // Entry points become `main` ahead of the general pass.
    if policy == RenameSymbols::All {
        for &(export, _) in trees {
            symbols[export].new_name = Some("main".to_string());
            if let Some(sibling) = symbols[export].sibling {
                symbols[sibling].new_name = Some("main".to_string());
            }
        }
    }

    // Group siblings and overload chains: one unit, one new name.
    let groups = collect_groups(symbols, &present, &renameable);

    // Descending total use count, ascending lead id.
    let mut ordered: Vec<&Group> = groups.iter().collect();
    ordered.sort_by(|a, b| {
        let count_a: u32 = a.members.iter().map(|&m| symbols[m].use_count).sum();
        let count_b: u32 = b.members.iter().map(|&m| symbols[m].use_count).sum();
        count_b.cmp(&count_a).then(a.lead().cmp(&b.lead()))
    });

    // Greedy assignment: the shortest available name that neither hits
    // the blacklist nor collides in an overlapping scope.
    let mut assigned: FxHashMap<String, Vec<ScopeId>> = FxHashMap::default();
    let mut renaming = BTreeMap::new();
    for group in ordered {
        let group_scopes: Vec<ScopeId> = group.members.iter().map(|&m| symbols[m].scope).collect();
        let name = NameGenerator::new()
            .find(|candidate| {
                if blacklist.contains(candidate) {
                    return false;
                }
                match assigned.get(candidate) {
                    None => true,
                    Some(taken) => !taken.iter().any(|&taken_scope| {
                        group_scopes.iter().any(|&scope| {
                            scopes.is_ancestor_or_self(taken_scope, scope)
                                || scopes.is_ancestor_or_self(scope, taken_scope)
                        })
                    }),
                }
            })
            .expect("the name supply is infinite");

        assigned
            .entry(name.clone())
            .or_default()
            .extend(group_scopes);
        let original = symbols[group.lead()].name.clone();
        for &member in &group.members {
            symbols[member].new_name = Some(name.clone());
        }
        renaming.entry(original).or_insert(name);
    }

    // Entry points appear in the map as well.
    if policy == RenameSymbols::All {
        for &(export, _) in trees {
            let original = symbols[export].name.clone();
            if original != "main" {
                renaming.entry(original).or_insert_with(|| "main".to_string());
            }
        }
    }

    renaming
}

struct Group {
    /// Sorted member ids; the first is the lead.
    members: Vec<SymbolId>,
}

impl Group {
    fn lead(&self) -> SymbolId {
        self.members[0]
    }
}

/// Partition the renameable symbols into rename units: a variable or
/// struct on its own; a function together with its prototype sibling and
/// every overload sharing its name.
fn collect_groups(
    symbols: &SymbolArena,
    present: &FxHashSet<SymbolId>,
    renameable: &dyn Fn(&glisten_parser::symbol::Symbol) -> bool,
) -> Vec<Group> {
    let candidate = |id: SymbolId| {
        present.contains(&id) && renameable(&symbols[id]) && symbols[id].new_name.is_none()
    };

    // Reverse overload links so chains can be walked from any member.
    let mut previous_in_chain: FxHashMap<SymbolId, SymbolId> = FxHashMap::default();
    for symbol in symbols.iter() {
        if let Some(next) = symbol.overload {
            previous_in_chain.insert(next, symbol.id);
        }
    }

    let mut grouped: FxHashSet<SymbolId> = FxHashSet::default();
    let mut groups = Vec::new();
    for symbol in symbols.iter() {
        if !candidate(symbol.id) || grouped.contains(&symbol.id) {
            continue;
        }
        let mut members = Vec::new();
        if symbol.kind == SymbolKind::Function {
            // Flood over sibling and overload edges.
            let mut stack = vec![symbol.id];
            let mut seen = FxHashSet::default();
            while let Some(current) = stack.pop() {
                if !seen.insert(current) {
                    continue;
                }
                members.push(current);
                if let Some(sibling) = symbols[current].sibling {
                    stack.push(sibling);
                }
                if let Some(next) = symbols[current].overload {
                    stack.push(next);
                }
                if let Some(&previous) = previous_in_chain.get(&current) {
                    stack.push(previous);
                }
            }
        } else {
            members.push(symbol.id);
        }
        members.sort();
        for &member in &members {
            grouped.insert(member);
        }
        // A unit must rename as one: if any member's name is pinned
        // (already `main`, or excluded by the policy), the whole chain
        // keeps its names.
        let pinned = members
            .iter()
            .any(|&m| symbols[m].new_name.is_some() || !renameable(&symbols[m]));
        if pinned {
            continue;
        }
        // Members absent from every tree still rename with their pair.
        members.retain(|&m| present.contains(&m) || symbols[m].sibling.is_some());
        if !members.is_empty() {
            groups.push(Group { members });
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_come_out_shortest_first() {
        let mut names = NameGenerator::new();
        assert_eq!(names.next().as_deref(), Some("a"));
        assert_eq!(names.next().as_deref(), Some("b"));
        let rest: Vec<String> = NameGenerator::new().take(60).collect();
        // All 53 single-character names come before any two-character name.
        assert!(rest[..53].iter().all(|n| n.len() == 1));
        assert_eq!(rest[52], "_");
        assert_eq!(rest[53], "aa");
        assert_eq!(rest[54], "ab");
    }

    #[test]
    fn generator_rolls_over_lengths() {
        let total_one = 53;
        let total_two = 53 * 63;
        let mut names = NameGenerator::new();
        let last_two = names.nth(total_one + total_two - 1).unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(names.next().unwrap().len(), 3);
    }

    #[test]
    fn generator_is_deterministic() {
        let a: Vec<String> = NameGenerator::new().take(100).collect();
        let b: Vec<String> = NameGenerator::new().take(100).collect();
        assert_eq!(a, b);
    }
}
