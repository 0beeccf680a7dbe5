//! The five-pass Chomsky Normal Form normalizer (spec §4.4).
//!
//! Grounded line-for-line in `original_source/src/parser_impl_normalizer.cpp`:
//! P1 mirrors `replace_reachable_empty_rules`/`insert_all_pruned`, P2 mirrors
//! `replace_unit_rules`/`replace_reachable_unit_rules`, P3 mirrors
//! `get_singleton_nont`/`nont_seq_eq_of`/`nont_pair_eq_of`, P4 mirrors
//! `set_norm_form`/`transfer_ownership_nonts`.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::grammar::{is_redundant, GrammarArena};
use crate::rule::Rule;
use crate::symbol::{GrammarId, Symbol, Terminal};
use crate::traverse;

/// The shared map from terminal strings to their synthetic CNF-shaped
/// nonterminal, owned by a [`crate::registry::Parser`] for its whole
/// lifetime and shared across every registry entry (spec §4.4/§9: "Singleton
/// nodes ... are owned by the parser instance and shared across entries").
#[derive(Default)]
pub struct SingletonMap {
    by_string: HashMap<String, GrammarId>,
}

impl SingletonMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        SingletonMap::default()
    }

    /// Returns the synthetic nonterminal for `text`, allocating and wiring
    /// it (recursively, for multi-character keys) if this is the first time
    /// `text` has been seen.
    fn get_or_create(&mut self, arena: &mut GrammarArena, text: &str) -> GrammarId {
        if let Some(&id) = self.by_string.get(text) {
            return id;
        }
        let chars: Vec<char> = text.chars().collect();
        let id = arena.new_grammar();
        self.by_string.insert(text.to_string(), id);
        if chars.len() == 1 {
            let term = Terminal::new(chars[0]).expect("singleton text pre-validated as terminal");
            arena.insert_unchecked(id, Rule::from_symbol(term));
        } else {
            let prefix: String = chars[..chars.len() - 1].iter().collect();
            let last = chars[chars.len() - 1].to_string();
            let prefix_id = self.get_or_create(arena, &prefix);
            let last_id = self.get_or_create(arena, &last);
            arena.insert_unchecked(
                id,
                Rule::from_symbols([Symbol::Nonterminal(prefix_id), Symbol::Nonterminal(last_id)]),
            );
        }
        id
    }
}

/// Normalizes the subgraph reachable from `root` to Chomsky Normal Form,
/// returning the handle of the normalized root. `entry_name` is used only to
/// label a possible [`Error::EmptyReachableNonterminal`].
pub fn normalize(
    arena: &mut GrammarArena,
    singleton_map: &mut SingletonMap,
    root: GrammarId,
    entry_name: &str,
) -> Result<GrammarId> {
    let reachable = traverse::dfs_preorder_collect(arena, root);
    for &id in &reachable {
        if arena.is_empty(id) {
            return Err(Error::EmptyReachableNonterminal(entry_name.to_string()));
        }
    }

    let root_had_empty = arena.contains(root, &Rule::empty());

    // P0 — deep copy. All later passes mutate only the copy.
    log::debug!(
        "normalize({entry_name}): P0 deep-copying {} reachable node(s)",
        reachable.len()
    );
    let mapping = arena.deep_copy(root);
    let nodes: HashSet<GrammarId> = mapping.values().copied().collect();
    let new_root = mapping[&root];

    eliminate_empty_rules(arena, &nodes, entry_name);
    eliminate_unit_rules(arena, new_root, entry_name);
    let mut pair_map = HashMap::new();
    convert_to_binary(arena, singleton_map, &mut pair_map, &nodes, entry_name);

    // P4 — assembly: restore the root's ε-production if the source grammar
    // had one; every other node never gets the empty rule (I4).
    if root_had_empty {
        arena.insert_unchecked(new_root, Rule::empty());
    }

    Ok(new_root)
}

/// P1 — ε-elimination, mirroring `replace_reachable_empty_rules`.
fn eliminate_empty_rules(arena: &mut GrammarArena, nodes: &HashSet<GrammarId>, entry_name: &str) {
    let mut erased_history: HashSet<GrammarId> = HashSet::new();
    loop {
        let empty_holders: Vec<GrammarId> = nodes
            .iter()
            .copied()
            .filter(|&id| arena.contains(id, &Rule::empty()))
            .collect();
        if empty_holders.is_empty() {
            break;
        }
        log::debug!(
            "normalize({entry_name}): P1 erasing empty rule from {} node(s)",
            empty_holders.len()
        );
        for &x in &empty_holders {
            arena.erase(x, &Rule::empty());
            erased_history.insert(x);
        }
        for &c in nodes.iter() {
            for &x in &empty_holders {
                let target = Symbol::Nonterminal(x);
                let affected: Vec<Rule> = arena
                    .rules(c)
                    .filter(|r| r.contains(target))
                    .cloned()
                    .collect();
                for r in affected {
                    for variant in pruned_variants(&r, target) {
                        if is_redundant(c, &variant) {
                            continue;
                        }
                        if variant.is_empty() && erased_history.contains(&c) {
                            continue;
                        }
                        if arena.insert_unchecked(c, variant.clone()) {
                            log::trace!("normalize({entry_name}): P1 inserted pruned variant");
                        }
                    }
                }
            }
        }
    }
}

/// Every rule obtained from `rule` by deleting a non-empty subset of the
/// positions at which `target` occurs (spec §4.4 P1, step 3).
fn pruned_variants(rule: &Rule, target: Symbol) -> Vec<Rule> {
    let positions: Vec<usize> = rule.indices_of(target).collect();
    let k = positions.len();
    if k == 0 {
        return Vec::new();
    }
    let mut variants = Vec::with_capacity((1usize << k) - 1);
    for mask in 1u32..(1u32 << k) {
        let symbols: Vec<Symbol> = rule
            .symbols()
            .iter()
            .enumerate()
            .filter(|(i, _)| match positions.iter().position(|p| p == i) {
                Some(bit) => (mask >> bit) & 1 == 0,
                None => true,
            })
            .map(|(_, s)| *s)
            .collect();
        variants.push(Rule::from_symbols(symbols));
    }
    variants
}

/// P2 — unit elimination, mirroring `replace_reachable_unit_rules`: bottom-up
/// DFS so that by the time a node is processed, every node it might inherit
/// rules from is already unit-free.
fn eliminate_unit_rules(arena: &mut GrammarArena, root: GrammarId, entry_name: &str) {
    let order = {
        let mut order = Vec::new();
        traverse::dfs_postorder(arena, root, |id| order.push(id));
        order
    };
    log::debug!(
        "normalize({entry_name}): P2 eliminating unit rules over {} node(s)",
        order.len()
    );
    for c in order {
        let mut keep_out: HashSet<GrammarId> = HashSet::from([c]);
        while let Some(unit_rule) = arena.rules(c).find(|r| r.is_unit()).cloned() {
            let a = unit_rule
                .unit_nonterminal()
                .expect("is_unit() guarantees a nonterminal");
            keep_out.insert(a);
            let inherited: Vec<Rule> = arena.rules(a).cloned().collect();
            for rule in inherited {
                if !is_redundant(c, &rule) {
                    arena.insert_unchecked(c, rule);
                }
            }
            let to_erase: Vec<Rule> = arena
                .rules(c)
                .filter(|r| {
                    r.unit_nonterminal()
                        .is_some_and(|k| keep_out.contains(&k))
                })
                .cloned()
                .collect();
            for rule in to_erase {
                arena.erase(c, &rule);
            }
        }
        log::trace!("normalize({entry_name}): P2 node done, keep_out size {}", keep_out.len());
    }
}

/// P3 — binary conversion, mirroring `convert_reachable_rules_into_pairs`.
fn convert_to_binary(
    arena: &mut GrammarArena,
    singleton_map: &mut SingletonMap,
    pair_map: &mut HashMap<(GrammarId, GrammarId), GrammarId>,
    nodes: &HashSet<GrammarId>,
    entry_name: &str,
) {
    log::debug!(
        "normalize({entry_name}): P3 binary conversion over {} node(s)",
        nodes.len()
    );
    for &c in nodes {
        let rules: Vec<Rule> = arena.rules(c).cloned().collect();
        for r in rules {
            if r.len() < 2 {
                continue;
            }
            let already_binary = r.len() == 2 && r.symbols().iter().all(|s| s.is_nonterminal());
            if already_binary {
                continue;
            }
            arena.erase(c, &r);
            let clustered = cluster_terminals(arena, singleton_map, &r);
            let new_rule = if clustered.len() == 2 {
                clustered
            } else {
                fold_pairs(arena, pair_map, clustered.symbols())
            };
            arena.insert_unchecked(c, new_rule);
            log::trace!("normalize({entry_name}): P3 rewrote a long rule");
        }
    }
}

/// Replaces each maximal run of terminals in `rule` with a single synthetic
/// nonterminal from `singleton_map`. If `rule` is entirely terminals (so a
/// single run would span the whole rule, collapsing it to length 1 and
/// breaking the "at least two nonterminals" invariant pair-folding assumes),
/// the final character is split off and clustered separately.
fn cluster_terminals(arena: &mut GrammarArena, singleton_map: &mut SingletonMap, rule: &Rule) -> Rule {
    let symbols = rule.symbols();
    let all_terminal = symbols.iter().all(|s| s.is_terminal());
    if all_terminal && symbols.len() >= 2 {
        let chars: Vec<char> = symbols
            .iter()
            .map(|s| s.as_terminal().expect("checked all_terminal").get())
            .collect();
        let prefix: String = chars[..chars.len() - 1].iter().collect();
        let last = chars[chars.len() - 1].to_string();
        let prefix_id = singleton_map.get_or_create(arena, &prefix);
        let last_id = singleton_map.get_or_create(arena, &last);
        return Rule::from_symbols([Symbol::Nonterminal(prefix_id), Symbol::Nonterminal(last_id)]);
    }

    let mut out = Vec::with_capacity(symbols.len());
    let mut run = String::new();
    for symbol in symbols {
        match symbol {
            Symbol::Terminal(term) => run.push(term.get()),
            Symbol::Nonterminal(id) => {
                if !run.is_empty() {
                    out.push(Symbol::Nonterminal(singleton_map.get_or_create(arena, &run)));
                    run.clear();
                }
                out.push(Symbol::Nonterminal(*id));
            }
        }
    }
    if !run.is_empty() {
        out.push(Symbol::Nonterminal(singleton_map.get_or_create(arena, &run)));
    }
    Rule::from_symbols(out)
}

/// Left-associatively folds a sequence of `m >= 2` nonterminals into exactly
/// two, synthesizing (or reusing) pair nonterminals along the way.
fn fold_pairs(
    arena: &mut GrammarArena,
    pair_map: &mut HashMap<(GrammarId, GrammarId), GrammarId>,
    symbols: &[Symbol],
) -> Rule {
    let ids: Vec<GrammarId> = symbols
        .iter()
        .map(|s| s.as_nonterminal().expect("cluster_terminals leaves only nonterminals"))
        .collect();
    debug_assert!(ids.len() >= 2);
    if ids.len() == 2 {
        return Rule::from_symbols([Symbol::Nonterminal(ids[0]), Symbol::Nonterminal(ids[1])]);
    }
    let mut prev = ids[0];
    for &cur in &ids[1..ids.len() - 1] {
        prev = get_or_create_pair(arena, pair_map, prev, cur);
    }
    let last = *ids.last().expect("non-empty");
    Rule::from_symbols([Symbol::Nonterminal(prev), Symbol::Nonterminal(last)])
}

fn get_or_create_pair(
    arena: &mut GrammarArena,
    pair_map: &mut HashMap<(GrammarId, GrammarId), GrammarId>,
    a: GrammarId,
    b: GrammarId,
) -> GrammarId {
    if let Some(&id) = pair_map.get(&(a, b)) {
        return id;
    }
    let id = arena.new_grammar();
    arena.insert_unchecked(id, Rule::from_symbols([Symbol::Nonterminal(a), Symbol::Nonterminal(b)]));
    pair_map.insert((a, b), id);
    id
}
