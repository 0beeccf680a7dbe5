//! The grammar arena: identity-addressed grammar nodes and their operations.

use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::rule::Rule;
use crate::symbol::{GrammarId, Symbol, Terminal};

#[derive(Default)]
struct DerivedSets {
    terminals: HashSet<Terminal>,
    nonterminals: HashSet<GrammarId>,
    stale: bool,
}

struct GrammarNode {
    rules: HashSet<Rule>,
    derived: RefCell<DerivedSets>,
}

impl GrammarNode {
    fn empty() -> Self {
        GrammarNode {
            rules: HashSet::new(),
            derived: RefCell::new(DerivedSets::default()),
        }
    }

    fn insert_members(derived: &mut DerivedSets, rule: &Rule) {
        for symbol in rule.symbols() {
            match *symbol {
                Symbol::Terminal(term) => {
                    derived.terminals.insert(term);
                }
                Symbol::Nonterminal(id) => {
                    derived.nonterminals.insert(id);
                }
            }
        }
    }

    fn recompute(&self) {
        let mut derived = self.derived.borrow_mut();
        derived.terminals.clear();
        derived.nonterminals.clear();
        for rule in &self.rules {
            Self::insert_members(&mut derived, rule);
        }
        derived.stale = false;
    }
}

/// `true` iff `rule` is the redundant self-unit rule `id -> id` (spec §3).
pub(crate) fn is_redundant(id: GrammarId, rule: &Rule) -> bool {
    rule.unit_nonterminal() == Some(id)
}

/// Owns every [`crate::symbol::GrammarId`]-addressed grammar node live in one
/// [`crate::registry::Parser`] instance: user-registered grammars and every
/// synthetic node normalization allocates (singletons, pair nodes, deep-copy
/// targets). Handles are stable for the arena's lifetime (I5); nothing is
/// ever removed, only appended, so no `GrammarId` is ever invalidated.
#[derive(Default)]
pub struct GrammarArena {
    nodes: Vec<GrammarNode>,
}

impl GrammarArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        GrammarArena { nodes: Vec::new() }
    }

    /// Allocates a fresh, empty grammar node and returns its handle.
    pub fn new_grammar(&mut self) -> GrammarId {
        self.nodes.push(GrammarNode::empty());
        GrammarId::from_index(self.nodes.len() - 1)
    }

    /// Allocates a grammar node pre-populated with `rules`, checked
    /// transactionally: if any rule would be redundant, nothing is
    /// allocated and the first offending error is returned.
    pub fn new_grammar_with_rules(
        &mut self,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Result<GrammarId> {
        let rules: Vec<Rule> = rules.into_iter().collect();
        let id = self.new_grammar();
        for rule in rules {
            if let Err(err) = self.insert(id, rule) {
                self.nodes.pop();
                return Err(err);
            }
        }
        Ok(id)
    }

    fn node(&self, id: GrammarId) -> &GrammarNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: GrammarId) -> &mut GrammarNode {
        &mut self.nodes[id.index()]
    }

    /// Inserts `rule` into `id`'s rule set.
    ///
    /// Fails with [`Error::RedundantRule`] if the rule is `id -> id`.
    /// Returns `Ok(true)` iff the rule wasn't already present.
    pub fn insert(&mut self, id: GrammarId, rule: Rule) -> Result<bool> {
        if is_redundant(id, &rule) {
            return Err(Error::RedundantRule);
        }
        let node = self.node_mut(id);
        let inserted = node.rules.insert(rule.clone());
        if inserted {
            let mut derived = node.derived.borrow_mut();
            if !derived.stale {
                GrammarNode::insert_members(&mut derived, &rule);
            }
        }
        Ok(inserted)
    }

    /// Inserts `rule` without the redundancy check. Only used by callers
    /// (deep copy, normalization) that can prove the rule can't be
    /// redundant by construction.
    pub(crate) fn insert_unchecked(&mut self, id: GrammarId, rule: Rule) -> bool {
        let node = self.node_mut(id);
        let inserted = node.rules.insert(rule.clone());
        if inserted {
            let mut derived = node.derived.borrow_mut();
            if !derived.stale {
                GrammarNode::insert_members(&mut derived, &rule);
            }
        }
        inserted
    }

    /// Removes `rule` from `id`'s rule set, marking derived sets stale.
    /// Returns `true` iff the rule was present.
    pub fn erase(&mut self, id: GrammarId, rule: &Rule) -> bool {
        let node = self.node_mut(id);
        let erased = node.rules.remove(rule);
        if erased {
            node.derived.borrow_mut().stale = true;
        }
        erased
    }

    /// Empties `id`'s rule set.
    pub fn clear(&mut self, id: GrammarId) {
        let node = self.node_mut(id);
        node.rules.clear();
        let mut derived = node.derived.borrow_mut();
        derived.terminals.clear();
        derived.nonterminals.clear();
        derived.stale = false;
    }

    /// `true` iff `rule` is in `id`'s rule set.
    pub fn contains(&self, id: GrammarId, rule: &Rule) -> bool {
        self.node(id).rules.contains(rule)
    }

    /// Number of distinct rules in `id`.
    pub fn size(&self, id: GrammarId) -> usize {
        self.node(id).rules.len()
    }

    /// `true` iff `id` has no rules at all (not even the empty rule).
    pub fn is_empty(&self, id: GrammarId) -> bool {
        self.node(id).rules.is_empty()
    }

    /// Iterates `id`'s rules in unspecified order.
    pub fn rules(&self, id: GrammarId) -> impl Iterator<Item = &Rule> {
        self.node(id).rules.iter()
    }

    /// The set of terminals directly mentioned by `id`'s rules,
    /// recomputing from scratch if the cache is stale.
    pub fn terminals(&self, id: GrammarId) -> Ref<'_, HashSet<Terminal>> {
        let node = self.node(id);
        if node.derived.borrow().stale {
            node.recompute();
        }
        Ref::map(node.derived.borrow(), |d| &d.terminals)
    }

    /// The set of nonterminals directly mentioned by `id`'s rules,
    /// recomputing from scratch if the cache is stale.
    pub fn nonterminals(&self, id: GrammarId) -> Ref<'_, HashSet<GrammarId>> {
        let node = self.node(id);
        if node.derived.borrow().stale {
            node.recompute();
        }
        Ref::map(node.derived.borrow(), |d| &d.nonterminals)
    }

    /// Union assignment: inserts the unit rule `id -> other`, silently
    /// skipping the insertion if that rule would be redundant (spec §4.2).
    pub fn union_assign(&mut self, id: GrammarId, other: GrammarId) {
        let rule = Rule::from_symbol(other);
        if !is_redundant(id, &rule) {
            self.insert_unchecked(id, rule);
        }
    }

    /// Concatenation assignment: replaces every rule `r` of `id` with
    /// `r . other` (appending `other` as a nonterminal suffix), silently
    /// dropping any result that would be redundant (spec §4.2).
    pub fn concat_assign(&mut self, id: GrammarId, other: GrammarId) {
        let old_rules: Vec<Rule> = self.node(id).rules.iter().cloned().collect();
        self.clear(id);
        for mut rule in old_rules {
            rule.append(Symbol::Nonterminal(other));
            if !is_redundant(id, &rule) {
                self.insert_unchecked(id, rule);
            }
        }
    }

    /// Deep-copies the entire subgraph reachable from `root` (root
    /// included) into fresh nodes of this same arena, returning the
    /// old-id -> new-id mapping. Every copied rule has the same symbol
    /// sequence as the original with nonterminals rewritten through the
    /// mapping; terminals are unchanged (spec §4.2).
    pub fn deep_copy(&mut self, root: GrammarId) -> HashMap<GrammarId, GrammarId> {
        let reachable = crate::traverse::dfs_preorder_collect(self, root);

        let mut mapping = HashMap::with_capacity(reachable.len());
        for &old_id in &reachable {
            mapping.insert(old_id, self.new_grammar());
        }

        for &old_id in &reachable {
            let new_id = mapping[&old_id];
            let rules: Vec<Rule> = self.node(old_id).rules.iter().cloned().collect();
            for rule in rules {
                let remapped = Rule::from_symbols(rule.symbols().iter().map(|symbol| match symbol
                {
                    Symbol::Terminal(term) => Symbol::Terminal(*term),
                    Symbol::Nonterminal(old_nt) => Symbol::Nonterminal(mapping[old_nt]),
                }));
                self.insert_unchecked(new_id, remapped);
            }
        }

        mapping
    }
}
