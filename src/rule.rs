//! Production rules: ordered sequences of symbols.

use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};
use crate::symbol::{GrammarId, Symbol, Terminal};

/// An ordered sequence of symbols, the right-hand side of a production.
///
/// The empty sequence denotes the ε-production. A rule is *unit* iff it has
/// length 1 and its sole symbol is a nonterminal. Equality is positional;
/// hashing mixes per-position hashes so that `[a, b]` and `[b, a]` hash
/// differently (spec §4.1).
#[derive(Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule(Vec<Symbol>);

impl Rule {
    /// The empty rule (the ε-production).
    pub fn empty() -> Self {
        Rule(Vec::new())
    }

    /// Builds a rule from an ordered list of symbols.
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Rule(symbols.into_iter().collect())
    }

    /// Builds a rule from a single symbol.
    pub fn from_symbol(symbol: impl Into<Symbol>) -> Self {
        Rule(vec![symbol.into()])
    }

    /// Builds a rule whose symbols are the terminals of `text`, one per
    /// character. Fails with [`Error::InvalidTerminal`] on the first
    /// non-printable-ASCII character.
    pub fn from_str(text: &str) -> Result<Self> {
        let mut symbols = Vec::with_capacity(text.chars().count());
        for ch in text.chars() {
            symbols.push(Symbol::Terminal(Terminal::new(ch)?));
        }
        Ok(Rule(symbols))
    }

    /// The rule's symbols, in order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` iff this is the empty rule.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` iff this rule has exactly one symbol and it's a nonterminal.
    pub fn is_unit(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_nonterminal()
    }

    /// The sole nonterminal of a unit rule, or `None` if this isn't one.
    pub fn unit_nonterminal(&self) -> Option<GrammarId> {
        if self.is_unit() {
            self.0[0].as_nonterminal()
        } else {
            None
        }
    }

    /// `true` iff `symbol` occurs anywhere in this rule.
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.0.contains(&symbol)
    }

    /// Appends a symbol, rule, or terminal string to this rule's end.
    pub fn append(&mut self, other: impl Into<Rule>) {
        self.0.extend(other.into().0);
    }

    /// Removes every occurrence of `symbol`, returning the count removed.
    pub fn prune(&mut self, symbol: Symbol) -> usize {
        self.prune_if(|s| *s == symbol)
    }

    /// Removes every symbol satisfying `pred`, returning the count removed.
    pub fn prune_if(&mut self, mut pred: impl FnMut(&Symbol) -> bool) -> usize {
        let before = self.0.len();
        self.0.retain(|s| !pred(s));
        before - self.0.len()
    }

    /// Returns a copy of this rule with the symbol at `index` deleted.
    pub(crate) fn without_index(&self, index: usize) -> Rule {
        let mut symbols = self.0.clone();
        symbols.remove(index);
        Rule(symbols)
    }

    /// Indices at which `symbol` occurs, in order.
    pub(crate) fn indices_of(&self, symbol: Symbol) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(move |(_, s)| **s == symbol)
            .map(|(i, _)| i)
    }
}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-sensitive avalanching mix, per spec §4.1:
        // seed <- seed ^ (h + C + (seed << 6) + (seed >> 2))
        const MIX_CONST: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut seed: u64 = 0;
        for symbol in &self.0 {
            let mut sub = std::collections::hash_map::DefaultHasher::new();
            symbol.hash(&mut sub);
            let h = sub.finish();
            seed ^= h
                .wrapping_add(MIX_CONST)
                .wrapping_add(seed << 6)
                .wrapping_add(seed >> 2);
        }
        state.write_u64(seed);
    }
}

impl From<Symbol> for Rule {
    fn from(symbol: Symbol) -> Self {
        Rule::from_symbol(symbol)
    }
}

impl From<Terminal> for Rule {
    fn from(term: Terminal) -> Self {
        Rule::from_symbol(term)
    }
}

impl From<GrammarId> for Rule {
    fn from(id: GrammarId) -> Self {
        Rule::from_symbol(id)
    }
}

impl std::ops::Add<Symbol> for Rule {
    type Output = Rule;

    fn add(mut self, rhs: Symbol) -> Rule {
        self.append(rhs);
        self
    }
}

impl std::ops::Add<Rule> for Rule {
    type Output = Rule;

    fn add(mut self, rhs: Rule) -> Rule {
        self.append(rhs);
        self
    }
}

impl std::ops::AddAssign<Symbol> for Rule {
    fn add_assign(&mut self, rhs: Symbol) {
        self.append(rhs);
    }
}

impl std::ops::AddAssign<Rule> for Rule {
    fn add_assign(&mut self, rhs: Rule) {
        self.append(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(ch: char) -> Symbol {
        Symbol::Terminal(Terminal::new(ch).unwrap())
    }

    fn n(index: usize) -> Symbol {
        Symbol::Nonterminal(GrammarId::from_index(index))
    }

    #[test]
    fn unit_rule_detection() {
        let unit = Rule::from_symbols([n(0)]);
        assert!(unit.is_unit());
        let not_unit = Rule::from_symbols([n(0), n(1)]);
        assert!(!not_unit.is_unit());
        let term_only = Rule::from_symbols([t('a')]);
        assert!(!term_only.is_unit());
    }

    #[test]
    fn hash_is_order_sensitive() {
        use std::collections::hash_map::DefaultHasher;
        let ab = Rule::from_symbols([t('a'), t('b')]);
        let ba = Rule::from_symbols([t('b'), t('a')]);
        let hash_of = |r: &Rule| {
            let mut h = DefaultHasher::new();
            r.hash(&mut h);
            h.finish()
        };
        assert_ne!(hash_of(&ab), hash_of(&ba));
        assert_ne!(ab, ba);
    }

    #[test]
    fn prune_removes_all_occurrences() {
        let mut rule = Rule::from_symbols([n(0), t('a'), n(0), t('b')]);
        let removed = rule.prune(n(0));
        assert_eq!(removed, 2);
        assert_eq!(rule.len(), 2);
    }

    #[test]
    fn from_str_builds_terminal_rule() {
        let rule = Rule::from_str("ab").unwrap();
        assert_eq!(rule.len(), 2);
        assert!(rule.symbols().iter().all(|s| s.is_terminal()));
    }

    #[test]
    fn from_str_rejects_invalid_terminal() {
        assert!(Rule::from_str("a\u{7F}b").is_err());
    }
}
