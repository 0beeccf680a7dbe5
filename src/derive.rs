//! The memoized CYK-style membership decision procedure (spec §4.6),
//! grounded in `original_source/src/parser.cpp`'s `internal_parser::derives`.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::grammar::GrammarArena;
use crate::symbol::{GrammarId, Symbol, Terminal};

/// Memo key: a nonterminal plus a half-open byte range `[start, end)` into
/// the word being tested. The original C++ memoizes on `(nonterminal,
/// substring)`; since every terminal here is a single printable-ASCII
/// character, a byte range is a drop-in, allocation-free substitute for
/// substring identity (recorded in DESIGN.md).
type MemoKey = (GrammarId, usize, usize);

/// `true` iff `word` is in the language of the CNF grammar rooted at
/// `root`. Only positive results are memoized, matching the spec's optional
/// negative-caching note.
pub fn derive(arena: &GrammarArena, root: GrammarId, word: &[Terminal]) -> bool {
    let memo = RefCell::new(HashMap::<MemoKey, bool>::new());
    derive_range(arena, root, word, 0, word.len(), &memo)
}

fn derive_range(
    arena: &GrammarArena,
    nonterminal: GrammarId,
    word: &[Terminal],
    start: usize,
    end: usize,
    memo: &RefCell<HashMap<MemoKey, bool>>,
) -> bool {
    let key = (nonterminal, start, end);
    if let Some(&cached) = memo.borrow().get(&key) {
        return cached;
    }

    let result = if start == end {
        arena.rules(nonterminal).any(|r| r.is_empty())
    } else if end - start == 1 {
        let ch = word[start];
        arena
            .rules(nonterminal)
            .any(|r| r.len() == 1 && r.symbols()[0].as_terminal() == Some(ch))
    } else {
        arena.rules(nonterminal).any(|r| {
            if r.len() != 2 {
                return false;
            }
            let (left, right) = match (r.symbols()[0], r.symbols()[1]) {
                (Symbol::Nonterminal(l), Symbol::Nonterminal(r)) => (l, r),
                _ => return false,
            };
            (start + 1..end).any(|split| {
                derive_range(arena, left, word, start, split, memo)
                    && derive_range(arena, right, word, split, end, memo)
            })
        })
    };

    if result {
        memo.borrow_mut().insert(key, true);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn term(ch: char) -> Terminal {
        Terminal::new(ch).unwrap()
    }

    fn word(s: &str) -> Vec<Terminal> {
        s.chars().map(term).collect()
    }

    #[test]
    fn empty_word_accepted_iff_empty_rule_present() {
        let mut arena = GrammarArena::new();
        let s = arena.new_grammar();
        assert!(!derive(&arena, s, &word("")));
        arena.insert(s, Rule::empty()).unwrap();
        assert!(derive(&arena, s, &word("")));
    }

    #[test]
    fn single_char_checks_length_one_terminal_rule() {
        let mut arena = GrammarArena::new();
        let s = arena.new_grammar();
        arena
            .insert(s, Rule::from_symbols([Symbol::Terminal(term('a'))]))
            .unwrap();
        assert!(derive(&arena, s, &word("a")));
        assert!(!derive(&arena, s, &word("b")));
    }

    #[test]
    fn binary_split_requires_both_halves_to_derive() {
        // AB -> A B, A -> a, B -> b
        let mut arena = GrammarArena::new();
        let ab = arena.new_grammar();
        let a = arena.new_grammar();
        let b = arena.new_grammar();
        arena
            .insert(ab, Rule::from_symbols([Symbol::Nonterminal(a), Symbol::Nonterminal(b)]))
            .unwrap();
        arena.insert(a, Rule::from_symbols([Symbol::Terminal(term('a'))])).unwrap();
        arena.insert(b, Rule::from_symbols([Symbol::Terminal(term('b'))])).unwrap();

        assert!(derive(&arena, ab, &word("ab")));
        assert!(!derive(&arena, ab, &word("a")));
        assert!(!derive(&arena, ab, &word("ba")));
        assert!(!derive(&arena, ab, &word("")));
    }

    #[test]
    fn non_terminating_self_recursion_still_terminates() {
        // A -> A A, A -> a : language is just "a"; must terminate for any
        // finite word even though the grammar never bottoms out via empty.
        let mut arena = GrammarArena::new();
        let a = arena.new_grammar();
        arena
            .insert(a, Rule::from_symbols([Symbol::Nonterminal(a), Symbol::Nonterminal(a)]))
            .unwrap();
        arena.insert(a, Rule::from_symbols([Symbol::Terminal(term('a'))])).unwrap();

        assert!(derive(&arena, a, &word("a")));
        assert!(derive(&arena, a, &word("aaa")));
        assert!(!derive(&arena, a, &word("aab")));
    }
}
