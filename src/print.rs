//! Deterministic pretty-printing for `print`/`print_normalized` (spec §6),
//! an explicitly out-of-scope-to-harden external collaborator: format and
//! naming are specified exactly, but no themes/color/configuration exist.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::grammar::GrammarArena;
use crate::rule::Rule;
use crate::symbol::{GrammarId, Symbol};
use crate::traverse;

/// Assigns a stable diagnostic label to every nonterminal encountered while
/// printing: a registered name if the parser has one, otherwise a
/// first-seen-order synthetic label (`_1`, `_2`, ...). Name book-keeping for
/// diagnostics is the spec's own "external collaborator" boundary, so this
/// is deliberately minimal.
struct NameBook<'a> {
    known: &'a HashMap<GrammarId, String>,
    synthetic: HashMap<GrammarId, String>,
    next: usize,
}

impl<'a> NameBook<'a> {
    fn new(known: &'a HashMap<GrammarId, String>) -> Self {
        NameBook {
            known,
            synthetic: HashMap::new(),
            next: 0,
        }
    }

    fn label(&mut self, id: GrammarId) -> String {
        if let Some(name) = self.known.get(&id) {
            return name.clone();
        }
        if let Some(name) = self.synthetic.get(&id) {
            return name.clone();
        }
        self.next += 1;
        let name = format!("_{}", self.next);
        self.synthetic.insert(id, name.clone());
        name
    }
}

/// Total order for rules within one nonterminal's printed block: more
/// nonterminals first, then longer rules first, then symbol-wise with
/// nonterminals ranked above terminals and identity as the final tie-break.
fn rule_cmp(a: &Rule, b: &Rule) -> Ordering {
    let nt_count = |r: &Rule| r.symbols().iter().filter(|s| s.is_nonterminal()).count();
    nt_count(b)
        .cmp(&nt_count(a))
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| {
            for (sa, sb) in a.symbols().iter().zip(b.symbols().iter()) {
                let ord = symbol_cmp(*sa, *sb);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        })
}

fn symbol_cmp(a: Symbol, b: Symbol) -> Ordering {
    match (a, b) {
        (Symbol::Nonterminal(_), Symbol::Terminal(_)) => Ordering::Less,
        (Symbol::Terminal(_), Symbol::Nonterminal(_)) => Ordering::Greater,
        (Symbol::Nonterminal(ga), Symbol::Nonterminal(gb)) => ga.cmp(&gb),
        (Symbol::Terminal(ta), Symbol::Terminal(tb)) => ta.get().cmp(&tb.get()),
    }
}

/// Renders every nonterminal reachable from `root`, in pre-order, as
/// `NAME -> RULE` blocks with underline lines. `normalized` selects `(NAME)`
/// bracketing (normalized output) over `[NAME]` (source output).
pub fn render(
    arena: &GrammarArena,
    known_names: &HashMap<GrammarId, String>,
    root: GrammarId,
    normalized: bool,
) -> String {
    let mut book = NameBook::new(known_names);
    let order = traverse::dfs_preorder_collect(arena, root);
    let mut out = String::new();
    for id in order {
        let name = book.label(id);
        let mut rules: Vec<Rule> = arena.rules(id).cloned().collect();
        rules.sort_by(rule_cmp);
        render_nonterminal(&mut out, &mut book, &name, &rules, normalized);
    }
    out
}

fn render_nonterminal(out: &mut String, book: &mut NameBook, name: &str, rules: &[Rule], normalized: bool) {
    let indent = " ".repeat(name.len() + 4);
    for (i, rule) in rules.iter().enumerate() {
        let prefix = if i == 0 {
            format!("{name} -> ")
        } else {
            indent.clone()
        };
        let (text, underline) = render_rule(book, rule, normalized);
        out.push_str(&prefix);
        out.push_str(&text);
        out.push('\n');
        out.push_str(&" ".repeat(prefix.len()));
        out.push_str(&underline);
        out.push('\n');
    }
}

fn render_rule(book: &mut NameBook, rule: &Rule, normalized: bool) -> (String, String) {
    if rule.is_empty() {
        let text = "empty rule".to_string();
        let underline = "^".repeat(text.chars().count());
        return (text, underline);
    }
    let mut text = String::new();
    let mut underline = String::new();
    for symbol in rule.symbols() {
        match symbol {
            Symbol::Terminal(term) => {
                text.push(term.get());
                underline.push(' ');
            }
            Symbol::Nonterminal(id) => {
                let label = book.label(*id);
                let bracketed = if normalized {
                    format!("({label})")
                } else {
                    format!("[{label}]")
                };
                underline.push_str(&"^".repeat(bracketed.chars().count()));
                text.push_str(&bracketed);
            }
        }
    }
    (text, underline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Terminal;

    #[test]
    fn empty_rule_renders_with_full_width_underline() {
        let mut arena = GrammarArena::new();
        let s = arena.new_grammar();
        arena.insert(s, Rule::empty()).unwrap();
        let known = HashMap::new();
        let rendered = render(&arena, &known, s, false);
        assert!(rendered.contains("empty rule"));
        assert!(rendered.contains("^^^^^^^^^^"));
    }

    #[test]
    fn nonterminal_reference_uses_bracket_matching_mode() {
        let mut arena = GrammarArena::new();
        let s = arena.new_grammar();
        let a = arena.new_grammar();
        arena
            .insert(s, Rule::from_symbols([Symbol::Nonterminal(a)]))
            .unwrap();
        arena
            .insert(a, Rule::from_symbols([Symbol::Terminal(Terminal::new('a').unwrap())]))
            .unwrap();
        let mut known = HashMap::new();
        known.insert(s, "S".to_string());
        known.insert(a, "A".to_string());

        let source = render(&arena, &known, s, false);
        assert!(source.contains("[A]"));
        let norm = render(&arena, &known, s, true);
        assert!(norm.contains("(A)"));
    }

    #[test]
    fn rule_order_prefers_more_and_longer_nonterminal_heavy_rules() {
        let a = GrammarId::from_index(0);
        let b = GrammarId::from_index(1);
        let mut rules = vec![
            Rule::from_symbols([Symbol::Terminal(Terminal::new('x').unwrap())]),
            Rule::from_symbols([Symbol::Nonterminal(a), Symbol::Nonterminal(b)]),
        ];
        rules.sort_by(rule_cmp);
        assert!(rules[0].symbols().iter().all(|s| s.is_nonterminal()));
    }
}
