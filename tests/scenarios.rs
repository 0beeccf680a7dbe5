//! Black-box end-to-end scenarios, reproduced literally from the spec's
//! worked examples (balanced brackets, arithmetic-like expressions, plain
//! concatenation, epsilon/unit-elimination correctness, redundant-rule
//! rejection).

use cfg_cnf::{Error, Parser, Rule, Symbol};

fn t(ch: char) -> Symbol {
    Symbol::Terminal(cfg_cnf::Terminal::new(ch).unwrap())
}

#[test]
fn dyck3_balanced_brackets() {
    env_logger::try_init().ok();
    let mut parser = Parser::new();
    let d = parser.create("D").unwrap();
    let nt = Symbol::Nonterminal(d);

    parser.insert("D", Rule::empty()).unwrap();
    parser.insert("D", Rule::from_symbols([nt, nt])).unwrap();
    parser
        .insert("D", Rule::from_symbols([t('('), nt, t(')')]))
        .unwrap();
    parser
        .insert("D", Rule::from_symbols([t('['), nt, t(']')]))
        .unwrap();
    parser
        .insert("D", Rule::from_symbols([t('{'), nt, t('}')]))
        .unwrap();

    for word in ["", "()", "([{}])", "([]){(())}[{([])}]()"] {
        assert!(parser.parse("D", word).unwrap(), "expected accept: {word}");
    }
    for word in ["(", "]", "[{(([]))}])", "){{}}[(([]))]"] {
        assert!(!parser.parse("D", word).unwrap(), "expected reject: {word}");
    }
}

#[test]
fn arithmetic_like_expressions() {
    let mut parser = Parser::new();
    let term = parser.create("Term").unwrap();
    let sum = parser.create("Sum").unwrap();
    let expr = parser.create("Expr").unwrap();

    let term_nt = Symbol::Nonterminal(term);
    let sum_nt = Symbol::Nonterminal(sum);

    // Term -> x | y | z | T T | T ( S ) T | ( S ) T
    parser.insert("Term", Rule::from_symbols([t('x')])).unwrap();
    parser.insert("Term", Rule::from_symbols([t('y')])).unwrap();
    parser.insert("Term", Rule::from_symbols([t('z')])).unwrap();
    parser
        .insert("Term", Rule::from_symbols([term_nt, term_nt]))
        .unwrap();
    parser
        .insert(
            "Term",
            Rule::from_symbols([term_nt, t('('), sum_nt, t(')'), term_nt]),
        )
        .unwrap();
    parser
        .insert("Term", Rule::from_symbols([t('('), sum_nt, t(')'), term_nt]))
        .unwrap();

    // Sum -> T + T | Sum + T
    parser
        .insert("Sum", Rule::from_symbols([term_nt, t('+'), term_nt]))
        .unwrap();
    parser
        .insert("Sum", Rule::from_symbols([sum_nt, t('+'), term_nt]))
        .unwrap();

    // Expr -> T | S
    parser.insert("Expr", Rule::from_symbols([term_nt])).unwrap();
    parser.insert("Expr", Rule::from_symbols([sum_nt])).unwrap();

    for word in [
        "x",
        "xyz",
        "x + yz",
        "xz(yz + x)zxy",
        "(x + xy)zy + x(y + z)",
    ] {
        assert!(parser.parse("Expr", word).unwrap(), "expected accept: {word}");
    }
    for word in [
        "",
        "+ xyz",
        "x + y + dz",
        "(x + yz) + y",
        "x(yz)",
        "((x + yz))xz",
    ] {
        assert!(!parser.parse("Expr", word).unwrap(), "expected reject: {word}");
    }
}

#[test]
fn plain_concatenation() {
    let mut parser = Parser::new();
    let a = parser.create_with_rules("A", [Rule::from_str("a").unwrap()]).unwrap();
    let b = parser.create_with_rules("B", [Rule::from_str("b").unwrap()]).unwrap();
    parser
        .create_with_rules(
            "AB",
            [Rule::from_symbols([
                Symbol::Nonterminal(a),
                Symbol::Nonterminal(b),
            ])],
        )
        .unwrap();

    assert!(parser.parse("AB", "ab").unwrap());
    for word in ["a", "b", "ba", ""] {
        assert!(!parser.parse("AB", word).unwrap());
    }
}

#[test]
fn epsilon_elimination_correctness() {
    // S -> A B, A -> a | ε, B -> b
    let mut parser = Parser::new();
    let a = parser.create("A").unwrap();
    let b = parser.create("B").unwrap();
    parser
        .create_with_rules(
            "S",
            [Rule::from_symbols([
                Symbol::Nonterminal(a),
                Symbol::Nonterminal(b),
            ])],
        )
        .unwrap();
    parser.insert("A", Rule::from_symbols([t('a')])).unwrap();
    parser.insert("A", Rule::empty()).unwrap();
    parser.insert("B", Rule::from_symbols([t('b')])).unwrap();

    assert!(parser.parse("S", "b").unwrap());
    assert!(parser.parse("S", "ab").unwrap());
    assert!(!parser.parse("S", "").unwrap());
}

#[test]
fn unit_elimination_correctness() {
    // S -> A, A -> B, B -> c
    let mut parser = Parser::new();
    let b = parser.create_with_rules("B", [Rule::from_symbols([t('c')])]).unwrap();
    let a = parser
        .create_with_rules("A", [Rule::from_symbols([Symbol::Nonterminal(b)])])
        .unwrap();
    parser
        .create_with_rules("S", [Rule::from_symbols([Symbol::Nonterminal(a)])])
        .unwrap();

    assert!(parser.parse("S", "c").unwrap());
    assert!(!parser.parse("S", "cc").unwrap());
}

#[test]
fn redundant_self_rule_rejected_and_grammar_unchanged() {
    let mut parser = Parser::new();
    let g = parser.create("G").unwrap();
    let self_rule = Rule::from_symbols([Symbol::Nonterminal(g)]);
    let err = parser.insert("G", self_rule).unwrap_err();
    assert!(matches!(err, Error::RedundantRule));
    // Grammar is left with no rules, so normalizing it is a precondition
    // violation rather than a silently-accepted empty language.
    assert!(matches!(
        parser.parse("G", "anything"),
        Err(Error::EmptyReachableNonterminal(_))
    ));
}
