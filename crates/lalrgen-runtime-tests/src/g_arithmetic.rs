mod p {
    include!(concat!(env!("OUT_DIR"), "/arithmetic/arithmetictable.rs"));
}
use p::ArithmeticTable as G;

#[allow(unused_imports)]
use lalrgen_runtime::engine::{ParseEngine, ParseEvent::*, Symbol::*};

#[allow(unused_macros)]
macro_rules! assert_matches {
    ($($t:tt)*) => { assert!(matches!($($t)*)) };
}

// expr ::= expr PLUS term (1) | expr MINUS term (2) | term (3)
// term ::= term STAR factor (4) | term SLASH factor (5) | factor (6)
// factor ::= MINUS factor (7) | atom (8)
// atom ::= NUM (9) | LPAREN expr RPAREN (10)
const EXPR: i32 = 1;
const TERM: i32 = 2;
const FACTOR: i32 = 3;
const ATOM: i32 = 4;

#[test]
fn simple_expr() {
    let mut parser = ParseEngine::new(G::TABLES);

    macro_rules! offer_input {
        ($tok:expr) => {
            assert_matches!(parser.resume(), Ok(InputNeeded));
            parser.offer_token($tok).unwrap();
        };
        () => {
            assert_matches!(parser.resume(), Ok(InputNeeded));
            parser.offer_eoi().unwrap();
        };
    }

    // tokens: NUM PLUS NUM STAR NUM $end
    //
    // States whose only action is a reduction do not wait for a lookahead.

    offer_input!(G::T_NUM);
    assert_matches!(parser.resume(), Ok(Shifting(&G::T_NUM)));
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 9, lhs: ATOM, args: [T(G::T_NUM)] })
    );
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 8, lhs: FACTOR, args: [N(ATOM)] })
    );
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 6, lhs: TERM, args: [N(FACTOR)] })
    );

    offer_input!(G::T_PLUS);
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 3, lhs: EXPR, args: [N(TERM)] })
    );
    assert_matches!(parser.resume(), Ok(Shifting(&G::T_PLUS)));

    offer_input!(G::T_NUM);
    assert_matches!(parser.resume(), Ok(Shifting(&G::T_NUM)));
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 9, lhs: ATOM, args: [T(G::T_NUM)] })
    );
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 8, lhs: FACTOR, args: [N(ATOM)] })
    );
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 6, lhs: TERM, args: [N(FACTOR)] })
    );

    offer_input!(G::T_STAR);
    assert_matches!(parser.resume(), Ok(Shifting(&G::T_STAR)));

    offer_input!(G::T_NUM);
    assert_matches!(parser.resume(), Ok(Shifting(&G::T_NUM)));
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 9, lhs: ATOM, args: [T(G::T_NUM)] })
    );
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 8, lhs: FACTOR, args: [N(ATOM)] })
    );
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 4, lhs: TERM, args: [N(TERM), T(G::T_STAR), N(FACTOR)] })
    );

    offer_input!();
    assert_matches!(
        parser.resume(),
        Ok(AboutToReduce { rule: 1, lhs: EXPR, args: [N(EXPR), T(G::T_PLUS), N(TERM)] })
    );
    assert_matches!(parser.resume(), Ok(Accepted));
    assert_matches!(parser.resume(), Err(..));
}

#[test]
fn parenthesized() {
    // ( NUM MINUS NUM ) SLASH MINUS NUM
    let tokens = [
        G::T_LPAREN,
        G::T_NUM,
        G::T_MINUS,
        G::T_NUM,
        G::T_RPAREN,
        G::T_SLASH,
        G::T_MINUS,
        G::T_NUM,
    ];
    assert_eq!(
        crate::reductions(G::TABLES, &tokens),
        Some(vec![9, 8, 6, 3, 9, 8, 6, 2, 10, 8, 6, 9, 8, 7, 5, 3])
    );
}

#[test]
fn rejected() {
    let mut parser = ParseEngine::new(G::TABLES);
    let mut tokens = [G::T_NUM, G::T_PLUS, G::T_RPAREN].into_iter();
    loop {
        match parser.resume().unwrap() {
            InputNeeded => parser.offer_token(tokens.next().unwrap()).unwrap(),
            Rejected { lookahead, .. } => {
                assert_eq!(lookahead, Some(&G::T_RPAREN));
                break;
            }
            Accepted => panic!("unexpected accept"),
            _ => {}
        }
    }
}
