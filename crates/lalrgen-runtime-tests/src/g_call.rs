mod p {
    include!(concat!(env!("OUT_DIR"), "/call/calltable.rs"));
}
use p::CallTable as T;

use crate::reductions;

// call ::= ID LPAREN args RPAREN (1)
// args ::= (2) | arg.list (3)
// arg.list ::= ID (4) | arg.list COMMA ID (5)

#[test]
fn empty_arguments() {
    assert_eq!(
        reductions(T::TABLES, &[T::T_ID, T::T_LPAREN, T::T_RPAREN]),
        Some(vec![2, 1])
    );
}

#[test]
fn argument_list() {
    let tokens = [
        T::T_ID,
        T::T_LPAREN,
        T::T_ID,
        T::T_COMMA,
        T::T_ID,
        T::T_RPAREN,
    ];
    assert_eq!(reductions(T::TABLES, &tokens), Some(vec![4, 5, 3, 1]));
}

#[test]
fn trailing_comma_is_rejected() {
    let tokens = [T::T_ID, T::T_LPAREN, T::T_ID, T::T_COMMA, T::T_RPAREN];
    assert_eq!(reductions(T::TABLES, &tokens), None);
}

#[test]
fn nonterminal_names_are_spelled() {
    let names: Vec<_> = T::SPELL[T::TERMINAL_COUNT as usize..].to_vec();
    assert_eq!(
        names,
        [Some("$accept"), Some("call"), Some("args"), Some("arg.list")]
    );
}
