mod p {
    include!(concat!(env!("OUT_DIR"), "/balanced/balancedtable.rs"));
}
use p::BalancedTable as T;

use crate::reductions;

#[test]
fn constants() {
    assert_eq!(T::EOF_SYMBOL, 0);
    assert_eq!(T::a, 1);
    assert_eq!(T::b, 2);
    assert_eq!(T::TERMINAL_COUNT, 3);
    assert_eq!(T::NON_TERMINAL_COUNT, 2);
    assert_eq!(T::RULE_COUNT, 3);
    assert_eq!(T::STATE_COUNT, 7);
    assert_eq!(T::SPELL[..3], [None, Some("a"), Some("b")]);
}

#[test]
fn nested_pairs() {
    assert_eq!(reductions(T::TABLES, &[T::a, T::b]), Some(vec![2]));
    assert_eq!(
        reductions(T::TABLES, &[T::a, T::a, T::a, T::b, T::b, T::b]),
        Some(vec![2, 1, 1])
    );
}

#[test]
fn unbalanced_input_is_rejected() {
    assert_eq!(reductions(T::TABLES, &[]), None);
    assert_eq!(reductions(T::TABLES, &[T::a]), None);
    assert_eq!(reductions(T::TABLES, &[T::a, T::a, T::b]), None);
    assert_eq!(reductions(T::TABLES, &[T::a, T::b, T::b]), None);
    assert_eq!(reductions(T::TABLES, &[T::b, T::a]), None);
}

#[test]
fn accept_state_is_reached_through_end_of_input() {
    // $accept ::= S . $end
    let state = T::nt_action(0, 1);
    assert_eq!(T::t_action(state, T::EOF_SYMBOL), T::ACCEPT_STATE);
}
