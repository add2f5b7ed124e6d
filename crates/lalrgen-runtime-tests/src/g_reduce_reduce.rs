mod p {
    include!(concat!(env!("OUT_DIR"), "/reduce_reduce/reducereducetable.rs"));
}
use p::ReduceReduceTable as T;

#[test]
fn lower_rule_wins() {
    // S ::= A (1) | B (2), A ::= x (3), B ::= x (4)
    assert_eq!(crate::reductions(T::TABLES, &[T::x]), Some(vec![3, 1]));
    assert_eq!(crate::reductions(T::TABLES, &[T::x, T::x]), None);
}
