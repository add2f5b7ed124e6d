mod p {
    include!(concat!(env!("OUT_DIR"), "/dangling_else/danglingelsetable.rs"));
}
use p::DanglingElseTable as T;

use crate::reductions;

#[test]
fn else_binds_to_the_nearest_if() {
    // IF EXPR THEN IF EXPR THEN OTHER ELSE OTHER
    let tokens = [
        T::IF,
        T::EXPR,
        T::THEN,
        T::IF,
        T::EXPR,
        T::THEN,
        T::OTHER,
        T::ELSE,
        T::OTHER,
    ];
    assert_eq!(reductions(T::TABLES, &tokens), Some(vec![3, 3, 2, 1]));
}

#[test]
fn if_else() {
    let tokens = [T::IF, T::EXPR, T::THEN, T::OTHER, T::ELSE, T::OTHER];
    assert_eq!(reductions(T::TABLES, &tokens), Some(vec![3, 3, 2]));
    assert_eq!(reductions(T::TABLES, &[T::ELSE, T::OTHER]), None);
}
