mod p {
    include!(concat!(env!("OUT_DIR"), "/arithmetic_prec/arithmeticprectable.rs"));
}
use p::ArithmeticPrecTable as T;

use crate::reductions;

// expr : expr PLUS expr (1) | expr MINUS expr (2) | expr STAR expr (3)
//      | expr SLASH expr (4) | expr CARET expr (5)
//      | MINUS expr %prec UMINUS (6) | NUM (7) | LPAREN expr RPAREN (8)

#[test]
fn precedence() {
    // NUM + NUM * NUM
    assert_eq!(
        reductions(T::TABLES, &[T::T_NUM, T::T_PLUS, T::T_NUM, T::T_STAR, T::T_NUM]),
        Some(vec![7, 7, 7, 3, 1])
    );
    // NUM * NUM + NUM
    assert_eq!(
        reductions(T::TABLES, &[T::T_NUM, T::T_STAR, T::T_NUM, T::T_PLUS, T::T_NUM]),
        Some(vec![7, 7, 3, 7, 1])
    );
}

#[test]
fn associativity() {
    // NUM - NUM - NUM groups to the left
    assert_eq!(
        reductions(T::TABLES, &[T::T_NUM, T::T_MINUS, T::T_NUM, T::T_MINUS, T::T_NUM]),
        Some(vec![7, 7, 2, 7, 2])
    );
    // NUM ^ NUM ^ NUM groups to the right
    assert_eq!(
        reductions(T::TABLES, &[T::T_NUM, T::T_CARET, T::T_NUM, T::T_CARET, T::T_NUM]),
        Some(vec![7, 7, 7, 5, 5])
    );
}

#[test]
fn unary_minus() {
    // - NUM + NUM
    assert_eq!(
        reductions(T::TABLES, &[T::T_MINUS, T::T_NUM, T::T_PLUS, T::T_NUM]),
        Some(vec![7, 6, 7, 1])
    );
    // - NUM ^ NUM
    assert_eq!(
        reductions(T::TABLES, &[T::T_MINUS, T::T_NUM, T::T_CARET, T::T_NUM]),
        Some(vec![7, 6, 7, 5])
    );
}

#[test]
fn precedence_only_token_is_declared() {
    assert_eq!(T::T_UMINUS, 9);
    assert_eq!(T::SPELL[T::T_UMINUS as usize], None);
    assert_eq!(reductions(T::TABLES, &[T::T_NUM, T::T_UMINUS, T::T_NUM]), None);
}
