mod p {
    include!(concat!(env!("OUT_DIR"), "/calc/calc.rs"));
}
use p::CalcTable as T;

use lalrgen_runtime::engine::{ParseEngine, ParseEvent, Token};

#[derive(Debug, Copy, Clone)]
struct Tok {
    kind: i32,
    value: i64,
}

impl Token for Tok {
    fn to_index(&self) -> i32 {
        self.kind
    }
}

fn tokenize(input: &str) -> Vec<Tok> {
    let mut tokens = vec![];
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        let kind = match c {
            ' ' => continue,
            '+' => T::T_PLUS,
            '*' => T::T_STAR,
            '(' => T::T_LPAREN,
            ')' => T::T_RPAREN,
            '0'..='9' => {
                let mut value = c.to_digit(10).unwrap() as i64;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    value = value * 10 + d as i64;
                    chars.next();
                }
                tokens.push(Tok {
                    kind: T::T_NUM,
                    value,
                });
                continue;
            }
            c => panic!("unexpected character {:?}", c),
        };
        tokens.push(Tok { kind, value: 0 });
    }
    tokens
}

fn eval(input: &str) -> Option<i64> {
    let mut tokens = tokenize(input).into_iter();
    let mut values = vec![];
    let mut parser = ParseEngine::new(T::TABLES);
    loop {
        match parser.resume().unwrap() {
            ParseEvent::InputNeeded => match tokens.next() {
                Some(tok) => parser.offer_token(tok).unwrap(),
                None => parser.offer_eoi().unwrap(),
            },
            ParseEvent::Shifting(tok) => {
                if tok.kind == T::T_NUM {
                    values.push(tok.value);
                }
            }
            ParseEvent::AboutToReduce { rule, .. } => p::reduce(rule, &mut values),
            ParseEvent::Accepted => return values.pop(),
            ParseEvent::Rejected { .. } => return None,
        }
    }
}

#[test]
fn evaluate() {
    assert_eq!(eval("42"), Some(42));
    assert_eq!(eval("2 + 3 * 4"), Some(14));
    assert_eq!(eval("2 * 3 + 4"), Some(10));
    assert_eq!(eval("(2 + 3) * 4"), Some(20));
    assert_eq!(eval("1 + 2 + 3 * (4 + 5)"), Some(30));
}

#[test]
fn syntax_error() {
    assert_eq!(eval("1 +"), None);
    assert_eq!(eval("(1"), None);
    assert_eq!(eval("1 2"), None);
}

#[test]
fn declarations_are_expanded() {
    // $end NUM PLUS STAR LPAREN RPAREN $accept Expr
    assert_eq!(p::START_SYMBOL, 7);
}
