use crate::grammar::Assoc;

#[derive(Debug)]
pub struct Grammar {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Directive(Directive),
    Rule(RuleDesc),
    /// `/: ... :/`
    Decl(Code),
    /// `/. ... ./`
    Impl(Code),
}

#[derive(Debug, PartialEq)]
pub enum Directive {
    Parser(String),
    Decl(String),
    Impl(String),
    MergedOutput(String),
    TokenPrefix(String),
    Token(Vec<TokenDesc>),
    Prec { assoc: Assoc, names: Vec<String> },
    Expect(usize),
    ExpectRr(usize),
    Start(String),
}

#[derive(Debug, PartialEq)]
pub struct TokenDesc {
    pub name: String,
    pub spell: Option<String>,
}

#[derive(Debug)]
pub struct RuleDesc {
    pub left: String,
    pub productions: Vec<Production>,
}

#[derive(Debug, Default, PartialEq)]
pub struct Production {
    pub elems: Vec<String>,
    /// `%prec NAME`
    pub prec: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct Code {
    /// 1-based line where the text starts.
    pub line: usize,
    pub text: String,
}
