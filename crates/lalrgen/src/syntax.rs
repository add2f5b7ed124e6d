//! Syntax support for grammar files.

pub mod ast;
pub mod lexer;

use self::lexer::{Keyword, Lexer, Spanned, Token};
use crate::grammar::{
    Assoc, CodeBlock, GrammarDef, GrammarError, NonterminalID, Precedence, RuleID, SymbolID,
};
use std::fmt;

/// A syntax error in a grammar file, with 1-based location.
#[derive(Debug, thiserror::Error)]
#[error("{}:{}: {}", line, column, msg)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub msg: String,
}

impl SyntaxError {
    fn new(loc: lexgen_util::Loc, msg: impl Into<String>) -> Self {
        Self {
            line: loc.line as usize + 1,
            column: loc.col as usize + 1,
            msg: msg.into(),
        }
    }
}

/// Parse the contents of a grammar file.
pub fn parse(source: &str) -> Result<ast::Grammar, SyntaxError> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let tokens = Lexer::new(source)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| SyntaxError::new(err.location, "invalid token"))?;
    let end = tokens.last().map_or(
        lexgen_util::Loc {
            line: 0,
            col: 0,
            byte_idx: 0,
        },
        |(_, _, end)| *end,
    );

    let mut parser = Parser {
        tokens,
        pos: 0,
        end,
    };
    let grammar = parser.grammar()?;
    tracing::trace!(stmts = grammar.stmts.len(), "parsed");
    Ok(grammar)
}

struct Parser<'input> {
    tokens: Vec<Spanned<'input>>,
    pos: usize,
    end: lexgen_util::Loc,
}

impl<'input> Parser<'input> {
    fn peek(&self) -> Option<&Spanned<'input>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned<'input>> {
        let token = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    fn error(&self, expected: impl fmt::Display) -> SyntaxError {
        match self.peek() {
            Some((loc, token, _)) => {
                SyntaxError::new(*loc, format!("expected {}, found {:?}", expected, token))
            }
            None => SyntaxError::new(self.end, format!("expected {}, found end of file", expected)),
        }
    }

    fn grammar(&mut self) -> Result<ast::Grammar, SyntaxError> {
        let mut stmts = vec![];
        while let Some((loc, token, _)) = self.peek().copied() {
            let stmt = match token {
                Token::Directive(keyword) => {
                    self.pos += 1;
                    ast::Stmt::Directive(self.directive(keyword, loc)?)
                }
                Token::DeclCode(text) => {
                    self.pos += 1;
                    ast::Stmt::Decl(code(loc, text))
                }
                Token::ImplCode(text) => {
                    self.pos += 1;
                    ast::Stmt::Impl(code(loc, text))
                }
                Token::Ident(..) => ast::Stmt::Rule(self.rule()?),
                _ => return Err(self.error("a directive, a rule or a code block")),
            };
            stmts.push(stmt);
        }
        Ok(ast::Grammar { stmts })
    }

    /// Directive arguments end at the end of the line.
    fn same_line(&self, loc: lexgen_util::Loc) -> Option<Token<'input>> {
        self.peek()
            .filter(|(start, _, _)| start.line == loc.line)
            .map(|(_, token, _)| *token)
    }

    fn name_arg(&mut self, loc: lexgen_util::Loc) -> Result<String, SyntaxError> {
        match self.same_line(loc) {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(name.to_string())
            }
            _ => Err(self.error("a name")),
        }
    }

    fn file_arg(&mut self, loc: lexgen_util::Loc) -> Result<String, SyntaxError> {
        match self.same_line(loc) {
            Some(Token::FileName(path)) => {
                self.pos += 1;
                Ok(path.to_string())
            }
            _ => Err(self.error("a file name")),
        }
    }

    fn number_arg(&mut self, loc: lexgen_util::Loc) -> Result<usize, SyntaxError> {
        match self.same_line(loc) {
            Some(Token::Number(n)) => {
                let value = n.parse().map_err(|_| self.error("a number"))?;
                self.pos += 1;
                Ok(value)
            }
            _ => Err(self.error("a number")),
        }
    }

    fn names_arg(&mut self, loc: lexgen_util::Loc) -> Result<Vec<String>, SyntaxError> {
        let mut names = vec![];
        while let Some(Token::Ident(name)) = self.same_line(loc) {
            self.pos += 1;
            names.push(name.to_string());
        }
        if names.is_empty() {
            return Err(self.error("a name"));
        }
        Ok(names)
    }

    fn directive(
        &mut self,
        keyword: Keyword,
        loc: lexgen_util::Loc,
    ) -> Result<ast::Directive, SyntaxError> {
        use ast::Directive as D;
        Ok(match keyword {
            Keyword::Parser => D::Parser(self.name_arg(loc)?),
            Keyword::Decl => D::Decl(self.file_arg(loc)?),
            Keyword::Impl => D::Impl(self.file_arg(loc)?),
            Keyword::MergedOutput => D::MergedOutput(self.file_arg(loc)?),
            Keyword::TokenPrefix => D::TokenPrefix(self.name_arg(loc)?),
            Keyword::Start => D::Start(self.name_arg(loc)?),
            Keyword::Expect => D::Expect(self.number_arg(loc)?),
            Keyword::ExpectRr => D::ExpectRr(self.number_arg(loc)?),
            Keyword::Left => D::Prec {
                assoc: Assoc::Left,
                names: self.names_arg(loc)?,
            },
            Keyword::Right => D::Prec {
                assoc: Assoc::Right,
                names: self.names_arg(loc)?,
            },
            Keyword::Nonassoc => D::Prec {
                assoc: Assoc::Nonassoc,
                names: self.names_arg(loc)?,
            },
            Keyword::Token => {
                let mut descs = vec![];
                while let Some(Token::Ident(name)) = self.same_line(loc) {
                    self.pos += 1;
                    let spell = match self.same_line(loc) {
                        Some(Token::Spell(spell)) => {
                            self.pos += 1;
                            Some(spell.to_string())
                        }
                        _ => None,
                    };
                    descs.push(ast::TokenDesc {
                        name: name.to_string(),
                        spell,
                    });
                }
                if descs.is_empty() {
                    return Err(self.error("a token name"));
                }
                D::Token(descs)
            }
        })
    }

    // Rule ::= Ident ("::=" | ":") Production ("|" Production)* ";"
    fn rule(&mut self) -> Result<ast::RuleDesc, SyntaxError> {
        let left = match self.next() {
            Some((_, Token::Ident(left), _)) => left.to_string(),
            _ => unreachable!("rule() is called on an identifier"),
        };
        match self.peek() {
            Some((_, Token::ColonColonEq | Token::Colon, _)) => self.pos += 1,
            _ => return Err(self.error("`::=' or `:'")),
        }

        let mut productions = vec![self.production()?];
        loop {
            match self.peek() {
                Some((_, Token::VertBar, _)) => {
                    self.pos += 1;
                    productions.push(self.production()?);
                }
                Some((_, Token::Semicolon, _)) => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("`|' or `;'")),
            }
        }

        Ok(ast::RuleDesc { left, productions })
    }

    fn production(&mut self) -> Result<ast::Production, SyntaxError> {
        let mut production = ast::Production::default();
        while let Some((_, Token::Ident(elem), _)) = self.peek() {
            production.elems.push(elem.to_string());
            self.pos += 1;
        }
        if let Some((_, Token::Prec, _)) = self.peek() {
            self.pos += 1;
            match self.peek() {
                Some((_, Token::Ident(name), _)) => {
                    production.prec = Some(name.to_string());
                    self.pos += 1;
                }
                _ => return Err(self.error("a symbol name after `%prec'")),
            }
        }
        Ok(production)
    }
}

fn code(loc: lexgen_util::Loc, text: &str) -> ast::Code {
    ast::Code {
        line: loc.line as usize + 1,
        text: text.to_string(),
    }
}

/// Declare the contents of a parsed grammar file.
///
/// Directives are applied first, in source order, so that every `%token`
/// is known before the rules are read. Rules and code blocks follow in
/// source order; a name that was not declared as a token is a nonterminal.
pub fn define_grammar(g: &mut GrammarDef<'_>, grammar: &ast::Grammar) -> Result<(), GrammarError> {
    let mut start = None;
    let mut level = 0;
    for stmt in &grammar.stmts {
        let ast::Stmt::Directive(directive) = stmt else { continue };
        match directive {
            ast::Directive::Parser(name) => g.directives().table_name = Some(name.clone()),
            ast::Directive::Decl(file) => g.directives().decl_file = Some(file.clone()),
            ast::Directive::Impl(file) => g.directives().impl_file = Some(file.clone()),
            ast::Directive::MergedOutput(file) => {
                g.directives().merged_output = Some(file.clone())
            }
            ast::Directive::TokenPrefix(prefix) => g.directives().token_prefix = prefix.clone(),
            ast::Directive::Expect(n) => g.directives().expected_shift_reduce = *n,
            ast::Directive::ExpectRr(n) => g.directives().expected_reduce_reduce = *n,
            ast::Directive::Start(name) => start = Some(name.as_str()),

            ast::Directive::Token(descs) => {
                for desc in descs {
                    g.terminal(&desc.name, desc.spell.as_deref())?;
                }
            }

            // Later lines bind tighter.
            ast::Directive::Prec { assoc, names } => {
                for name in names {
                    let terminal = match g.lookup(name) {
                        Some(SymbolID::T(t)) => t,
                        Some(SymbolID::N(..)) => {
                            return Err(GrammarError::InvalidName { name: name.clone() })
                        }
                        None => g.terminal(name, None)?,
                    };
                    g.precedence(terminal, Precedence::new(level, *assoc))?;
                }
                level += 1;
            }
        }
    }

    let start = match start {
        Some(name) => {
            let id = nonterminal(g, name)?;
            g.start_symbol(id)?;
            Some((id, name))
        }
        None => None,
    };

    let mut current_rule: Option<(RuleID, String)> = None;
    for stmt in &grammar.stmts {
        match stmt {
            ast::Stmt::Directive(..) => (),

            ast::Stmt::Rule(desc) => {
                let left = nonterminal(g, &desc.left)?;
                for production in &desc.productions {
                    let mut right = Vec::with_capacity(production.elems.len());
                    for elem in &production.elems {
                        right.push(match g.lookup(elem) {
                            Some(symbol) => symbol,
                            None => SymbolID::N(g.nonterminal(elem)?),
                        });
                    }
                    let prec = match &production.prec {
                        Some(name) => Some(match g.lookup(name) {
                            Some(SymbolID::T(t)) => g
                                .precedence_of(t)
                                .ok_or_else(|| GrammarError::UnknownPrecedence { name: name.clone() })?,
                            _ => return Err(GrammarError::UnknownPrecedence { name: name.clone() }),
                        }),
                        None => None,
                    };
                    let id = g.rule(left, right, prec)?;
                    current_rule = Some((id, desc.left.clone()));
                }
            }

            ast::Stmt::Decl(code) => {
                let text = expand(g, start, current_rule.as_ref(), &code.text);
                g.decl(CodeBlock {
                    line: code.line,
                    text,
                });
            }
            ast::Stmt::Impl(code) => {
                let text = expand(g, start, current_rule.as_ref(), &code.text);
                g.impl_(CodeBlock {
                    line: code.line,
                    text,
                });
            }
        }
    }

    Ok(())
}

fn nonterminal(g: &mut GrammarDef<'_>, name: &str) -> Result<NonterminalID, GrammarError> {
    match g.lookup(name) {
        Some(SymbolID::N(n)) => Ok(n),
        Some(SymbolID::T(..)) => Err(GrammarError::Other {
            msg: format!("the terminal `{}' cannot have rules", name),
        }),
        None => g.nonterminal(name),
    }
}

/// Replace the `$` variables of a code block.
///
/// The longer names are replaced first, since `$start` is a prefix of
/// `$start_id` and `$rule` a prefix of `$rule_number`.
fn expand(
    g: &mut GrammarDef<'_>,
    start: Option<(NonterminalID, &str)>,
    current_rule: Option<&(RuleID, String)>,
    text: &str,
) -> String {
    let mut code = text.to_string();

    if let Some((start, name)) = start {
        let number = g.symbol_number(SymbolID::N(start));
        code = code.replace("$start_id", &number.to_string());
        code = code.replace("$start", name);
    }

    let table_name = g.directives().table_name().to_string();
    code = code.replace("$header", &format!("{}.rs", table_name.to_lowercase()));
    code = code.replace("$table", &table_name);
    code = code.replace("$parser", &table_name);

    if let Some((rule, left)) = current_rule {
        code = code.replace("$rule_number", &rule.index().to_string());
        code = code.replace("$rule", left);
    }

    code
}
