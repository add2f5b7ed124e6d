//! Lexer implementation.

use lexgen_util::Loc;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'input> {
    ColonColonEq,
    Colon,
    VertBar,
    Semicolon,
    Prec,
    Directive(Keyword),
    Ident(&'input str),
    Number(&'input str),
    /// The path following `%decl`, `%impl` or `%merged_output`.
    FileName(&'input str),
    /// The contents of a `"..."` literal.
    Spell(&'input str),
    /// The contents of a `/: ... :/` block.
    DeclCode(&'input str),
    /// The contents of a `/. ... ./` block.
    ImplCode(&'input str),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Keyword {
    Parser,
    Decl,
    Impl,
    MergedOutput,
    TokenPrefix,
    Token,
    Left,
    Right,
    Nonassoc,
    Expect,
    ExpectRr,
    Start,
}

pub type Spanned<'input> = (Loc, Token<'input>, Loc);

fn strip<'a>(s: &'a str, open: &str, close: &str) -> &'a str {
    let s = s.strip_prefix(open).unwrap_or(s);
    s.strip_suffix(close).unwrap_or(s)
}

lexgen::lexer! {
    pub Lexer -> Token<'input>;

    let whitespace = [' ' '\t' '\n' '\r'];
    let newline = '\r'* '\n' | '\r';
    let ident = ($$XID_Start | '_') ($$XID_Continue | '.')*;

    rule Init {
        $whitespace+,
        "--" => |lexer| {
            lexer.switch(LexerRule::LineComment)
        },
        "/:" => |lexer| {
            lexer.switch(LexerRule::DeclCode)
        },
        "/." => |lexer| {
            lexer.switch(LexerRule::ImplCode)
        },
        '"' => |lexer| {
            lexer.switch(LexerRule::Spell)
        },
        "::=" = Token::ColonColonEq,
        ":" = Token::Colon,
        "|" = Token::VertBar,
        ";" = Token::Semicolon,
        "%prec" = Token::Prec,
        "%parser" = Token::Directive(Keyword::Parser),
        "%decl" => |lexer| {
            lexer.switch_and_return(LexerRule::FileName, Token::Directive(Keyword::Decl))
        },
        "%impl" => |lexer| {
            lexer.switch_and_return(LexerRule::FileName, Token::Directive(Keyword::Impl))
        },
        "%merged_output" => |lexer| {
            lexer.switch_and_return(LexerRule::FileName, Token::Directive(Keyword::MergedOutput))
        },
        "%token_prefix" = Token::Directive(Keyword::TokenPrefix),
        "%token" = Token::Directive(Keyword::Token),
        "%left" = Token::Directive(Keyword::Left),
        "%right" = Token::Directive(Keyword::Right),
        "%nonassoc" = Token::Directive(Keyword::Nonassoc),
        "%expect" = Token::Directive(Keyword::Expect),
        "%expect-rr" = Token::Directive(Keyword::ExpectRr),
        "%start" = Token::Directive(Keyword::Start),
        ['0'-'9']+ => |lexer| {
            let token = Token::Number(lexer.match_());
            lexer.return_(token)
        },
        $ident => |lexer| {
            let token = Token::Ident(lexer.match_());
            lexer.return_(token)
        },
    }

    rule LineComment {
        $newline => |lexer| {
            lexer.reset_match();
            lexer.switch(LexerRule::Init)
        },
        _,
    }

    // Paths run up to the next whitespace, so they may contain `/`, `-` and the like.
    rule FileName {
        [' ' '\t']+,
        $newline => |lexer| {
            lexer.reset_match();
            lexer.switch(LexerRule::Init)
        },
        $ => |lexer| {
            lexer.reset_match();
            lexer.switch(LexerRule::Init)
        },
        (_ # $whitespace)+ => |lexer| {
            let token = Token::FileName(lexer.match_());
            lexer.switch_and_return(LexerRule::Init, token)
        },
    }

    rule DeclCode {
        ":/" => |lexer| {
            let token = Token::DeclCode(strip(lexer.match_(), "/:", ":/"));
            lexer.switch_and_return(LexerRule::Init, token)
        },
        _ => |lexer| lexer.continue_(),
    }

    rule ImplCode {
        "./" => |lexer| {
            let token = Token::ImplCode(strip(lexer.match_(), "/.", "./"));
            lexer.switch_and_return(LexerRule::Init, token)
        },
        _ => |lexer| lexer.continue_(),
    }

    rule Spell {
        '"' => |lexer| {
            let token = Token::Spell(strip(lexer.match_(), "\"", "\""));
            lexer.switch_and_return(LexerRule::Init, token)
        },
        _ => |lexer| lexer.continue_(),
    }
}
