//! Lexer for minilang using logos.

use logos::Logos;
use treefix_domain::ParseError;
use treefix_types::span::Span;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"([ \t\r\n]+|//[^\n]*)")]
pub enum Tok {
    // === Keywords ===
    #[token("let")]
    Let,
    #[token("fn")]
    Fn,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,

    // === Operators ===
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("!")]
    Bang,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    // === Literals ===
    #[regex(r"[0-9]+")]
    Number,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl Tok {
    pub fn describe(self) -> &'static str {
        match self {
            Tok::Let => "`let`",
            Tok::Fn => "`fn`",
            Tok::If => "`if`",
            Tok::Else => "`else`",
            Tok::Return => "`return`",
            Tok::True => "`true`",
            Tok::False => "`false`",
            Tok::LParen => "`(`",
            Tok::RParen => "`)`",
            Tok::LBrace => "`{`",
            Tok::RBrace => "`}`",
            Tok::Comma => "`,`",
            Tok::Semi => "`;`",
            Tok::Assign => "`=`",
            Tok::EqEq => "`==`",
            Tok::NotEq => "`!=`",
            Tok::Lt => "`<`",
            Tok::LtEq => "`<=`",
            Tok::Gt => "`>`",
            Tok::GtEq => "`>=`",
            Tok::Plus => "`+`",
            Tok::Minus => "`-`",
            Tok::Star => "`*`",
            Tok::Slash => "`/`",
            Tok::Bang => "`!`",
            Tok::AndAnd => "`&&`",
            Tok::OrOr => "`||`",
            Tok::Number => "number",
            Tok::Str => "string",
            Tok::Ident => "identifier",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: Tok,
    pub span: Span,
}

/// Lex `source` completely. The first unrecognized byte is a parse error.
pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut out = Vec::new();
    let mut lexer = Tok::lexer(source);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        match result {
            Ok(kind) => out.push(Token {
                kind,
                span: Span::from_range(range.start, range.end),
            }),
            Err(()) => {
                return Err(ParseError::new(
                    format!("unexpected character `{}`", lexer.slice()),
                    range.start,
                ));
            }
        }
    }

    Ok(out)
}
