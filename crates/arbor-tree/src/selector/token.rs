use std::fmt::{self, Display, Formatter};

use smol_str::SmolStr;

use crate::number::Number;
use crate::range::Range;

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone)]
pub struct Token {
    pub range: Range,
    pub kind: TokenKind,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Whitespace and comments.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace(_) | TokenKind::Comment(_))
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone)]
pub enum TokenKind {
    Asterisk,
    At,
    ColonColon,
    Comma,
    Comment(String),
    Dot,
    DotDot,
    DoubleSlash,
    Eof,
    Eq,
    Gt,
    Gte,
    LBracket,
    LParen,
    Lt,
    Lte,
    Minus,
    Name(SmolStr),
    NeEq,
    NumberLiteral(Number),
    Percent,
    Plus,
    RBracket,
    RParen,
    Slash,
    StringLiteral(String),
    Whitespace(usize),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match &self {
            TokenKind::Asterisk => write!(f, "*"),
            TokenKind::At => write!(f, "@"),
            TokenKind::ColonColon => write!(f, "::"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Comment(comment) => write!(f, "(:{}:)", comment),
            TokenKind::Dot => write!(f, "."),
            TokenKind::DotDot => write!(f, ".."),
            TokenKind::DoubleSlash => write!(f, "//"),
            TokenKind::Eof => write!(f, ""),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Gte => write!(f, ">="),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::LParen => write!(f, "("),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Lte => write!(f, "<="),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Name(name) => write!(f, "{}", name),
            TokenKind::NeEq => write!(f, "!="),
            TokenKind::NumberLiteral(n) => write!(f, "{}", n),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::StringLiteral(s) => write!(f, "'{}'", s.replace('\'', "''")),
            TokenKind::Whitespace(n) => write!(f, "{}", " ".repeat(*n)),
        }
    }
}
