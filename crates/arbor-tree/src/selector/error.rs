use thiserror::Error;

use super::context::ValueKind;
use super::token::Token;
use crate::range::Range;

type FunctionName = String;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("Unexpected character `{0}`")]
    UnexpectedCharacter(char, Range),
    #[error("Unterminated string, missing closing `{0}`")]
    UnterminatedString(char, Range),
    #[error("Unterminated comment, missing closing `:)`")]
    UnterminatedComment(Range),
    #[error("Unexpected EOF detected")]
    UnexpectedEOFDetected,
}

impl LexerError {
    #[cold]
    pub fn range(&self) -> Option<&Range> {
        match self {
            LexerError::UnexpectedCharacter(_, range) => Some(range),
            LexerError::UnterminatedString(_, range) => Some(range),
            LexerError::UnterminatedComment(range) => Some(range),
            LexerError::UnexpectedEOFDetected => None,
        }
    }
}

fn describe(token: &Token) -> String {
    if token.is_eof() {
        "EOF".to_string()
    } else {
        token.to_string()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("Unexpected token `{}`", describe(.0))]
    UnexpectedToken(Token),
    #[error("Unexpected EOF detected")]
    UnexpectedEOFDetected,
    #[error("Expected a node name or `*` but got `{}`", describe(.0))]
    ExpectedNodeTest(Token),
    #[error("Unknown axis `{}`", describe(.0))]
    UnknownAxis(Token),
    #[error("Expected a closing parenthesis `)` but got `{}` delimiter", describe(.0))]
    ExpectedClosingParen(Token),
    #[error("Expected a closing bracket `]` but got `{}` delimiter", describe(.0))]
    ExpectedClosingBracket(Token),
}

impl SyntaxError {
    #[cold]
    pub fn token(&self) -> Option<&Token> {
        match self {
            SyntaxError::UnexpectedToken(token) => Some(token),
            SyntaxError::UnexpectedEOFDetected => None,
            SyntaxError::ExpectedNodeTest(token) => Some(token),
            SyntaxError::UnknownAxis(token) => Some(token),
            SyntaxError::ExpectedClosingParen(token) => Some(token),
            SyntaxError::ExpectedClosingBracket(token) => Some(token),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("\"{0}\" is not defined")]
    NotDefined(FunctionName),
    #[error("Invalid number of arguments in \"{0}\", expected {1}, got {2}")]
    InvalidNumberOfArguments(FunctionName, u8, u8),
    #[error("Cannot convert {value} to {kind}")]
    InvalidConversion { value: String, kind: ValueKind },
    #[error("Divided by 0")]
    ZeroDivision,
    /// Raised by custom [`FunctionContext`](super::context::FunctionContext) implementations.
    #[error("Runtime error: {0}")]
    Runtime(String),
}
