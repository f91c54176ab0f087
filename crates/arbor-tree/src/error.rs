use miette::{Diagnostic, SourceOffset, SourceSpan};

use crate::range::Range;
use crate::selector::error::{EvalError, LexerError, SyntaxError};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InnerError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// A selector error carrying the selector text and the location of the
/// problem, ready to be rendered by `miette`.
#[derive(PartialEq, Debug, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    pub cause: InnerError,
    pub source_code: String,
    pub location: SourceSpan,
}

impl Error {
    pub fn from_error(source_code: impl Into<String>, cause: InnerError) -> Self {
        let source_code = source_code.into();

        let range = match &cause {
            InnerError::Lexer(err) => err.range().copied(),
            InnerError::Syntax(err) => err.token().filter(|token| !token.is_eof()).map(|token| token.range),
            InnerError::Eval(_) => None,
        };
        let is_eof = matches!(
            cause,
            InnerError::Lexer(LexerError::UnexpectedEOFDetected)
                | InnerError::Syntax(SyntaxError::UnexpectedEOFDetected)
        ) || matches!(&cause, InnerError::Syntax(err) if err.token().is_some_and(|token| token.is_eof()));

        let location = match range {
            Some(range) => span(&source_code, &range),
            None if is_eof => SourceSpan::new(source_code.len().saturating_sub(1).into(), 1),
            None => SourceSpan::new(SourceOffset::from(0), source_code.len().max(1)),
        };

        Self {
            cause,
            source_code,
            location,
        }
    }
}

fn span(source_code: &str, range: &Range) -> SourceSpan {
    let start = SourceOffset::from_location(source_code, range.start.line as usize, range.start.column);
    let end = SourceOffset::from_location(source_code, range.end.line as usize, range.end.column);

    SourceSpan::new(start, std::cmp::max(end.offset().saturating_sub(start.offset()), 1))
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match &self.cause {
            InnerError::Lexer(LexerError::UnexpectedCharacter(_, _)) => "LexerError::UnexpectedCharacter",
            InnerError::Lexer(LexerError::UnterminatedString(_, _)) => "LexerError::UnterminatedString",
            InnerError::Lexer(LexerError::UnterminatedComment(_)) => "LexerError::UnterminatedComment",
            InnerError::Lexer(LexerError::UnexpectedEOFDetected) => "LexerError::UnexpectedEOFDetected",
            InnerError::Syntax(SyntaxError::UnexpectedToken(_)) => "SyntaxError::UnexpectedToken",
            InnerError::Syntax(SyntaxError::UnexpectedEOFDetected) => "SyntaxError::UnexpectedEOFDetected",
            InnerError::Syntax(SyntaxError::ExpectedNodeTest(_)) => "SyntaxError::ExpectedNodeTest",
            InnerError::Syntax(SyntaxError::UnknownAxis(_)) => "SyntaxError::UnknownAxis",
            InnerError::Syntax(SyntaxError::ExpectedClosingParen(_)) => "SyntaxError::ExpectedClosingParen",
            InnerError::Syntax(SyntaxError::ExpectedClosingBracket(_)) => "SyntaxError::ExpectedClosingBracket",
            InnerError::Eval(EvalError::NotDefined(_)) => "EvalError::NotDefined",
            InnerError::Eval(EvalError::InvalidNumberOfArguments(_, _, _)) => "EvalError::InvalidNumberOfArguments",
            InnerError::Eval(EvalError::InvalidConversion { .. }) => "EvalError::InvalidConversion",
            InnerError::Eval(EvalError::ZeroDivision) => "EvalError::ZeroDivision",
            InnerError::Eval(EvalError::Runtime(_)) => "EvalError::Runtime",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match &self.cause {
            InnerError::Lexer(LexerError::UnexpectedCharacter(_, _)) => {
                Some("Check for characters that are not part of the selector syntax.".to_string())
            }
            InnerError::Lexer(LexerError::UnterminatedString(quote, _)) => {
                Some(format!("Close the string literal with a matching `{quote}`."))
            }
            InnerError::Lexer(LexerError::UnterminatedComment(_)) => {
                Some("Comments start with `(:` and must end with `:)`.".to_string())
            }
            InnerError::Syntax(SyntaxError::UnexpectedEOFDetected) | InnerError::Lexer(LexerError::UnexpectedEOFDetected) => {
                Some("Input ended unexpectedly. Check for a missing step or incomplete expression.".to_string())
            }
            InnerError::Syntax(SyntaxError::UnknownAxis(_)) => Some(
                "Known axes are ancestor, ancestor-or-self, child, descendant, descendant-or-self, first-child, \
                 following, following-sibling, last-child, parent, preceding, preceding-sibling and self."
                    .to_string(),
            ),
            InnerError::Syntax(SyntaxError::ExpectedNodeTest(_)) => {
                Some("A step needs a node name or `*`.".to_string())
            }
            InnerError::Syntax(_) => Some("Check for syntax errors or misplaced tokens.".to_string()),
            InnerError::Eval(EvalError::NotDefined(name)) => {
                Some(format!("'{name}' is not a function of this context."))
            }
            InnerError::Eval(EvalError::InvalidNumberOfArguments(_, expected, actual)) => Some(format!(
                "Invalid number of arguments: expected {expected}, got {actual}."
            )),
            InnerError::Eval(EvalError::ZeroDivision) => Some("Division by zero is not allowed.".to_string()),
            InnerError::Eval(_) => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(miette::LabeledSpan::new_with_span(
            Some(format!("{}", self.cause)),
            self.location,
        ))))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_code)
    }
}
