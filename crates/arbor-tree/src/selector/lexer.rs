use nom::Parser;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace1, one_of},
    combinator::{map, map_res, not, opt, recognize, value},
    multi::{fold_many0, many0},
    sequence::{delimited, pair, terminated},
};
use nom_locate::position;

use super::error::LexerError;
use super::token::{Token, TokenKind};
use crate::number::Number;
use crate::range::{Range, Span};

macro_rules! define_token_parser {
    ($name:ident, $tag:expr, $kind:expr) => {
        fn $name(input: Span) -> IResult<Span, Token> {
            map(tag($tag), |span: Span| Token {
                range: span.into(),
                kind: $kind,
            })
            .parse(input)
        }
    };
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Keep whitespace and comment tokens in the output.
    pub include_trivia: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Lexer {
    options: Options,
}

impl Lexer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexerError> {
        let (rest, tokens) = match many0(token).parse(Span::new(input)) {
            Ok(result) => result,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Err(unexpected(e.input)),
            Err(nom::Err::Incomplete(_)) => return Err(LexerError::UnexpectedEOFDetected),
        };

        if !rest.fragment().is_empty() {
            return Err(unexpected(rest));
        }

        let eof = Token {
            range: rest.into(),
            kind: TokenKind::Eof,
        };

        Ok(tokens
            .into_iter()
            .filter(|token| self.options.include_trivia || !token.is_trivia())
            .chain(std::iter::once(eof))
            .collect())
    }
}

fn unexpected(span: Span) -> LexerError {
    let range = Range::at(span.into());

    if span.fragment().starts_with("(:") {
        return LexerError::UnterminatedComment(range);
    }

    match span.fragment().chars().next() {
        Some(quote @ ('\'' | '"')) => LexerError::UnterminatedString(quote, range),
        Some(c) => LexerError::UnexpectedCharacter(c, range),
        None => LexerError::UnexpectedEOFDetected,
    }
}

fn comment(input: Span) -> IResult<Span, Token> {
    let (span, start) = position(input)?;
    let (span, text) = delimited(tag("(:"), take_until(":)"), tag(":)")).parse(span)?;
    let (span, end) = position(span)?;

    Ok((
        span,
        Token {
            range: Range::new(start.into(), end.into()),
            kind: TokenKind::Comment(text.fragment().to_string()),
        },
    ))
}

fn whitespace(input: Span) -> IResult<Span, Token> {
    map(multispace1, |span: Span| Token {
        range: span.into(),
        kind: TokenKind::Whitespace(span.fragment().chars().count()),
    })
    .parse(input)
}

define_token_parser!(double_slash, "//", TokenKind::DoubleSlash);
define_token_parser!(slash, "/", TokenKind::Slash);
define_token_parser!(l_bracket, "[", TokenKind::LBracket);
define_token_parser!(r_bracket, "]", TokenKind::RBracket);
define_token_parser!(r_paren, ")", TokenKind::RParen);
define_token_parser!(comma, ",", TokenKind::Comma);
define_token_parser!(at, "@", TokenKind::At);
define_token_parser!(dot_dot, "..", TokenKind::DotDot);
define_token_parser!(dot, ".", TokenKind::Dot);
define_token_parser!(colon_colon, "::", TokenKind::ColonColon);
define_token_parser!(asterisk, "*", TokenKind::Asterisk);
define_token_parser!(plus, "+", TokenKind::Plus);
define_token_parser!(minus, "-", TokenKind::Minus);
define_token_parser!(percent, "%", TokenKind::Percent);
define_token_parser!(eq, "=", TokenKind::Eq);
define_token_parser!(ne_eq, "!=", TokenKind::NeEq);
define_token_parser!(lte, "<=", TokenKind::Lte);
define_token_parser!(lt, "<", TokenKind::Lt);
define_token_parser!(gte, ">=", TokenKind::Gte);
define_token_parser!(gt, ">", TokenKind::Gt);

// `(:` always opens a comment.
fn l_paren(input: Span) -> IResult<Span, Token> {
    map(terminated(tag("("), not(char(':'))), |span: Span| Token {
        range: span.into(),
        kind: TokenKind::LParen,
    })
    .parse(input)
}

fn punctuations(input: Span) -> IResult<Span, Token> {
    alt((
        double_slash,
        slash,
        l_bracket,
        r_bracket,
        l_paren,
        r_paren,
        comma,
        at,
        dot_dot,
        dot,
        colon_colon,
    ))
    .parse(input)
}

fn operators(input: Span) -> IResult<Span, Token> {
    alt((asterisk, plus, minus, percent, eq, ne_eq, lte, lt, gte, gt)).parse(input)
}

fn exponent(input: Span) -> IResult<Span, Span> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

// Numbers are unsigned; a leading `-` is always the minus operator.
fn number_literal(input: Span) -> IResult<Span, Token> {
    map_res(
        alt((
            recognize((digit1, opt((char('.'), digit0)), opt(exponent))),
            recognize((char('.'), digit1, opt(exponent))),
        )),
        |span: Span| {
            span.fragment().parse::<f64>().map(|n| Token {
                range: span.into(),
                kind: TokenKind::NumberLiteral(Number::new(n)),
            })
        },
    )
    .parse(input)
}

/// A literal delimited by `quote`; a doubled quote inside stands for the quote itself.
fn quoted<'a>(quote: char) -> impl Parser<Span<'a>, Output = String, Error = nom::error::Error<Span<'a>>> {
    delimited(
        char(quote),
        fold_many0(
            alt((
                map(take_while1(move |c: char| c != quote), |span: Span| {
                    span.fragment().to_string()
                }),
                value(quote.to_string(), pair(char(quote), char(quote))),
            )),
            String::new,
            |mut acc, part| {
                acc.push_str(&part);
                acc
            },
        ),
        char(quote),
    )
}

fn string_literal(input: Span) -> IResult<Span, Token> {
    let (span, start) = position(input)?;
    let (span, text) = alt((quoted('\''), quoted('"'))).parse(span)?;
    let (span, end) = position(span)?;

    Ok((
        span,
        Token {
            range: Range::new(start.into(), end.into()),
            kind: TokenKind::StringLiteral(text),
        },
    ))
}

fn name(input: Span) -> IResult<Span, Token> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_"), tag("-"), tag(".")))),
        )),
        |span: Span| Token {
            range: span.into(),
            kind: TokenKind::Name((*span.fragment()).into()),
        },
    )
    .parse(input)
}

fn token(input: Span) -> IResult<Span, Token> {
    alt((
        comment,
        whitespace,
        number_literal,
        string_literal,
        name,
        punctuations,
        operators,
    ))
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Position;
    use rstest::rstest;

    fn kinds(input: &str, options: Options) -> Result<Vec<TokenKind>, LexerError> {
        Lexer::new(options)
            .tokenize(input)
            .map(|tokens| tokens.into_iter().map(|token| token.kind).collect())
    }

    #[rstest]
    #[case::root("/", vec![TokenKind::Slash, TokenKind::Eof])]
    #[case::path("//a/b",
        vec![
            TokenKind::DoubleSlash,
            TokenKind::Name("a".into()),
            TokenKind::Slash,
            TokenKind::Name("b".into()),
            TokenKind::Eof,
        ])]
    #[case::axis("following-sibling::*",
        vec![
            TokenKind::Name("following-sibling".into()),
            TokenKind::ColonColon,
            TokenKind::Asterisk,
            TokenKind::Eof,
        ])]
    #[case::parent("../.",
        vec![TokenKind::DotDot, TokenKind::Slash, TokenKind::Dot, TokenKind::Eof])]
    #[case::predicate("a[@id != 'x']",
        vec![
            TokenKind::Name("a".into()),
            TokenKind::LBracket,
            TokenKind::At,
            TokenKind::Name("id".into()),
            TokenKind::NeEq,
            TokenKind::StringLiteral("x".to_string()),
            TokenKind::RBracket,
            TokenKind::Eof,
        ])]
    #[case::doubled_quotes(r#"'it''s' "say ""hi""" ''"#,
        vec![
            TokenKind::StringLiteral("it's".to_string()),
            TokenKind::StringLiteral("say \"hi\"".to_string()),
            TokenKind::StringLiteral(String::new()),
            TokenKind::Eof,
        ])]
    #[case::numbers("1-2.5*.5e1",
        vec![
            TokenKind::NumberLiteral(Number::new(1.0)),
            TokenKind::Minus,
            TokenKind::NumberLiteral(Number::new(2.5)),
            TokenKind::Asterisk,
            TokenKind::NumberLiteral(Number::new(5.0)),
            TokenKind::Eof,
        ])]
    #[case::comparisons("<=<>=>!==",
        vec![
            TokenKind::Lte,
            TokenKind::Lt,
            TokenKind::Gte,
            TokenKind::Gt,
            TokenKind::NeEq,
            TokenKind::Eq,
            TokenKind::Eof,
        ])]
    #[case::call("concat(\"a\", 'b')",
        vec![
            TokenKind::Name("concat".into()),
            TokenKind::LParen,
            TokenKind::StringLiteral("a".to_string()),
            TokenKind::Comma,
            TokenKind::StringLiteral("b".to_string()),
            TokenKind::RParen,
            TokenKind::Eof,
        ])]
    #[case::trivia_dropped("a (: note :) / b",
        vec![
            TokenKind::Name("a".into()),
            TokenKind::Slash,
            TokenKind::Name("b".into()),
            TokenKind::Eof,
        ])]
    fn test_tokenize(#[case] input: &str, #[case] expected: Vec<TokenKind>) {
        assert_eq!(kinds(input, Options::default()), Ok(expected));
    }

    #[test]
    fn test_tokenize_with_trivia() {
        assert_eq!(
            kinds("a (:x:)", Options { include_trivia: true }),
            Ok(vec![
                TokenKind::Name("a".into()),
                TokenKind::Whitespace(1),
                TokenKind::Comment("x".to_string()),
                TokenKind::Eof,
            ])
        );
    }

    #[test]
    fn test_token_ranges() {
        let tokens = Lexer::default().tokenize("ab[ 'c' ]").unwrap();

        assert_eq!(tokens[0].range, Range::new(Position::new(1, 1), Position::new(1, 3)));
        assert_eq!(tokens[2].range, Range::new(Position::new(1, 5), Position::new(1, 8)));
        assert_eq!(tokens[4].range.start, Position::new(1, 10));
    }

    #[rstest]
    #[case("a ? b", LexerError::UnexpectedCharacter('?', Range::at(Position::new(1, 3))))]
    #[case("a = 'b", LexerError::UnterminatedString('\'', Range::at(Position::new(1, 5))))]
    #[case("(: open", LexerError::UnterminatedComment(Range::at(Position::new(1, 1))))]
    fn test_tokenize_error(#[case] input: &str, #[case] expected: LexerError) {
        assert_eq!(Lexer::default().tokenize(input), Err(expected));
    }
}
