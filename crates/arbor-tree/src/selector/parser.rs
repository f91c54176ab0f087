use std::iter::Peekable;

use super::ast::{BinaryOp, Expr, FlatExpr, Literal};
use super::error::SyntaxError;
use super::token::{Token, TokenKind};
use super::{Axis, NodeTest, Selector, SelectorBuilder, Step};

/// Recursive-descent parser over the significant tokens of a selector.
pub struct Parser<'a> {
    tokens: Peekable<std::vec::IntoIter<&'a Token>>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .filter(|token| !token.is_trivia())
                .collect::<Vec<_>>()
                .into_iter()
                .peekable(),
        }
    }

    pub fn parse(&mut self) -> Result<Selector, SyntaxError> {
        let mut builder = SelectorBuilder::default();
        let mut descendant = false;

        match self.peek_kind() {
            Some(TokenKind::Slash) => {
                self.tokens.next();
                builder = builder.absolute();
                if matches!(self.peek_kind(), Some(TokenKind::Eof)) {
                    return Ok(builder.build());
                }
            }
            Some(TokenKind::DoubleSlash) => {
                self.tokens.next();
                builder = builder.absolute();
                descendant = true;
            }
            _ => {}
        }

        loop {
            for step in self.parse_step(descendant)? {
                builder = builder.step(step);
            }

            let token = self.next_token()?;
            match token.kind {
                TokenKind::Slash => descendant = false,
                TokenKind::DoubleSlash => descendant = true,
                TokenKind::Eof => return Ok(builder.build()),
                _ => return Err(SyntaxError::UnexpectedToken(token.clone())),
            }
        }
    }

    /// Parses a lone expression, as found inside a predicate.
    pub fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_expr()?;
        let token = self.next_token()?;

        if token.is_eof() {
            Ok(expr)
        } else {
            Err(SyntaxError::UnexpectedToken(token.clone()))
        }
    }

    fn next_token(&mut self) -> Result<&'a Token, SyntaxError> {
        self.tokens.next().ok_or(SyntaxError::UnexpectedEOFDetected)
    }

    fn peek_kind(&mut self) -> Option<&TokenKind> {
        self.tokens.peek().map(|token| &token.kind)
    }

    // `//` turns a default child step into a descendant step and puts a
    // `descendant-or-self::*` step in front of an explicit axis.
    fn parse_step(&mut self, descendant: bool) -> Result<Vec<Step>, SyntaxError> {
        let token = self.next_token()?;

        let (axis, explicit, test) = match &token.kind {
            TokenKind::Dot => (Axis::Self_, true, NodeTest::Any),
            TokenKind::DotDot => (Axis::Parent, true, NodeTest::Any),
            TokenKind::Name(name) if matches!(self.peek_kind(), Some(TokenKind::ColonColon)) => {
                let axis = name
                    .parse::<Axis>()
                    .map_err(|_| SyntaxError::UnknownAxis(token.clone()))?;
                self.tokens.next();
                (axis, true, self.parse_node_test()?)
            }
            TokenKind::Name(name) => (Axis::Child, false, NodeTest::Named(name.clone())),
            TokenKind::Asterisk => (Axis::Child, false, NodeTest::Any),
            TokenKind::Eof => return Err(SyntaxError::UnexpectedEOFDetected),
            _ => return Err(SyntaxError::ExpectedNodeTest(token.clone())),
        };

        let axis = if descendant && !explicit { Axis::Descendant } else { axis };
        let mut step = Step::new(axis, test);

        while matches!(self.peek_kind(), Some(TokenKind::LBracket)) {
            self.tokens.next();
            step = step.with_predicate(self.parse_expr()?);

            let token = self.next_token()?;
            if token.kind != TokenKind::RBracket {
                return Err(SyntaxError::ExpectedClosingBracket(token.clone()));
            }
        }

        if descendant && explicit {
            Ok(vec![Step::new(Axis::DescendantOrSelf, NodeTest::Any), step])
        } else {
            Ok(vec![step])
        }
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, SyntaxError> {
        let token = self.next_token()?;

        match &token.kind {
            TokenKind::Name(name) => Ok(NodeTest::Named(name.clone())),
            TokenKind::Asterisk => Ok(NodeTest::Any),
            TokenKind::Eof => Err(SyntaxError::UnexpectedEOFDetected),
            _ => Err(SyntaxError::ExpectedNodeTest(token.clone())),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut flat = FlatExpr::new(self.parse_operand()?);

        while let Some(op) = self.peek_binary_op() {
            self.tokens.next();
            flat.push(op, self.parse_operand()?);
        }

        Ok(flat.reshape())
    }

    fn peek_binary_op(&mut self) -> Option<BinaryOp> {
        match self.peek_kind()? {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Asterisk => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::NeEq => Some(BinaryOp::NeEq),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Lte => Some(BinaryOp::Lte),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Gte => Some(BinaryOp::Gte),
            TokenKind::Name(name) => match name.as_str() {
                "and" => Some(BinaryOp::And),
                "or" => Some(BinaryOp::Or),
                "div" => Some(BinaryOp::Div),
                "mod" => Some(BinaryOp::Mod),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_operand(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.next_token()?;

        match &token.kind {
            TokenKind::Minus => Ok(Expr::Negate(Box::new(self.parse_operand()?))),
            TokenKind::NumberLiteral(n) => Ok(Expr::Literal(Literal::Number(*n))),
            TokenKind::StringLiteral(s) => Ok(Expr::Literal(Literal::String(s.clone()))),
            TokenKind::At => Ok(Expr::Attribute(self.parse_node_test()?)),
            TokenKind::Name(name) if matches!(self.peek_kind(), Some(TokenKind::LParen)) => {
                self.tokens.next();
                Ok(Expr::Call(name.clone(), self.parse_args()?))
            }
            TokenKind::Name(name) => Ok(Expr::Child(NodeTest::Named(name.clone()))),
            TokenKind::Asterisk => Ok(Expr::Child(NodeTest::Any)),
            TokenKind::Dot => Ok(Expr::ContextNode),
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                let token = self.next_token()?;
                if token.kind != TokenKind::RParen {
                    return Err(SyntaxError::ExpectedClosingParen(token.clone()));
                }
                Ok(Expr::Group(Box::new(expr)))
            }
            TokenKind::Eof => Err(SyntaxError::UnexpectedEOFDetected),
            _ => Err(SyntaxError::UnexpectedToken(token.clone())),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();

        if matches!(self.peek_kind(), Some(TokenKind::RParen)) {
            self.tokens.next();
            return Ok(args);
        }

        loop {
            args.push(self.parse_expr()?);

            let token = self.next_token()?;
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::RParen => return Ok(args),
                _ => return Err(SyntaxError::ExpectedClosingParen(token.clone())),
            }
        }
    }
}
