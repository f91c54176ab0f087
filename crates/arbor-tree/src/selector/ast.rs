use std::fmt::{self, Display, Formatter};
use std::iter::Peekable;

use itertools::Itertools;
use smol_str::SmolStr;

use super::NodeTest;
use crate::number::Number;

pub type FunctionName = SmolStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(Number),
    String(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) if s.contains('\'') && !s.contains('"') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NeEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    pub const fn priority(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::NeEq | BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 5,
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "=",
            BinaryOp::NeEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    pub const fn is_comparison(&self) -> bool {
        self.priority() == 3
    }

    pub const fn is_arithmetic(&self) -> bool {
        self.priority() >= 4
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// `.`, the node under test.
    ContextNode,
    /// A bare name or `*`: the first matching child of the node under test.
    Child(NodeTest),
    /// `@name` or `@*`.
    Attribute(NodeTest),
    Call(FunctionName, Vec<Expr>),
    Negate(Box<Expr>),
    Group(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn number(n: impl Into<Number>) -> Self {
        Expr::Literal(Literal::Number(n.into()))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Expr::Call(SmolStr::new(name), args)
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Direct sub-expressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::ContextNode | Expr::Child(_) | Expr::Attribute(_) => Vec::new(),
            Expr::Call(_, args) => args.iter().collect(),
            Expr::Negate(expr) | Expr::Group(expr) => vec![expr.as_ref()],
            Expr::Binary(_, lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::ContextNode => write!(f, "."),
            Expr::Child(test) => write!(f, "{}", test),
            Expr::Attribute(test) => write!(f, "@{}", test),
            Expr::Call(name, args) => write!(f, "{}({})", name, args.iter().join(", ")),
            Expr::Negate(expr) if matches!(expr.as_ref(), Expr::Binary(..)) => write!(f, "-({})", expr),
            Expr::Negate(expr) => write!(f, "-{}", expr),
            Expr::Group(expr) => write!(f, "({})", expr),
            Expr::Binary(op, lhs, rhs) => {
                write_operand(f, lhs, |priority| priority < op.priority())?;
                write!(f, " {} ", op)?;
                write_operand(f, rhs, |priority| priority <= op.priority())
            }
        }
    }
}

/// Writes a binary operand, parenthesized when its own operator would
/// otherwise regroup it.
fn write_operand(f: &mut Formatter<'_>, expr: &Expr, needs_parens: impl Fn(u8) -> bool) -> fmt::Result {
    match expr {
        Expr::Binary(op, ..) if needs_parens(op.priority()) => write!(f, "({})", expr),
        _ => write!(f, "{}", expr),
    }
}

/// An expression as parsed: operands and operators in source order, before
/// priorities are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatExpr {
    pub first: Expr,
    pub rest: Vec<(BinaryOp, Expr)>,
}

impl FlatExpr {
    pub fn new(first: Expr) -> Self {
        Self { first, rest: Vec::new() }
    }

    pub fn push(&mut self, op: BinaryOp, operand: Expr) {
        self.rest.push((op, operand));
    }

    /// Nests the operands by operator priority. Operators of equal priority
    /// associate to the left.
    pub fn reshape(self) -> Expr {
        let mut rest = self.rest.into_iter().peekable();
        climb(self.first, 0, &mut rest)
    }
}

fn climb<I>(mut lhs: Expr, min_priority: u8, rest: &mut Peekable<I>) -> Expr
where
    I: Iterator<Item = (BinaryOp, Expr)>,
{
    while let Some(priority) = rest.peek().map(|(op, _)| op.priority()) {
        if priority < min_priority {
            break;
        }

        let Some((op, mut rhs)) = rest.next() else {
            break;
        };

        while let Some(next) = rest.peek().map(|(op, _)| op.priority()) {
            if next <= priority {
                break;
            }
            rhs = climb(rhs, next, rest);
        }

        lhs = Expr::binary(op, lhs, rhs);
    }

    lhs
}
