use std::fmt::{self, Display, Formatter};

use itertools::Itertools;

use super::decimal::{DecimalNumberContext, DecimalNumberSymbols};
use super::error::EvalError;
use crate::node::Node;
use crate::number::{NAN, Number};

#[derive(Debug, Clone, PartialEq)]
pub enum Value<N> {
    Bool(bool),
    Number(Number),
    String(String),
    Node(N),
    None,
}

impl<N> Value<N> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Node(_) => "node",
            Value::None => "none",
        }
    }
}

impl<N> From<bool> for Value<N> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<N> From<Number> for Value<N> {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl<N> From<String> for Value<N> {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<N> From<Option<N>> for Value<N> {
    fn from(value: Option<N>) -> Self {
        value.map_or(Value::None, Value::Node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Number,
    String,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::String => write!(f, "string"),
        }
    }
}

/// The node a predicate is evaluated against, with its 1-based position
/// among the step's candidates and the number of candidates.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a, N> {
    pub node: &'a N,
    pub position: usize,
    pub size: usize,
}

impl<'a, N> Frame<'a, N> {
    pub fn new(node: &'a N, position: usize, size: usize) -> Self {
        Self { node, position, size }
    }
}

/// Supplies function calls and value conversions to the evaluator.
pub trait FunctionContext<N: Node> {
    fn function(&self, name: &str, args: Vec<Value<N>>, frame: &Frame<'_, N>) -> Result<Value<N>, EvalError>;

    fn convert(&self, value: Value<N>, kind: ValueKind) -> Result<Value<N>, EvalError>;
}

/// The string value of a node: its own text, or else the text of its
/// descendants in document order.
pub fn string_value<N: Node>(node: &N) -> String {
    match node.text() {
        Some(text) => text,
        None => node.children().iter().map(string_value).collect(),
    }
}

/// The stock function library.
#[derive(Debug, Clone, Default)]
pub struct BasicContext<D = DecimalNumberSymbols> {
    decimal: D,
}

impl<D: DecimalNumberContext> BasicContext<D> {
    pub fn new(decimal: D) -> Self {
        Self { decimal }
    }

    pub fn decimal(&self) -> &D {
        &self.decimal
    }

    fn to_bool<N: Node>(&self, value: Value<N>) -> bool {
        match value {
            Value::Bool(b) => b,
            Value::Number(n) => !n.is_zero() && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Node(_) => true,
            Value::None => false,
        }
    }

    fn to_number<N: Node>(&self, value: Value<N>) -> Number {
        match value {
            Value::Bool(b) => b.into(),
            Value::Number(n) => n,
            Value::String(s) => self.decimal.parse_number(&s),
            Value::Node(node) => self.decimal.parse_number(&string_value(&node)),
            Value::None => NAN,
        }
    }

    fn to_text<N: Node>(&self, value: Value<N>) -> String {
        match value {
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => self.decimal.format_number(n),
            Value::String(s) => s,
            Value::Node(node) => string_value(&node),
            Value::None => String::new(),
        }
    }
}

fn check_arity<N>(name: &str, args: &[Value<N>], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::InvalidNumberOfArguments(
            name.to_string(),
            expected as u8,
            args.len() as u8,
        ))
    }
}

fn single<N>(name: &str, args: Vec<Value<N>>) -> Result<Value<N>, EvalError> {
    check_arity(name, &args, 1)?;
    args.into_iter()
        .next()
        .ok_or_else(|| EvalError::InvalidNumberOfArguments(name.to_string(), 1, 0))
}

fn pair<N>(name: &str, args: Vec<Value<N>>) -> Result<(Value<N>, Value<N>), EvalError> {
    check_arity(name, &args, 2)?;
    args.into_iter()
        .collect_tuple()
        .ok_or_else(|| EvalError::InvalidNumberOfArguments(name.to_string(), 2, 0))
}

impl<N: Node, D: DecimalNumberContext> FunctionContext<N> for BasicContext<D> {
    fn function(&self, name: &str, args: Vec<Value<N>>, frame: &Frame<'_, N>) -> Result<Value<N>, EvalError> {
        // Node functions without an argument apply to the node under test.
        let node_arg = |args: Vec<Value<N>>| -> Result<Option<N>, EvalError> {
            if args.is_empty() {
                return Ok(Some(frame.node.clone()));
            }

            match single(name, args)? {
                Value::Node(node) => Ok(Some(node)),
                Value::None => Ok(None),
                other => Err(EvalError::InvalidConversion {
                    value: other.kind_name().to_string(),
                    kind: ValueKind::String,
                }),
            }
        };

        let text_arg = |args: Vec<Value<N>>| -> Result<String, EvalError> {
            if args.is_empty() {
                Ok(string_value(frame.node))
            } else {
                Ok(self.to_text(single(name, args)?))
            }
        };

        let value = match name {
            "true" => {
                check_arity(name, &args, 0)?;
                Value::Bool(true)
            }
            "false" => {
                check_arity(name, &args, 0)?;
                Value::Bool(false)
            }
            "position" => {
                check_arity(name, &args, 0)?;
                Value::Number(frame.position.into())
            }
            "last" => {
                check_arity(name, &args, 0)?;
                Value::Number(frame.size.into())
            }
            "not" => Value::Bool(!self.to_bool(single(name, args)?)),
            "boolean" => Value::Bool(self.to_bool(single(name, args)?)),
            "number" => Value::Number(self.to_number(single(name, args)?)),
            "floor" => Value::Number(self.to_number(single(name, args)?).floor()),
            "ceiling" => Value::Number(self.to_number(single(name, args)?).ceil()),
            "round" => Value::Number(self.to_number(single(name, args)?).round()),
            "abs" => Value::Number(self.to_number(single(name, args)?).abs()),
            "string" => Value::String(text_arg(args)?),
            "concat" => Value::String(args.into_iter().map(|v| self.to_text(v)).collect()),
            "contains" | "starts-with" | "ends-with" => {
                let (haystack, needle) = pair(name, args)?;
                let (haystack, needle) = (self.to_text(haystack), self.to_text(needle));
                Value::Bool(match name {
                    "contains" => haystack.contains(&needle),
                    "starts-with" => haystack.starts_with(&needle),
                    _ => haystack.ends_with(&needle),
                })
            }
            "string-length" => Value::Number(text_arg(args)?.chars().count().into()),
            "normalize-space" => Value::String(text_arg(args)?.split_whitespace().join(" ")),
            "upper-case" => Value::String(text_arg(args)?.to_uppercase()),
            "lower-case" => Value::String(text_arg(args)?.to_lowercase()),
            "name" => Value::String(node_arg(args)?.map(|n| n.name().to_string()).unwrap_or_default()),
            "text" => node_arg(args)?.and_then(|n| n.text()).map_or(Value::None, Value::String),
            "index" => node_arg(args)?.map_or(Value::None, |n| Value::Number(n.index().into())),
            "count" => Value::Number(node_arg(args)?.map_or(0, |n| n.child_count()).into()),
            _ => return Err(EvalError::NotDefined(name.to_string())),
        };

        Ok(value)
    }

    fn convert(&self, value: Value<N>, kind: ValueKind) -> Result<Value<N>, EvalError> {
        Ok(match kind {
            ValueKind::Bool => Value::Bool(self.to_bool(value)),
            ValueKind::Number => Value::Number(self.to_number(value)),
            ValueKind::String => Value::String(self.to_text(value)),
        })
    }
}
