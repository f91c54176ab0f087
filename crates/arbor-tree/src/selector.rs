//! XPath-like selectors over [`Node`] trees.
//!
//! A selector is a chain of steps such as `/catalog/book[@lang = 'en'][2]`.
//! Each step walks an [`Axis`] from every current node, keeps the nodes
//! passing its [`NodeTest`] and then filters them through its predicates.
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
use smol_str::SmolStr;

use crate::node::Node;

pub mod ast;
pub mod context;
pub mod decimal;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;

use ast::Expr;
use context::FunctionContext;
use error::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Child,
    Descendant,
    DescendantOrSelf,
    FirstChild,
    Following,
    FollowingSibling,
    LastChild,
    Parent,
    Preceding,
    PrecedingSibling,
    Self_,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAxis(pub String);

impl Axis {
    pub const fn name(&self) -> &'static str {
        match self {
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::FirstChild => "first-child",
            Axis::Following => "following",
            Axis::FollowingSibling => "following-sibling",
            Axis::LastChild => "last-child",
            Axis::Parent => "parent",
            Axis::Preceding => "preceding",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Self_ => "self",
        }
    }

    /// Nodes reachable from `node` along this axis. Reverse axes list the
    /// nearest node first.
    pub fn nodes<N: Node>(&self, node: &N) -> Vec<N> {
        match self {
            Axis::Ancestor => node.ancestors(),
            Axis::AncestorOrSelf => std::iter::once(node.clone()).chain(node.ancestors()).collect(),
            Axis::Child => node.children(),
            Axis::Descendant => node.children().iter().flat_map(descendants_or_self).collect(),
            Axis::DescendantOrSelf => descendants_or_self(node),
            Axis::FirstChild => node.first_child().into_iter().collect(),
            Axis::LastChild => node.last_child().into_iter().collect(),
            Axis::Parent => node.parent().into_iter().collect(),
            Axis::Self_ => vec![node.clone()],
            Axis::FollowingSibling => match node.parent() {
                Some(parent) => parent.children().into_iter().skip(node.index() + 1).collect(),
                None => Vec::new(),
            },
            Axis::PrecedingSibling => match node.parent() {
                Some(parent) => parent.children().into_iter().take(node.index()).rev().collect(),
                None => Vec::new(),
            },
            Axis::Following => std::iter::once(node.clone())
                .chain(node.ancestors())
                .flat_map(|n| Axis::FollowingSibling.nodes(&n))
                .flat_map(|n| descendants_or_self(&n))
                .collect(),
            Axis::Preceding => {
                let ancestors = node.ancestors().iter().map(Node::pointer).collect::<Vec<_>>();
                let target = node.pointer();
                let mut preceding = descendants_or_self(&node.root())
                    .into_iter()
                    .take_while(|n| n.pointer() != target)
                    .filter(|n| !ancestors.contains(&n.pointer()))
                    .collect::<Vec<_>>();
                preceding.reverse();
                preceding
            }
        }
    }
}

/// `node` followed by all of its descendants in document order.
fn descendants_or_self<N: Node>(node: &N) -> Vec<N> {
    let mut nodes = vec![node.clone()];
    for child in node.children() {
        nodes.extend(descendants_or_self(&child));
    }
    nodes
}

impl FromStr for Axis {
    type Err = UnknownAxis;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ancestor" => Ok(Axis::Ancestor),
            "ancestor-or-self" => Ok(Axis::AncestorOrSelf),
            "child" => Ok(Axis::Child),
            "descendant" => Ok(Axis::Descendant),
            "descendant-or-self" => Ok(Axis::DescendantOrSelf),
            "first-child" => Ok(Axis::FirstChild),
            "following" => Ok(Axis::Following),
            "following-sibling" => Ok(Axis::FollowingSibling),
            "last-child" => Ok(Axis::LastChild),
            "parent" => Ok(Axis::Parent),
            "preceding" => Ok(Axis::Preceding),
            "preceding-sibling" => Ok(Axis::PrecedingSibling),
            "self" => Ok(Axis::Self_),
            _ => Err(UnknownAxis(s.to_string())),
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeTest {
    Any,
    Named(SmolStr),
}

impl NodeTest {
    pub fn named(name: &str) -> Self {
        NodeTest::Named(SmolStr::new(name))
    }

    pub fn matches<N: Node>(&self, node: &N) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Named(name) => node.name() == name.as_str(),
        }
    }
}

impl Display for NodeTest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::Any => write!(f, "*"),
            NodeTest::Named(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

impl Step {
    pub fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    pub fn with_predicate(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn test(&self) -> &NodeTest {
        &self.test
    }

    pub fn predicates(&self) -> &[Expr] {
        &self.predicates
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (self.axis, &self.test) {
            (Axis::Self_, NodeTest::Any) if self.predicates.is_empty() => write!(f, "."),
            (Axis::Parent, NodeTest::Any) if self.predicates.is_empty() => write!(f, ".."),
            (Axis::Child, test) => write!(f, "{}", test),
            (axis, test) => write!(f, "{}::{}", axis, test),
        }?;

        for predicate in &self.predicates {
            write!(f, "[{}]", predicate)?;
        }
        Ok(())
    }
}

/// A parsed selector. Build one with [`Selector::parse`] or
/// [`SelectorBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    absolute: bool,
    steps: Vec<Step>,
}

impl Selector {
    pub fn parse(code: &str) -> Result<Self, crate::Error> {
        crate::parse_selector(code)
    }

    pub fn builder() -> SelectorBuilder {
        SelectorBuilder::default()
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Evaluates the selector from `node`.
    pub fn select<N, C>(&self, node: &N, context: &C) -> Result<Vec<N>, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        eval::Evaluator::new(context).select(self, node)
    }
}

impl FromStr for Selector {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.absolute {
            write!(f, "/")?;
        }
        write!(f, "{}", self.steps.iter().join("/"))
    }
}

macro_rules! define_axis_step {
    ($name:ident, $axis:expr) => {
        pub fn $name(self, test: NodeTest) -> Self {
            self.step(Step::new($axis, test))
        }
    };
}

/// Assembles a [`Selector`] step by step.
#[derive(Debug, Clone, Default)]
pub struct SelectorBuilder {
    absolute: bool,
    steps: Vec<Step>,
}

impl SelectorBuilder {
    /// Starts evaluation at the root of the tree.
    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Adds a predicate to the most recent step; ignored before any step.
    pub fn predicate(mut self, predicate: Expr) -> Self {
        if let Some(step) = self.steps.pop() {
            self.steps.push(step.with_predicate(predicate));
        }
        self
    }

    define_axis_step!(ancestor, Axis::Ancestor);
    define_axis_step!(ancestor_or_self, Axis::AncestorOrSelf);
    define_axis_step!(child, Axis::Child);
    define_axis_step!(descendant, Axis::Descendant);
    define_axis_step!(descendant_or_self, Axis::DescendantOrSelf);
    define_axis_step!(first_child, Axis::FirstChild);
    define_axis_step!(following, Axis::Following);
    define_axis_step!(following_sibling, Axis::FollowingSibling);
    define_axis_step!(last_child, Axis::LastChild);
    define_axis_step!(parent, Axis::Parent);
    define_axis_step!(preceding, Axis::Preceding);
    define_axis_step!(preceding_sibling, Axis::PrecedingSibling);
    define_axis_step!(self_, Axis::Self_);

    pub fn build(self) -> Selector {
        Selector {
            absolute: self.absolute,
            steps: self.steps,
        }
    }
}
