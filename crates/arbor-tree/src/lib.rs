//! `arbor-tree` addresses, patches and queries immutable trees.
//!
//! Everything works over the [`Node`] trait. [`Element`] is the bundled
//! implementation and, with the default `json` feature, converts to and
//! from JSON documents.
//!
//! ## Examples
//!
//! ```rust
//! use arbor_tree::{Element, Node, Patch, Pointer};
//!
//! let tree = Element::new("root").with_children([Element::new("a"), Element::new("b")]);
//!
//! // Pointers locate nodes and insertion points.
//! let pointer: Pointer = "/1".parse().unwrap();
//! assert_eq!(pointer.traverse(&tree).unwrap().name(), "b");
//!
//! // Patches chain operations and apply them in order.
//! let patch = Patch::empty()
//!     .add("/-".parse().unwrap(), Element::new("c"))
//!     .remove("/0".parse().unwrap());
//! let patched = patch.apply(&tree).unwrap();
//! assert_eq!(patched.children().iter().map(|n| n.name().to_string()).collect::<Vec<_>>(), vec!["b", "c"]);
//!
//! // Selectors query with axes and predicates.
//! let matches = arbor_tree::select("*[name() != 'a']", &patched).unwrap();
//! assert_eq!(matches.len(), 2);
//! ```
pub mod element;
mod error;
pub mod node;
pub mod number;
pub mod patch;
pub mod pointer;
pub mod range;
pub mod selector;

use selector::context::{BasicContext, Frame};
use selector::eval::Evaluator;
use selector::lexer::Lexer;
use selector::parser::Parser;

pub use element::Element;
pub use error::{Error, InnerError};
pub use node::{Attributes, Node, NodeError};
pub use number::Number;
#[cfg(feature = "json")]
pub use patch::error::PatchDocumentError;
pub use patch::{Operation, Patch, PatchError, PatchFailure};
pub use pointer::{Pointer, PointerError, Segment, Target};
pub use range::{Position, Range};
pub use selector::context::{FunctionContext, Value, ValueKind};
pub use selector::decimal::{DecimalNumberContext, DecimalNumberSymbols};
pub use selector::lexer::Options as LexerOptions;
pub use selector::{Axis, NodeTest, Selector, SelectorBuilder, Step};

/// Parses a selector such as `/catalog/book[@lang = 'en']`.
pub fn parse_selector(code: &str) -> Result<Selector, Error> {
    let tokens = Lexer::default()
        .tokenize(code)
        .map_err(|e| Error::from_error(code, InnerError::Lexer(e)))?;

    Parser::new(&tokens)
        .parse()
        .map_err(|e| Error::from_error(code, InnerError::Syntax(e)))
}

/// Parses and runs a selector from `node` with the stock functions.
pub fn select<N: Node>(code: &str, node: &N) -> Result<Vec<N>, Error> {
    let context: BasicContext = BasicContext::default();

    parse_selector(code)?
        .select(node, &context)
        .map_err(|e| Error::from_error(code, InnerError::Eval(e)))
}

/// Evaluates a lone predicate expression with `node` as the context node.
pub fn evaluate<N: Node>(code: &str, node: &N) -> Result<Value<N>, Error> {
    let tokens = Lexer::default()
        .tokenize(code)
        .map_err(|e| Error::from_error(code, InnerError::Lexer(e)))?;
    let expr = Parser::new(&tokens)
        .parse_expression()
        .map_err(|e| Error::from_error(code, InnerError::Syntax(e)))?;
    let context: BasicContext = BasicContext::default();

    Evaluator::new(&context)
        .evaluate(&expr, &Frame::new(node, 1, 1))
        .map_err(|e| Error::from_error(code, InnerError::Eval(e)))
}
