use std::cmp::Ordering;

use rustc_hash::FxHashSet;
use tracing::debug;

use super::ast::{BinaryOp, Expr, Literal};
use super::context::{Frame, FunctionContext, Value, ValueKind};
use super::error::EvalError;
use super::{NodeTest, Selector, Step};
use crate::node::Node;
use crate::number::Number;

/// Walks a tree for a [`Selector`], reducing predicates through a
/// [`FunctionContext`].
#[derive(Debug)]
pub struct Evaluator<'a, C> {
    context: &'a C,
}

impl<'a, C> Evaluator<'a, C> {
    pub fn new(context: &'a C) -> Self {
        Self { context }
    }

    pub fn select<N>(&self, selector: &Selector, node: &N) -> Result<Vec<N>, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        let start = if selector.is_absolute() { node.root() } else { node.clone() };
        let mut current = vec![start];

        for step in selector.steps() {
            current = self.apply_step(step, &current)?;
            debug!(step = %step, matches = current.len(), "Applied selector step");

            if current.is_empty() {
                break;
            }
        }

        Ok(current)
    }

    /// Runs `step` from every node in `nodes`. Matches keep the order they
    /// are first reached in and appear once.
    fn apply_step<N>(&self, step: &Step, nodes: &[N]) -> Result<Vec<N>, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        let mut seen = FxHashSet::default();
        let mut matches = Vec::new();

        for node in nodes {
            let mut candidates = step
                .axis()
                .nodes(node)
                .into_iter()
                .filter(|candidate| step.test().matches(candidate))
                .collect::<Vec<_>>();

            for predicate in step.predicates() {
                candidates = self.filter(predicate, candidates)?;
            }

            for candidate in candidates {
                if seen.insert(candidate.pointer()) {
                    matches.push(candidate);
                }
            }
        }

        Ok(matches)
    }

    fn filter<N>(&self, predicate: &Expr, candidates: Vec<N>) -> Result<Vec<N>, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        let size = candidates.len();
        let mut kept = Vec::with_capacity(size);

        for (i, candidate) in candidates.into_iter().enumerate() {
            let keep = self.matches(predicate, &Frame::new(&candidate, i + 1, size))?;
            if keep {
                kept.push(candidate);
            }
        }

        Ok(kept)
    }

    /// Whether `predicate` holds for the frame. A number selects the node
    /// at that position.
    pub fn matches<N>(&self, predicate: &Expr, frame: &Frame<'_, N>) -> Result<bool, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        match self.evaluate(predicate, frame)? {
            Value::Number(n) => Ok(n.as_position() == Some(frame.position)),
            value => self.to_bool(value),
        }
    }

    pub fn evaluate<N>(&self, expr: &Expr, frame: &Frame<'_, N>) -> Result<Value<N>, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        match expr {
            Expr::Literal(Literal::Number(n)) => Ok(Value::Number(*n)),
            Expr::Literal(Literal::String(s)) => Ok(Value::String(s.clone())),
            Expr::ContextNode => Ok(Value::Node(frame.node.clone())),
            Expr::Child(test) => Ok(frame
                .node
                .children()
                .into_iter()
                .find(|child| test.matches(child))
                .into()),
            Expr::Attribute(NodeTest::Any) => Ok(Value::Bool(!frame.node.attributes().is_empty())),
            Expr::Attribute(NodeTest::Named(name)) => Ok(frame
                .node
                .attributes()
                .remove(name.as_str())
                .map_or(Value::None, Value::String)),
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, frame))
                    .collect::<Result<Vec<_>, _>>()?;
                self.context.function(name, args, frame)
            }
            Expr::Negate(expr) => {
                let value = self.evaluate(expr, frame)?;
                Ok(Value::Number(-self.to_number(value)?))
            }
            Expr::Group(expr) => self.evaluate(expr, frame),
            Expr::Binary(op, lhs, rhs) => self.eval_binary(*op, lhs, rhs, frame),
        }
    }

    fn eval_binary<N>(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr, frame: &Frame<'_, N>) -> Result<Value<N>, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        match op {
            BinaryOp::And => {
                let lhs = self.evaluate(lhs, frame)?;
                if !self.to_bool(lhs)? {
                    return Ok(Value::Bool(false));
                }
                let rhs = self.evaluate(rhs, frame)?;
                Ok(Value::Bool(self.to_bool(rhs)?))
            }
            BinaryOp::Or => {
                let lhs = self.evaluate(lhs, frame)?;
                if self.to_bool(lhs)? {
                    return Ok(Value::Bool(true));
                }
                let rhs = self.evaluate(rhs, frame)?;
                Ok(Value::Bool(self.to_bool(rhs)?))
            }
            BinaryOp::Eq | BinaryOp::NeEq | BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                let lhs = self.evaluate(lhs, frame)?;
                let rhs = self.evaluate(rhs, frame)?;
                Ok(Value::Bool(self.compare(op, lhs, rhs)?))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let lhs = self.evaluate(lhs, frame)?;
                let lhs = self.to_number(lhs)?;
                let rhs = self.evaluate(rhs, frame)?;
                let rhs = self.to_number(rhs)?;

                let result = match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    _ if rhs.is_zero() => return Err(EvalError::ZeroDivision),
                    BinaryOp::Div => lhs / rhs,
                    _ => lhs % rhs,
                };
                Ok(Value::Number(result))
            }
        }
    }

    // Numbers win over booleans, booleans over strings. Ordering operators
    // always compare numbers. A missing value compares false.
    fn compare<N>(&self, op: BinaryOp, lhs: Value<N>, rhs: Value<N>) -> Result<bool, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        if matches!(lhs, Value::None) || matches!(rhs, Value::None) {
            return Ok(false);
        }

        let is_number = |value: &Value<N>| matches!(value, Value::Number(_));
        let is_bool = |value: &Value<N>| matches!(value, Value::Bool(_));

        let ordering = if is_number(&lhs) || is_number(&rhs) || !matches!(op, BinaryOp::Eq | BinaryOp::NeEq) {
            let lhs = self.to_number(lhs)?.value();
            let rhs = self.to_number(rhs)?.value();
            lhs.partial_cmp(&rhs)
        } else if is_bool(&lhs) || is_bool(&rhs) {
            Some(self.to_bool(lhs)?.cmp(&self.to_bool(rhs)?))
        } else {
            Some(self.to_text(lhs)?.cmp(&self.to_text(rhs)?))
        };

        Ok(holds(op, ordering))
    }

    fn to_bool<N>(&self, value: Value<N>) -> Result<bool, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        match self.context.convert(value, ValueKind::Bool)? {
            Value::Bool(b) => Ok(b),
            other => Err(conversion_error(&other, ValueKind::Bool)),
        }
    }

    fn to_number<N>(&self, value: Value<N>) -> Result<Number, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        match self.context.convert(value, ValueKind::Number)? {
            Value::Number(n) => Ok(n),
            other => Err(conversion_error(&other, ValueKind::Number)),
        }
    }

    fn to_text<N>(&self, value: Value<N>) -> Result<String, EvalError>
    where
        N: Node,
        C: FunctionContext<N>,
    {
        match self.context.convert(value, ValueKind::String)? {
            Value::String(s) => Ok(s),
            other => Err(conversion_error(&other, ValueKind::String)),
        }
    }
}

fn conversion_error<N>(value: &Value<N>, kind: ValueKind) -> EvalError {
    EvalError::InvalidConversion {
        value: value.kind_name().to_string(),
        kind,
    }
}

fn holds(op: BinaryOp, ordering: Option<Ordering>) -> bool {
    matches!(
        (op, ordering),
        (BinaryOp::Eq, Some(Ordering::Equal))
            | (BinaryOp::NeEq, None | Some(Ordering::Less | Ordering::Greater))
            | (BinaryOp::Lt, Some(Ordering::Less))
            | (BinaryOp::Lte, Some(Ordering::Less | Ordering::Equal))
            | (BinaryOp::Gt, Some(Ordering::Greater))
            | (BinaryOp::Gte, Some(Ordering::Greater | Ordering::Equal))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::selector::context::{BasicContext, string_value};
    use crate::selector::lexer::Lexer;
    use crate::selector::parser::Parser;
    use rstest::{fixture, rstest};

    fn book(lang: &str, title: &str, price: &str) -> Element {
        Element::new("book")
            .with_attribute("lang", lang)
            .with_children([Element::leaf("title", title), Element::leaf("price", price)])
    }

    #[fixture]
    fn catalog() -> Element {
        Element::new("catalog").with_children([
            book("en", "Rust", "30"),
            book("fr", "OCaml", "25"),
            book("en", "Go", "10").with_attribute("hidden", "yes"),
            Element::new("magazine").with_children([Element::leaf("title", "Weekly")]),
        ])
    }

    fn select(code: &str, node: &Element) -> Result<Vec<Element>, EvalError> {
        let tokens = Lexer::default().tokenize(code).unwrap();
        let selector = Parser::new(&tokens).parse().unwrap();
        let context: BasicContext = BasicContext::default();
        Evaluator::new(&context).select(&selector, node)
    }

    fn evaluate(code: &str, node: &Element) -> Result<Value<Element>, EvalError> {
        let tokens = Lexer::default().tokenize(code).unwrap();
        let expr = Parser::new(&tokens).parse_expression().unwrap();
        let context: BasicContext = BasicContext::default();
        Evaluator::new(&context).evaluate(&expr, &Frame::new(node, 1, 1))
    }

    fn texts(nodes: &[Element]) -> Vec<String> {
        nodes.iter().map(string_value).collect()
    }

    #[rstest]
    #[case::children("book", vec!["Rust30", "OCaml25", "Go10"])]
    #[case::absolute("/book[@lang = 'en']", vec!["Rust30", "Go10"])]
    #[case::position("book[2]", vec!["OCaml25"])]
    #[case::last("book[last()]", vec!["Go10"])]
    #[case::child_value("book[price > 20]", vec!["Rust30", "OCaml25"])]
    #[case::chained_predicates("book[not(@hidden)][position() = 2]", vec!["OCaml25"])]
    #[case::wildcard("*[title = 'Weekly']", vec!["Weekly"])]
    #[case::descendants("//title", vec!["Rust", "OCaml", "Go", "Weekly"])]
    #[case::parent("book/title[. = 'Go']/..", vec!["Go10"])]
    #[case::deduplicated("book/following-sibling::*", vec!["OCaml25", "Go10", "Weekly"])]
    #[case::arithmetic("book[price * 2 >= 50 and price mod 2 = 0]", vec!["Rust30"])]
    #[case::functions("//title[starts-with(., 'O') or contains(text(), 'ee')]", vec!["OCaml", "Weekly"])]
    #[case::any_attribute("*[@*]", vec!["Rust30", "OCaml25", "Go10"])]
    #[case::following("book[1]/following::title", vec!["OCaml", "Go", "Weekly"])]
    #[case::nearest_first("book[3]/preceding-sibling::book[1]", vec!["OCaml25"])]
    #[case::no_match("book[@lang = 'de']/title", vec![])]
    fn test_select(catalog: Element, #[case] code: &str, #[case] expected: Vec<&str>) {
        assert_eq!(texts(&select(code, &catalog).unwrap()), expected);
    }

    #[rstest]
    fn test_absolute_selector_starts_at_root(catalog: Element) {
        let title = catalog.child(1).unwrap().child(0).unwrap();

        assert_eq!(texts(&select("/magazine/title", &title).unwrap()), vec!["Weekly"]);
        assert_eq!(select("magazine", &title).unwrap(), Vec::<Element>::new());
    }

    #[rstest]
    fn test_selected_nodes_keep_their_position(catalog: Element) {
        let nodes = select("//price[. < 20]", &catalog).unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].pointer().to_string(), "/2/1");
    }

    #[rstest]
    fn test_select_is_deterministic(catalog: Element) {
        let code = "//*[name() = 'title' or @lang]";

        assert_eq!(select(code, &catalog).unwrap(), select(code, &catalog).unwrap());
    }

    #[rstest]
    #[case::div("book[price div 0]", EvalError::ZeroDivision)]
    #[case::modulo("book[price % 0]", EvalError::ZeroDivision)]
    #[case::unknown_function("book[frobnicate()]", EvalError::NotDefined("frobnicate".to_string()))]
    #[case::arity("book[contains(title)]", EvalError::InvalidNumberOfArguments("contains".to_string(), 2, 1))]
    fn test_select_errors(catalog: Element, #[case] code: &str, #[case] expected: EvalError) {
        assert_eq!(select(code, &catalog), Err(expected));
    }

    #[rstest]
    #[case::precedence("1 + 2 * 3", Value::Number(7.into()))]
    #[case::group("(1 + 2) * 3", Value::Number(9.into()))]
    #[case::logic("1 < 2 and 3 > 2", Value::Bool(true))]
    #[case::div("10 div 4", Value::Number(Number::new(2.5)))]
    #[case::modulo("7 % 4", Value::Number(3.into()))]
    #[case::negate("-(2 - 5)", Value::Number(3.into()))]
    #[case::string_eq("'abc' = 'abc'", Value::Bool(true))]
    #[case::string_order("'10' > '9'", Value::Bool(true))]
    #[case::non_numeric_order("'b' > 'a'", Value::Bool(false))]
    #[case::bool_eq("true() = 'x'", Value::Bool(true))]
    #[case::missing_eq("@missing = ''", Value::Bool(false))]
    #[case::missing_ne("@missing != ''", Value::Bool(false))]
    #[case::count("count() = 4", Value::Bool(true))]
    #[case::name("name() = 'catalog'", Value::Bool(true))]
    #[case::string("string(1 div 4)", Value::String("0.25".to_string()))]
    #[case::concat("concat('a', 1, true())", Value::String("a1true".to_string()))]
    #[case::short_circuit("0 and frobnicate()", Value::Bool(false))]
    #[case::tiny_divisor("1 div 0.0000000000000001 > 0", Value::Bool(true))]
    #[case::tiny_is_true("boolean(0.0000000000000001)", Value::Bool(true))]
    #[case::exact_text("string(1 div 3)", Value::String("0.3333333333333333".to_string()))]
    #[case::large_text("string(100000000000000000000)", Value::String("100000000000000000000".to_string()))]
    fn test_evaluate(catalog: Element, #[case] code: &str, #[case] expected: Value<Element>) {
        assert_eq!(evaluate(code, &catalog), Ok(expected));
    }
}
