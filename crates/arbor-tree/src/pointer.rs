use std::fmt::{self, Display};
use std::str::FromStr;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::node::Node;

pub mod error;

pub use error::PointerError;

pub const SEPARATOR: char = '/';
const APPEND_MARKER: &str = "-";
const INDEX_MARKER: char = '#';
const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// The first child with the given name.
    Named(SmolStr),
    /// The child at the given position.
    Indexed(usize),
    /// The first child, whatever its name.
    Any,
    /// The position after the last child (`-`).
    None,
    /// Climb `ancestors` levels; with `index` set the pointer evaluates to
    /// the sibling index of the node reached.
    Relative { ancestors: usize, index: bool },
}

/// What a pointer evaluates to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target<N> {
    Node(N),
    Index(usize),
}

/// A path into a tree, following RFC 6901 with relative pointer prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer {
    segments: SmallVec<[Segment; 4]>,
}

impl Pointer {
    /// The pointer to the node it is applied to.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A relative pointer climbing `ancestors` levels. With `index` set it
    /// evaluates to the sibling index of the node reached and takes no
    /// further segments.
    pub fn relative(ancestors: usize, index: bool) -> Self {
        Self {
            segments: SmallVec::from_elem(Segment::Relative { ancestors, index }, 1),
        }
    }

    pub fn parse(text: &str) -> Result<Self, PointerError> {
        let mut segments = SmallVec::new();
        if text.is_empty() {
            return Ok(Self { segments });
        }

        let mut components = text.split(SEPARATOR);
        let mut terminated = false;

        if let Some(prefix) = components.next()
            && !prefix.is_empty()
        {
            let (digits, index) = match prefix.strip_suffix(INDEX_MARKER) {
                Some(digits) => (digits, true),
                None => (prefix, false),
            };

            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PointerError::syntax(
                    text,
                    format!("relative prefix \"{}\" is not a number", prefix),
                ));
            }

            let ancestors = digits
                .parse::<usize>()
                .map_err(|e| PointerError::syntax(text, e.to_string()))?;
            segments.push(Segment::Relative { ancestors, index });
            terminated = index;
        }

        for component in components {
            if terminated {
                return Err(PointerError::syntax(text, "\"#\" must end the pointer"));
            }
            segments.push(Self::parse_component(text, component)?);
        }

        Ok(Self { segments })
    }

    fn parse_component(text: &str, component: &str) -> Result<Segment, PointerError> {
        match component {
            APPEND_MARKER => return Ok(Segment::None),
            WILDCARD => return Ok(Segment::Any),
            _ => {}
        }

        let is_index = !component.is_empty()
            && component.bytes().all(|b| b.is_ascii_digit())
            && (component == "0" || !component.starts_with('0'));
        if is_index && let Ok(index) = component.parse::<usize>() {
            return Ok(Segment::Indexed(index));
        }

        unescape(component)
            .map(|name| Segment::Named(name.into()))
            .ok_or_else(|| PointerError::syntax(text, format!("invalid escape in \"{}\"", component)))
    }

    /// Returns a new pointer with `segment` at the end. A relative segment
    /// can only be built with [`Pointer::relative`], and nothing follows an
    /// index (`#`) segment.
    pub fn append(&self, segment: Segment) -> Result<Self, PointerError> {
        if matches!(segment, Segment::Relative { .. }) {
            return Err(PointerError::syntax(
                &self.to_string(),
                "a relative segment must start the pointer",
            ));
        }
        if self.is_index() {
            return Err(PointerError::syntax(&self.to_string(), "\"#\" must end the pointer"));
        }

        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    pub fn named(&self, name: &str) -> Result<Self, PointerError> {
        self.append(Segment::Named(SmolStr::new(name)))
    }

    pub fn indexed(&self, index: usize) -> Result<Self, PointerError> {
        self.append(Segment::Indexed(index))
    }

    pub fn any(&self) -> Result<Self, PointerError> {
        self.append(Segment::Any)
    }

    pub fn end(&self) -> Result<Self, PointerError> {
        self.append(Segment::None)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_relative(&self) -> bool {
        matches!(self.segments.first(), Some(Segment::Relative { .. }))
    }

    /// Whether the pointer asks for a sibling index (`N#`) rather than a node.
    pub fn is_index(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Relative { index: true, .. }))
    }

    /// The pointer without its final segment.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.iter().cloned().collect(),
        })
    }

    /// Whether `other` points strictly below this pointer.
    pub fn is_ancestor_of(&self, other: &Pointer) -> bool {
        other.segments.len() > self.segments.len() && other.segments.starts_with(&self.segments)
    }

    /// The node this pointer locates. Index pointers (`N#`) locate no node.
    pub fn traverse<N: Node>(&self, node: &N) -> Option<N> {
        if self.is_index() {
            return None;
        }
        self.resolve(node)
    }

    pub fn evaluate<N: Node>(&self, node: &N) -> Option<Target<N>> {
        let found = self.resolve(node)?;

        if self.is_index() {
            Some(Target::Index(found.index()))
        } else {
            Some(Target::Node(found))
        }
    }

    fn resolve<N: Node>(&self, node: &N) -> Option<N> {
        self.segments
            .iter()
            .try_fold(node.clone(), |current, segment| Self::step(&current, segment))
    }

    fn step<N: Node>(node: &N, segment: &Segment) -> Option<N> {
        match segment {
            Segment::Named(name) => node.children().into_iter().find(|child| child.name() == name.as_str()),
            Segment::Indexed(index) => node.child(*index),
            Segment::Any => node.first_child(),
            Segment::None => None,
            Segment::Relative { ancestors, .. } => (0..*ancestors).try_fold(node.clone(), |current, _| current.parent()),
        }
    }

    /// Adds `value` at this pointer and returns the node that received it,
    /// inside the new tree.
    pub fn add<N: Node>(&self, node: &N, value: N) -> Result<N, PointerError> {
        let Some(last) = self.segments.last() else {
            return Self::replace_node(node, value);
        };

        let parent = || {
            self.parent()
                .and_then(|pointer| pointer.traverse(node))
                .ok_or_else(|| self.not_found(node))
        };

        match last {
            Segment::Relative { .. } => {
                let target = self.traverse(node).ok_or_else(|| self.not_found(node))?;
                Self::replace_node(&target, value)
            }
            Segment::None => Ok(parent()?.append_child(value)),
            Segment::Indexed(index) => Ok(parent()?.insert_child(*index, value)?),
            Segment::Named(name) => {
                let parent = parent()?;
                match parent.children().iter().find(|child| child.name() == name.as_str()) {
                    Some(existing) => Ok(parent.replace_child(existing.index(), value.with_name(name))?),
                    None => Ok(parent.append_child(value.with_name(name))),
                }
            }
            Segment::Any => {
                let parent = parent()?;
                if parent.child_count() > 0 {
                    Ok(parent.replace_child(0, value)?)
                } else {
                    Ok(parent.append_child(value))
                }
            }
        }
    }

    /// Removes the node at this pointer and returns its former parent,
    /// inside the new tree.
    pub fn remove<N: Node>(&self, node: &N) -> Result<N, PointerError> {
        let target = self.traverse(node).ok_or_else(|| self.not_found(node))?;
        Ok(target.parent_without()?)
    }

    /// Swaps the node at this pointer for `value`, which takes over the
    /// replaced node's name and position. Returns the parent in the new tree,
    /// or the detached value when the target is a root.
    pub fn replace<N: Node>(&self, node: &N, value: N) -> Result<N, PointerError> {
        let target = self.traverse(node).ok_or_else(|| self.not_found(node))?;
        let value = value.with_name(target.name());

        match target.parent_without() {
            Ok(parent) => Ok(parent.insert_child(target.index(), value)?),
            Err(_) => Ok(value.remove_parent()),
        }
    }

    pub(crate) fn not_found<N: Node>(&self, node: &N) -> PointerError {
        PointerError::NotFound {
            pointer: self.clone(),
            node: node.pointer(),
        }
    }

    fn replace_node<N: Node>(target: &N, value: N) -> Result<N, PointerError> {
        match target.parent() {
            Some(parent) => Ok(parent.replace_child(target.index(), value.with_name(target.name()))?),
            None => Ok(value.remove_parent()),
        }
    }
}

impl FromIterator<Segment> for Pointer {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::parse(s)
    }
}

impl TryFrom<&str> for Pointer {
    type Error = PointerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Pointer::parse(value)
    }
}

impl Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Relative { ancestors, index } => {
                    if i > 0 {
                        write!(f, "{}", SEPARATOR)?;
                    }
                    write!(f, "{}", ancestors)?;
                    if *index {
                        write!(f, "{}", INDEX_MARKER)?;
                    }
                }
                Segment::Named(name) => write!(f, "{}{}", SEPARATOR, escape(name))?,
                Segment::Indexed(index) => write!(f, "{}{}", SEPARATOR, index)?,
                Segment::Any => write!(f, "{}*", SEPARATOR)?,
                Segment::None => write!(f, "{}{}", SEPARATOR, APPEND_MARKER)?,
            }
        }

        Ok(())
    }
}

fn escape(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

fn unescape(component: &str) -> Option<String> {
    let mut unescaped = String::with_capacity(component.len());
    let mut chars = component.chars();

    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => unescaped.push('~'),
                Some('1') => unescaped.push('/'),
                _ => return None,
            }
        } else {
            unescaped.push(c);
        }
    }

    Some(unescaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::node::NodeError;
    use rstest::{fixture, rstest};

    fn names<N: Node>(node: &N) -> Vec<String> {
        node.children().iter().map(|c| c.name().to_string()).collect()
    }

    #[fixture]
    fn tree() -> Element {
        Element::new("root").with_children([
            Element::new("a").with_children([Element::leaf("x", "1"), Element::leaf("y", "2")]),
            Element::leaf("b", "3"),
            Element::new("a/b~"),
        ])
    }

    #[rstest]
    #[case("", vec![])]
    #[case("/a", vec![Segment::Named("a".into())])]
    #[case("/0/-", vec![Segment::Indexed(0), Segment::None])]
    #[case("/01", vec![Segment::Named("01".into())])]
    #[case("/a~1b~0", vec![Segment::Named("a/b~".into())])]
    #[case("/~01", vec![Segment::Named("~1".into())])]
    #[case("/a/*", vec![Segment::Named("a".into()), Segment::Any])]
    #[case("/", vec![Segment::Named("".into())])]
    #[case("0", vec![Segment::Relative { ancestors: 0, index: false }])]
    #[case("2#", vec![Segment::Relative { ancestors: 2, index: true }])]
    #[case("1/a/3", vec![Segment::Relative { ancestors: 1, index: false }, Segment::Named("a".into()), Segment::Indexed(3)])]
    fn test_parse(#[case] input: &str, #[case] expected: Vec<Segment>) {
        assert_eq!(Pointer::parse(input), Ok(expected.into_iter().collect()));
    }

    #[rstest]
    #[case("a/b")]
    #[case("+1")]
    #[case("#")]
    #[case("1#/a")]
    #[case("/a~2")]
    #[case("/a~")]
    fn test_parse_error(#[case] input: &str) {
        assert!(matches!(
            Pointer::parse(input),
            Err(PointerError::InvalidSyntax { pointer, .. }) if pointer == input
        ));
    }

    #[rstest]
    #[case("")]
    #[case("/a/0/-")]
    #[case("/a~1b~0/c")]
    #[case("3")]
    #[case("1#")]
    #[case("2/x/0")]
    #[case("/*/0")]
    fn test_display_round_trip(#[case] input: &str) {
        let pointer = Pointer::parse(input).unwrap();

        assert_eq!(pointer.to_string(), input);
        assert_eq!(Pointer::parse(&pointer.to_string()), Ok(pointer));
    }

    #[test]
    fn test_append_returns_new_pointer() {
        let base = Pointer::empty().named("a").unwrap();
        let extended = base.indexed(1).and_then(|p| p.end()).unwrap();

        assert_eq!(base.to_string(), "/a");
        assert_eq!(extended.to_string(), "/a/1/-");
        assert_eq!(Pointer::relative(2, false).named("x").unwrap().to_string(), "2/x");

        let any = Pointer::empty().any().unwrap();
        assert_eq!(any.to_string(), "/*");
        assert_eq!(Pointer::parse(&any.to_string()), Ok(any));
    }

    #[rstest]
    #[case::after_index(Pointer::relative(1, true), Segment::Named("a".into()))]
    #[case::relative_after_named(Pointer::parse("/a").unwrap(), Segment::Relative { ancestors: 2, index: false })]
    #[case::relative_after_relative(Pointer::relative(1, false), Segment::Relative { ancestors: 1, index: true })]
    fn test_append_rejects_unrepresentable(#[case] pointer: Pointer, #[case] segment: Segment) {
        assert!(matches!(pointer.append(segment), Err(PointerError::InvalidSyntax { .. })));
    }

    #[rstest]
    #[case("/a/1", Some("y"))]
    #[case("/0/x", Some("x"))]
    #[case("/a~1b~0", Some("a/b~"))]
    #[case("/b", Some("b"))]
    #[case("/a/2", None)]
    #[case("/a/-", None)]
    #[case("/z/0", None)]
    fn test_traverse(tree: Element, #[case] input: &str, #[case] expected: Option<&str>) {
        let pointer = Pointer::parse(input).unwrap();

        assert_eq!(pointer.traverse(&tree).map(|n| n.name().to_string()).as_deref(), expected);
    }

    #[rstest]
    fn test_any_selects_first_child(tree: Element) {
        let found = Pointer::parse("/*/*").unwrap().traverse(&tree).unwrap();

        assert_eq!(found.name(), "x");
    }

    #[rstest]
    fn test_relative(tree: Element) {
        let y = tree.child(0).unwrap().child(1).unwrap();

        assert_eq!(Pointer::parse("0").unwrap().traverse(&y), Some(y.clone()));
        assert_eq!(Pointer::parse("1/0").unwrap().traverse(&y).unwrap().name(), "x");
        assert_eq!(Pointer::parse("2/b").unwrap().traverse(&y).unwrap().name(), "b");
        assert_eq!(Pointer::parse("3").unwrap().traverse(&y), None);
        assert_eq!(Pointer::parse("0#").unwrap().evaluate(&y), Some(Target::Index(1)));
        assert_eq!(Pointer::parse("1#").unwrap().evaluate(&y), Some(Target::Index(0)));
        assert_eq!(Pointer::parse("3#").unwrap().evaluate(&y), None);
        assert_eq!(Pointer::parse("1#").unwrap().traverse(&y), None);
        assert_eq!(
            Pointer::parse("1").unwrap().evaluate(&y),
            Some(Target::Node(tree.child(0).unwrap()))
        );
    }

    #[rstest]
    #[case("/a/-", vec!["x", "y", "new"])]
    #[case("/a/0", vec!["new", "x", "y"])]
    #[case("/a/2", vec!["x", "y", "new"])]
    #[case("/a/y", vec!["x", "y"])]
    #[case("/a/z", vec!["x", "y", "z"])]
    #[case("/a/*", vec!["new", "y"])]
    fn test_add(tree: Element, #[case] input: &str, #[case] expected: Vec<&str>) {
        let updated = Pointer::parse(input).unwrap().add(&tree, Element::leaf("new", "v")).unwrap();

        assert_eq!(updated.name(), "a");
        assert_eq!(names(&updated), expected);
        assert_eq!(names(&tree.child(0).unwrap()), vec!["x", "y"]);
    }

    #[rstest]
    fn test_add_named_replaces_in_place(tree: Element) {
        let updated = Pointer::parse("/a/x").unwrap().add(&tree, Element::leaf("new", "v")).unwrap();
        let x = updated.child(0).unwrap();

        assert_eq!(x.name(), "x");
        assert_eq!(x.text().as_deref(), Some("v"));
    }

    #[rstest]
    fn test_add_empty_pointer_replaces_root(tree: Element) {
        let updated = Pointer::empty().add(&tree, Element::new("other")).unwrap();

        assert!(updated.is_root());
        assert_eq!(updated, Element::new("other"));
    }

    #[rstest]
    fn test_add_out_of_bounds(tree: Element) {
        assert_eq!(
            Pointer::parse("/a/3").unwrap().add(&tree, Element::new("new")),
            Err(PointerError::Node(NodeError::IndexOutOfBounds { index: 3, len: 2 }))
        );
    }

    #[rstest]
    fn test_add_missing_parent(tree: Element) {
        let pointer = Pointer::parse("/missing/0").unwrap();

        assert_eq!(
            pointer.add(&tree, Element::new("new")),
            Err(PointerError::NotFound {
                pointer: pointer.clone(),
                node: Pointer::empty()
            })
        );
    }

    #[rstest]
    fn test_remove(tree: Element) {
        let updated = Pointer::parse("/a/0").unwrap().remove(&tree).unwrap();

        assert_eq!(names(&updated), vec!["y"]);
        assert_eq!(names(&updated.root()), vec!["a", "b", "a/b~"]);
        assert_eq!(names(&tree.child(0).unwrap()), vec!["x", "y"]);
    }

    #[rstest]
    fn test_remove_root(tree: Element) {
        assert_eq!(
            Pointer::empty().remove(&tree),
            Err(PointerError::Node(NodeError::CannotRemoveRoot))
        );
    }

    #[rstest]
    fn test_replace_keeps_name_and_position(tree: Element) {
        let updated = Pointer::parse("/1").unwrap().replace(&tree, Element::leaf("other", "9")).unwrap();
        let b = updated.child(1).unwrap();

        assert_eq!(names(&updated), vec!["a", "b", "a/b~"]);
        assert_eq!(b.text().as_deref(), Some("9"));
    }

    #[rstest]
    fn test_index_pointer_cannot_mutate(tree: Element) {
        let y = tree.child(0).unwrap().child(1).unwrap();
        let pointer = Pointer::parse("1#").unwrap();
        let not_found = PointerError::NotFound {
            pointer: pointer.clone(),
            node: y.pointer(),
        };

        assert_eq!(pointer.remove(&y), Err(not_found.clone()));
        assert_eq!(pointer.add(&y, Element::new("z")), Err(not_found.clone()));
        assert_eq!(pointer.replace(&y, Element::new("z")), Err(not_found));
        assert_eq!(names(&tree), vec!["a", "b", "a/b~"]);
    }

    #[rstest]
    fn test_relative_from_nested_node(tree: Element) {
        let x = tree.child(0).unwrap().child(0).unwrap();
        let updated = Pointer::parse("1/-").unwrap().add(&x, Element::new("z")).unwrap();

        assert_eq!(names(&updated), vec!["x", "y", "z"]);
        assert_eq!(updated.pointer().to_string(), "/0");
    }
}
