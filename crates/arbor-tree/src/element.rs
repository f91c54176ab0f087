use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::node::{Attributes, Node};

#[cfg(feature = "json")]
pub mod json;

#[derive(Debug, Clone, PartialEq, Default)]
struct ElementData {
    name: SmolStr,
    attributes: Attributes,
    text: Option<String>,
    children: Vec<Rc<ElementData>>,
}

/// The reference [`Node`] implementation: a persistent tree of shared
/// `Rc` nodes.
///
/// A handle carries its parent handle and sibling index. Mutating a handle
/// rebuilds the spine from the changed node up to the root and shares every
/// untouched subtree with the previous tree.
#[derive(Clone)]
pub struct Element {
    data: Rc<ElementData>,
    parent: Option<Rc<Element>>,
    index: usize,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self::detached(ElementData {
            name: SmolStr::new(name),
            ..Default::default()
        })
    }

    /// A childless element holding `text`.
    pub fn leaf(name: &str, text: &str) -> Self {
        Self::detached(ElementData {
            name: SmolStr::new(name),
            text: Some(text.to_string()),
            ..Default::default()
        })
    }

    pub fn with_text(&self, text: Option<&str>) -> Self {
        self.rebuild(ElementData {
            text: text.map(str::to_string),
            ..self.data_clone()
        })
    }

    pub fn with_attribute(&self, key: &str, value: &str) -> Self {
        let mut attributes = self.data.attributes.clone();
        attributes.insert(SmolStr::new(key), value.to_string());
        self.set_attributes(attributes)
    }

    pub fn with_children(&self, children: impl IntoIterator<Item = Element>) -> Self {
        self.set_children(children.into_iter().collect())
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.data.attributes.get(key).map(String::as_str)
    }

    fn detached(data: ElementData) -> Self {
        Element {
            data: Rc::new(data),
            parent: None,
            index: 0,
        }
    }

    fn data_clone(&self) -> ElementData {
        (*self.data).clone()
    }

    fn rebuild(&self, data: ElementData) -> Self {
        let data = Rc::new(data);

        match &self.parent {
            None => Element {
                data,
                parent: None,
                index: 0,
            },
            Some(parent) => {
                let mut parent_data = parent.data_clone();
                parent_data.children[self.index] = Rc::clone(&data);

                Element {
                    data,
                    parent: Some(Rc::new(parent.rebuild(parent_data))),
                    index: self.index,
                }
            }
        }
    }
}

impl Node for Element {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn with_name(&self, name: &str) -> Self {
        if self.name() == name {
            return self.clone();
        }

        self.rebuild(ElementData {
            name: SmolStr::new(name),
            ..self.data_clone()
        })
    }

    fn children(&self) -> Vec<Self> {
        let parent = Rc::new(self.clone());

        self.data
            .children
            .iter()
            .enumerate()
            .map(|(index, data)| Element {
                data: Rc::clone(data),
                parent: Some(Rc::clone(&parent)),
                index,
            })
            .collect()
    }

    fn child_count(&self) -> usize {
        self.data.children.len()
    }

    fn child(&self, index: usize) -> Option<Self> {
        self.data.children.get(index).map(|data| Element {
            data: Rc::clone(data),
            parent: Some(Rc::new(self.clone())),
            index,
        })
    }

    fn set_children(&self, children: Vec<Self>) -> Self {
        self.rebuild(ElementData {
            children: children.into_iter().map(|child| child.data).collect(),
            ..self.data_clone()
        })
    }

    fn parent(&self) -> Option<Self> {
        self.parent.as_deref().cloned()
    }

    fn remove_parent(&self) -> Self {
        Element {
            data: Rc::clone(&self.data),
            parent: None,
            index: 0,
        }
    }

    fn attributes(&self) -> Attributes {
        self.data.attributes.clone()
    }

    fn set_attributes(&self, attributes: Attributes) -> Self {
        self.rebuild(ElementData {
            attributes,
            ..self.data_clone()
        })
    }

    fn index(&self) -> usize {
        self.index
    }

    fn text(&self) -> Option<String> {
        self.data.text.clone()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data) || self.data == other.data
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.data, f)
    }
}

/// Renders the subtree as markup, e.g. `<a k="v"><b>text</b></a>`.
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_markup(&self.data, f)
    }
}

fn write_markup(data: &ElementData, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<{}", data.name)?;
    for (key, value) in &data.attributes {
        write!(f, " {}=\"{}\"", key, value)?;
    }

    if data.children.is_empty() && data.text.is_none() {
        return write!(f, "/>");
    }

    write!(f, ">")?;
    if let Some(text) = &data.text {
        write!(f, "{}", text)?;
    }
    for child in &data.children {
        write_markup(child, f)?;
    }
    write!(f, "</{}>", data.name)
}
