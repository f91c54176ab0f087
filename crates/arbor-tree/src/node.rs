use std::collections::BTreeMap;
use std::fmt::Debug;

use smol_str::SmolStr;
use thiserror::Error;

use crate::pointer::{Pointer, Segment};

pub type Attributes = BTreeMap<SmolStr, String>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("The root node has no parent to be removed from")]
    CannotRemoveRoot,
    #[error("Index {index} is out of bounds for a node with {len} children")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// An immutable tree element.
///
/// Every mutator returns a new value and leaves the receiver untouched. The
/// returned node sits at the same position as the receiver inside a rebuilt
/// tree, so `parent()` and `root()` of the result observe the change.
///
/// Equality is structural over the subtree (name, attributes, text and
/// children); where a node sits in a larger tree does not take part in it.
pub trait Node: Clone + PartialEq + Debug + Sized {
    fn name(&self) -> &str;

    fn with_name(&self, name: &str) -> Self;

    fn children(&self) -> Vec<Self>;

    fn set_children(&self, children: Vec<Self>) -> Self;

    fn parent(&self) -> Option<Self>;

    /// Detaches this subtree, making it the root of its own tree.
    fn remove_parent(&self) -> Self;

    fn attributes(&self) -> Attributes;

    fn set_attributes(&self, attributes: Attributes) -> Self;

    /// Position among the parent's children, `0` for a root.
    fn index(&self) -> usize;

    /// Text carried directly by this node.
    fn text(&self) -> Option<String> {
        None
    }

    fn child_count(&self) -> usize {
        self.children().len()
    }

    fn child(&self, index: usize) -> Option<Self> {
        self.children().into_iter().nth(index)
    }

    fn first_child(&self) -> Option<Self> {
        self.child(0)
    }

    fn last_child(&self) -> Option<Self> {
        self.children().pop()
    }

    fn previous_sibling(&self) -> Option<Self> {
        let index = self.index().checked_sub(1)?;
        self.parent()?.child(index)
    }

    fn next_sibling(&self) -> Option<Self> {
        self.parent()?.child(self.index() + 1)
    }

    fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    fn append_child(&self, child: Self) -> Self {
        let mut children = self.children();
        children.push(child);
        self.set_children(children)
    }

    /// Inserts `child` before the child at `index`; `index == len` appends.
    fn insert_child(&self, index: usize, child: Self) -> Result<Self, NodeError> {
        let mut children = self.children();
        if index > children.len() {
            return Err(NodeError::IndexOutOfBounds {
                index,
                len: children.len(),
            });
        }

        children.insert(index, child);
        Ok(self.set_children(children))
    }

    fn remove_child(&self, index: usize) -> Result<Self, NodeError> {
        let mut children = self.children();
        if index >= children.len() {
            return Err(NodeError::IndexOutOfBounds {
                index,
                len: children.len(),
            });
        }

        children.remove(index);
        Ok(self.set_children(children))
    }

    fn replace_child(&self, index: usize, child: Self) -> Result<Self, NodeError> {
        let mut children = self.children();
        match children.get_mut(index) {
            Some(slot) => *slot = child,
            None => {
                return Err(NodeError::IndexOutOfBounds {
                    index,
                    len: children.len(),
                });
            }
        }

        Ok(self.set_children(children))
    }

    /// Returns the parent with this node removed from its children.
    fn parent_without(&self) -> Result<Self, NodeError> {
        self.parent()
            .ok_or(NodeError::CannotRemoveRoot)?
            .remove_child(self.index())
    }

    fn root(&self) -> Self {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Ancestors ordered from the parent up to the root.
    fn ancestors(&self) -> Vec<Self> {
        std::iter::successors(self.parent(), Node::parent).collect()
    }

    /// The absolute pointer from the root to this node.
    fn pointer(&self) -> Pointer {
        let mut indices = Vec::new();
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            indices.push(node.index());
            node = parent;
        }

        indices.into_iter().rev().map(Segment::Indexed).collect()
    }
}
