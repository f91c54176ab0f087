use std::fmt::{self, Display};

use crate::node::Node;
use crate::pointer::Pointer;

pub mod error;
#[cfg(feature = "json")]
mod json;

pub use error::{PatchError, PatchFailure};

#[derive(Debug, Clone, PartialEq)]
pub enum Operation<N> {
    Add { path: Pointer, value: N },
    Remove { path: Pointer },
    Replace { path: Pointer, value: N },
    Move { from: Pointer, path: Pointer },
    Copy { from: Pointer, path: Pointer },
    Test { path: Pointer, value: N },
}

impl<N> Operation<N> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "add",
            Operation::Remove { .. } => "remove",
            Operation::Replace { .. } => "replace",
            Operation::Move { .. } => "move",
            Operation::Copy { .. } => "copy",
            Operation::Test { .. } => "test",
        }
    }

    pub fn path(&self) -> &Pointer {
        match self {
            Operation::Add { path, .. }
            | Operation::Remove { path }
            | Operation::Replace { path, .. }
            | Operation::Move { path, .. }
            | Operation::Copy { path, .. }
            | Operation::Test { path, .. } => path,
        }
    }

    pub fn from(&self) -> Option<&Pointer> {
        match self {
            Operation::Move { from, .. } | Operation::Copy { from, .. } => Some(from),
            _ => None,
        }
    }
}

impl<N> Display for Operation<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from() {
            Some(from) => write!(f, "{} \"{}\" to \"{}\"", self.name(), from, self.path()),
            None => write!(f, "{} \"{}\"", self.name(), self.path()),
        }
    }
}

impl<N: Node> Operation<N> {
    fn apply(&self, node: &N, start: &Pointer) -> Result<N, PatchFailure> {
        match self {
            Operation::Add { path, value } => Ok(path.add(node, value.clone())?),
            Operation::Remove { path } => Ok(path.remove(node)?),
            Operation::Replace { path, value } => Ok(path.replace(node, value.clone())?),
            Operation::Move { from, path } => {
                if from.is_ancestor_of(path) {
                    return Err(PatchFailure::MoveIntoDescendant {
                        from: from.clone(),
                        path: path.clone(),
                    });
                }

                let captured = Self::capture(from, node)?;
                let removed = from.remove(node)?;
                let anchored = reanchor(start, &removed)?;
                Ok(path.add(&anchored, captured)?)
            }
            Operation::Copy { from, path } => {
                let captured = Self::capture(from, node)?;
                Ok(path.add(node, captured)?)
            }
            Operation::Test { path, value } => {
                let actual = path.traverse(node).ok_or_else(|| path.not_found(node))?.remove_parent();
                let expected = value.remove_parent().with_name(actual.name());

                if actual != expected {
                    return Err(PatchFailure::TestFailed {
                        path: path.clone(),
                        expected: format!("{:?}", expected),
                        actual: format!("{:?}", actual),
                    });
                }

                Ok(node.clone())
            }
        }
    }

    fn capture(from: &Pointer, node: &N) -> Result<N, PatchFailure> {
        Ok(from.traverse(node).ok_or_else(|| from.not_found(node))?.remove_parent())
    }
}

/// An ordered chain of operations, applied relative to the node it is
/// applied to.
///
/// Patches are values: every builder method returns a new patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch<N> {
    operations: Vec<Operation<N>>,
}

impl<N> Default for Patch<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<N> Patch<N> {
    pub const fn empty() -> Self {
        Self { operations: Vec::new() }
    }

    pub fn operations(&self) -> &[Operation<N>] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation<N>> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<N: Node> Patch<N> {
    pub fn add(&self, path: Pointer, value: N) -> Self {
        self.push(Operation::Add { path, value })
    }

    pub fn remove(&self, path: Pointer) -> Self {
        self.push(Operation::Remove { path })
    }

    pub fn replace(&self, path: Pointer, value: N) -> Self {
        self.push(Operation::Replace { path, value })
    }

    pub fn move_(&self, from: Pointer, path: Pointer) -> Result<Self, PatchError> {
        if from == path {
            return Err(PatchError::SameFromAndPath(path));
        }
        Ok(self.push(Operation::Move { from, path }))
    }

    pub fn copy(&self, from: Pointer, path: Pointer) -> Result<Self, PatchError> {
        if from == path {
            return Err(PatchError::SameFromAndPath(path));
        }
        Ok(self.push(Operation::Copy { from, path }))
    }

    pub fn test(&self, path: Pointer, value: N) -> Self {
        self.push(Operation::Test { path, value })
    }

    /// This patch followed by `other`.
    pub fn then(&self, other: &Patch<N>) -> Self {
        Self {
            operations: self.operations.iter().chain(other.operations.iter()).cloned().collect(),
        }
    }

    /// Applies every operation in order and returns the node the patch was
    /// applied to, re-located inside the patched tree.
    ///
    /// Operations are all-or-nothing: the first failure aborts and `node`'s
    /// tree is never altered.
    pub fn apply(&self, node: &N) -> Result<N, PatchError> {
        let start = node.pointer();

        self.operations
            .iter()
            .enumerate()
            .try_fold(node.clone(), |current, (index, operation)| {
                tracing::debug!(index, %operation, "applying patch operation");

                operation
                    .apply(&current, &start)
                    .and_then(|result| reanchor(&start, &result))
                    .map_err(|cause| PatchError::ApplyFailed {
                        index,
                        operation: operation.to_string(),
                        cause,
                    })
            })
    }

    fn push(&self, operation: Operation<N>) -> Self {
        let mut operations = self.operations.clone();
        operations.push(operation);
        Self { operations }
    }
}

impl<'a, N> IntoIterator for &'a Patch<N> {
    type Item = &'a Operation<N>;
    type IntoIter = std::slice::Iter<'a, Operation<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

fn reanchor<N: Node>(start: &Pointer, node: &N) -> Result<N, PatchFailure> {
    let root = node.root();
    if start.is_empty() {
        return Ok(root);
    }

    tracing::trace!(%start, "re-resolving patch anchor");
    start
        .traverse(&root)
        .ok_or_else(|| PatchFailure::StartNotFound(start.clone()))
}
