use thiserror::Error;

use super::Pointer;
use crate::node::NodeError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PointerError {
    #[error("Invalid pointer \"{pointer}\": {reason}")]
    InvalidSyntax { pointer: String, reason: String },
    #[error("Pointer \"{pointer}\" does not resolve from the node at \"{node}\"")]
    NotFound { pointer: Pointer, node: Pointer },
    #[error(transparent)]
    Node(#[from] NodeError),
}

impl PointerError {
    pub(crate) fn syntax(pointer: &str, reason: impl Into<String>) -> Self {
        PointerError::InvalidSyntax {
            pointer: pointer.to_string(),
            reason: reason.into(),
        }
    }
}
