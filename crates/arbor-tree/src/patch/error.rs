use thiserror::Error;

use crate::pointer::{Pointer, PointerError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("\"from\" and \"path\" must differ, both are \"{0}\"")]
    SameFromAndPath(Pointer),
    #[error("Patch operation {index} ({operation}) failed: {cause}")]
    ApplyFailed {
        index: usize,
        operation: String,
        #[source]
        cause: PatchFailure,
    },
}

/// Why a single operation could not be applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchFailure {
    #[error(transparent)]
    Pointer(#[from] PointerError),
    #[error("Test failed at \"{path}\": expected {expected}, found {actual}")]
    TestFailed {
        path: Pointer,
        expected: String,
        actual: String,
    },
    #[error("Cannot move \"{from}\" into its own descendant \"{path}\"")]
    MoveIntoDescendant { from: Pointer, path: Pointer },
    #[error("The patched node \"{0}\" no longer exists")]
    StartNotFound(Pointer),
}

#[cfg(feature = "json")]
#[derive(Error, Debug)]
pub enum PatchDocumentError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pointer(#[from] PointerError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}
