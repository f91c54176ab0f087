use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::PatchDocumentError;
use super::{Operation, Patch};
use crate::element::Element;
use crate::pointer::Pointer;

/// One entry of an RFC 6902 patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum OperationDocument {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

fn element(value: &Value) -> Element {
    Element::from_json("", value)
}

impl Patch<Element> {
    pub fn from_json(json: &str) -> Result<Self, PatchDocumentError> {
        Self::from_json_value(serde_json::from_str(json)?)
    }

    pub fn from_json_value(value: Value) -> Result<Self, PatchDocumentError> {
        let documents: Vec<OperationDocument> = serde_json::from_value(value)?;

        documents.into_iter().try_fold(Patch::empty(), |patch, document| {
            let patch = match document {
                OperationDocument::Add { path, value } => patch.add(Pointer::parse(&path)?, element(&value)),
                OperationDocument::Remove { path } => patch.remove(Pointer::parse(&path)?),
                OperationDocument::Replace { path, value } => {
                    patch.replace(Pointer::parse(&path)?, element(&value))
                }
                OperationDocument::Move { from, path } => {
                    patch.move_(Pointer::parse(&from)?, Pointer::parse(&path)?)?
                }
                OperationDocument::Copy { from, path } => patch.copy(Pointer::parse(&from)?, Pointer::parse(&path)?)?,
                OperationDocument::Test { path, value } => patch.test(Pointer::parse(&path)?, element(&value)),
            };
            Ok(patch)
        })
    }

    pub fn to_json_value(&self) -> Result<Value, PatchDocumentError> {
        let documents = self
            .iter()
            .map(|operation| match operation {
                Operation::Add { path, value } => OperationDocument::Add {
                    path: path.to_string(),
                    value: value.to_json(),
                },
                Operation::Remove { path } => OperationDocument::Remove { path: path.to_string() },
                Operation::Replace { path, value } => OperationDocument::Replace {
                    path: path.to_string(),
                    value: value.to_json(),
                },
                Operation::Move { from, path } => OperationDocument::Move {
                    from: from.to_string(),
                    path: path.to_string(),
                },
                Operation::Copy { from, path } => OperationDocument::Copy {
                    from: from.to_string(),
                    path: path.to_string(),
                },
                Operation::Test { path, value } => OperationDocument::Test {
                    path: path.to_string(),
                    value: value.to_json(),
                },
            })
            .collect::<Vec<_>>();

        Ok(serde_json::to_value(documents)?)
    }
}
