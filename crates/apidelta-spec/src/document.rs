//! Resolved OpenAPI/Swagger documents
//!
//! [`SpecDocument`] wraps the plain JSON tree produced by the loader. It
//! never holds reference proxies: by the time a document exists, internal
//! `$ref` nodes have already been inlined.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::key::{MethodKey, OperationId, PathKey};

/// A parsed, reference-resolved API description
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    root: Value,
}

impl SpecDocument {
    /// Wrap a resolved tree
    ///
    /// # Errors
    /// Returns error if the root is null, not a mapping, or an empty mapping
    pub fn new(root: Value) -> Result<Self, DocumentError> {
        match &root {
            Value::Null => Err(DocumentError::Empty),
            Value::Object(map) if map.is_empty() => Err(DocumentError::Empty),
            Value::Object(_) => Ok(Self { root }),
            other => Err(DocumentError::NotAMapping(kind_of(other))),
        }
    }

    /// The underlying tree
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Consume into the underlying tree
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Top-level section by name
    #[inline]
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    /// `openapi` version string, or `swagger` for 2.0 documents
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.section("openapi")
            .or_else(|| self.section("swagger"))
            .and_then(Value::as_str)
    }

    /// `components` section
    #[inline]
    #[must_use]
    pub fn components(&self) -> Option<&Value> {
        self.section("components")
    }

    /// `paths` mapping (absent or malformed sections read as empty)
    #[must_use]
    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.section("paths").and_then(Value::as_object)
    }

    /// Every path template in the document
    #[must_use]
    pub fn path_keys(&self) -> BTreeSet<PathKey> {
        self.paths()
            .map(|paths| paths.keys().map(|k| PathKey::new(k.as_str())).collect())
            .unwrap_or_default()
    }

    /// The full path item under `path`
    #[inline]
    #[must_use]
    pub fn path_item(&self, path: &PathKey) -> Option<&Value> {
        self.paths()?.get(path.as_str())
    }

    /// HTTP methods declared under `path`
    #[must_use]
    pub fn methods(&self, path: &PathKey) -> BTreeSet<MethodKey> {
        self.path_item(path)
            .and_then(Value::as_object)
            .map(|item| {
                item.keys()
                    .filter_map(|k| MethodKey::parse_operation_key(k))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All operations under one path, in document order
    #[must_use]
    pub fn operations_of<'a>(&'a self, path: &PathKey) -> Vec<Operation<'a>> {
        let Some(item) = self.path_item(path).and_then(Value::as_object) else {
            return Vec::new();
        };
        let shared_parameters = item.get("parameters");
        item.iter()
            .filter_map(|(key, body)| {
                MethodKey::parse_operation_key(key).map(|method| Operation {
                    id: OperationId::new(path.clone(), method),
                    body,
                    shared_parameters,
                })
            })
            .collect()
    }

    /// Every operation in the document
    #[must_use]
    pub fn operations(&self) -> Vec<Operation<'_>> {
        let Some(paths) = self.paths() else {
            return Vec::new();
        };
        paths
            .keys()
            .flat_map(|path| self.operations_of(&PathKey::new(path.as_str())))
            .collect()
    }

    /// Look up one operation
    #[must_use]
    pub fn operation(&self, id: &OperationId) -> Option<Operation<'_>> {
        self.operations_of(&id.path)
            .into_iter()
            .find(|op| op.id.method == id.method)
    }
}

/// Borrowed view of one operation inside a document
#[derive(Debug, Clone)]
pub struct Operation<'a> {
    /// Which operation
    pub id: OperationId,
    /// The operation object
    pub body: &'a Value,
    /// Path-level `parameters`, shared by every method of the path
    pub shared_parameters: Option<&'a Value>,
}

/// Errors building a [`SpecDocument`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Root is null or an empty mapping
    #[error("document is empty")]
    Empty,

    /// Root is a scalar or sequence
    #[error("document root must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
