//! Single-operation fragments
//!
//! A [`Fragment`] is a standalone spec holding exactly one path with exactly
//! one method, plus the origin document's `components` copied verbatim so
//! every schema the operation might reach is still present.

use serde_json::{Map, Value};

use crate::document::{Operation, SpecDocument};
use crate::key::OperationId;

/// Top-level sections copied from the origin document when context is kept
const CONTEXT_SECTIONS: [&str; 5] = ["openapi", "swagger", "info", "servers", "security"];

/// How much of the origin document a fragment carries besides the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FragmentContext {
    /// `paths` and `components` only
    Minimal,
    /// Also `openapi`/`swagger`, `info`, `servers` and `security` when present
    #[default]
    Document,
}

/// Minimal standalone spec for one operation
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    id: OperationId,
    body: Value,
}

impl Fragment {
    /// Build the fragment for `op` out of `doc`
    #[must_use]
    pub fn from_operation(doc: &SpecDocument, op: &Operation<'_>, context: FragmentContext) -> Self {
        let mut path_item = Map::new();
        if let Some(parameters) = op.shared_parameters {
            path_item.insert("parameters".to_string(), parameters.clone());
        }
        path_item.insert(op.id.method.as_str().to_string(), op.body.clone());

        let mut paths = Map::new();
        paths.insert(op.id.path.as_str().to_string(), Value::Object(path_item));

        let mut body = Map::new();
        if context == FragmentContext::Document {
            for section in CONTEXT_SECTIONS {
                if let Some(value) = doc.section(section) {
                    body.insert(section.to_string(), value.clone());
                }
            }
        }
        body.insert("paths".to_string(), Value::Object(paths));
        body.insert(
            "components".to_string(),
            doc.components()
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        );

        Self {
            id: op.id.clone(),
            body: Value::Object(body),
        }
    }

    /// Operation this fragment was cut from
    #[inline]
    #[must_use]
    pub fn id(&self) -> &OperationId {
        &self.id
    }

    /// Fragment document
    #[inline]
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// File name, `<slug>.json`
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> String {
        self.id.fragment_file_name()
    }

    /// Pretty-printed JSON with two-space indentation
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.body)
    }
}
