//! Path, method and operation keys
//!
//! [`OperationId`] is the `(path, method)` pair that names one operation.
//! Its slug is the stable file-name stem used for fragments, generated
//! artifacts and deletion prefixes.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// HTTP verbs that denote operations inside a path item
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A path template, e.g. `/pet/{petId}`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathKey(String);

impl PathKey {
    /// Wrap a path template
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The template as written in the document
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe rendering of the template
    ///
    /// Strips outer slashes, turns inner slashes into underscores and drops
    /// parameter braces. The bare root `/` renders as `root`.
    #[must_use]
    pub fn slug(&self) -> String {
        let cleaned: String = self
            .0
            .trim_matches('/')
            .chars()
            .filter(|c| !matches!(c, '{' | '}'))
            .map(|c| if c == '/' { '_' } else { c })
            .collect();
        if cleaned.is_empty() {
            "root".to_string()
        } else {
            cleaned
        }
    }
}

impl Display for PathKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathKey {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for PathKey {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for PathKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A lowercase HTTP verb, e.g. `get`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodKey(String);

impl MethodKey {
    /// Wrap a method name, lowercasing it
    #[inline]
    #[must_use]
    pub fn new(method: impl AsRef<str>) -> Self {
        Self(method.as_ref().to_ascii_lowercase())
    }

    /// Parse a path-item key, keeping only HTTP verbs
    #[must_use]
    pub fn parse_operation_key(key: &str) -> Option<Self> {
        let method = Self::new(key);
        method.is_http_method().then_some(method)
    }

    /// Lowercase form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key names one of [`HTTP_METHODS`]
    #[inline]
    #[must_use]
    pub fn is_http_method(&self) -> bool {
        HTTP_METHODS.contains(&self.0.as_str())
    }
}

impl Display for MethodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MethodKey {
    fn from(method: &str) -> Self {
        Self::new(method)
    }
}

/// One operation: a path template plus a method
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId {
    /// Path template
    pub path: PathKey,
    /// HTTP verb
    pub method: MethodKey,
}

impl OperationId {
    /// Create from parts
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathKey>, method: impl Into<MethodKey>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
        }
    }

    /// Filesystem-safe identifier, e.g. `/pet/{petId}` + `get` → `pet_petId_GET`
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}_{}", self.path.slug(), self.method.as_str().to_ascii_uppercase())
    }

    /// File name of the fragment for this operation
    #[inline]
    #[must_use]
    pub fn fragment_file_name(&self) -> String {
        format!("{}.json", self.slug())
    }
}

impl Display for OperationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.as_str().to_ascii_uppercase(), self.path)
    }
}
