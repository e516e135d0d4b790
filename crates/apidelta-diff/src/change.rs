//! Per-path change records

use apidelta_spec::{ContentHash, MethodKey, OperationId, PathKey};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// One observed difference between two revisions
///
/// Structural, not textual: `Updated` means the path subtree differs after
/// canonicalization, and carries the canonical fingerprints of both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathChange {
    /// Path template only in the newer revision
    Added {
        path: PathKey,
        methods: BTreeSet<MethodKey>,
    },

    /// Path in both revisions with a differing subtree
    Updated {
        path: PathKey,
        before: ContentHash,
        after: ContentHash,
    },

    /// Method gone from the newer revision
    ///
    /// `path_deleted` is set when the whole path template went away.
    MethodRemoved {
        operation: OperationId,
        path_deleted: bool,
    },
}

impl PathChange {
    /// Path template the change concerns
    #[must_use]
    pub fn path(&self) -> &PathKey {
        match self {
            Self::Added { path, .. } | Self::Updated { path, .. } => path,
            Self::MethodRemoved { operation, .. } => &operation.path,
        }
    }

    /// Whether the change asks for fragments to be extracted
    #[inline]
    #[must_use]
    pub fn needs_extraction(&self) -> bool {
        matches!(self, Self::Added { .. } | Self::Updated { .. })
    }

    /// Whether the change asks for stale artifacts to be removed
    #[inline]
    #[must_use]
    pub fn needs_deletion(&self) -> bool {
        matches!(self, Self::MethodRemoved { .. })
    }
}

impl Display for PathChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { path, methods } => {
                write!(f, "+ {path} ({} operations)", methods.len())
            }
            Self::Updated { path, before, after } => {
                write!(f, "~ {path} ({} -> {})", before.short(), after.short())
            }
            Self::MethodRemoved {
                operation,
                path_deleted: true,
            } => write!(f, "- {operation} (path removed)"),
            Self::MethodRemoved { operation, .. } => write!(f, "- {operation}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification_helpers() {
        let added = PathChange::Added {
            path: PathKey::new("/store"),
            methods: BTreeSet::from([MethodKey::new("get")]),
        };
        let removed = PathChange::MethodRemoved {
            operation: OperationId::new("/pet", "post"),
            path_deleted: false,
        };
        assert!(added.needs_extraction());
        assert!(!added.needs_deletion());
        assert!(removed.needs_deletion());
        assert_eq!(removed.path().as_str(), "/pet");
    }

    #[test]
    fn display_is_readable() {
        let removed = PathChange::MethodRemoved {
            operation: OperationId::new("/pet", "post"),
            path_deleted: true,
        };
        assert_eq!(removed.to_string(), "- POST /pet (path removed)");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let change = PathChange::MethodRemoved {
            operation: OperationId::new("/pet", "post"),
            path_deleted: false,
        };
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            json!({
                "kind": "method_removed",
                "operation": {"path": "/pet", "method": "post"},
                "path_deleted": false
            })
        );
    }
}
