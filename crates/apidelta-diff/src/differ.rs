//! Path differ

use crate::change::PathChange;
use crate::result::DiffResult;
use apidelta_spec::{structurally_equal, ContentHash, MethodKey, OperationId, SpecDocument};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Compares the `paths` sections of two resolved revisions
#[derive(Debug, Clone, Copy, Default)]
pub struct PathDiffer;

impl PathDiffer {
    /// Create differ
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Classify changes from `old` to `new`
    #[must_use]
    pub fn diff(&self, old: &SpecDocument, new: &SpecDocument) -> DiffResult {
        let changes = self.changes(old, new);
        let result = DiffResult::from_changes(&changes);
        tracing::info!(
            added = result.added.len(),
            updated = result.updated.len(),
            deleted = result.deleted.len(),
            "diffed revisions"
        );
        result
    }

    /// Detailed change listing, ordered by path template
    ///
    /// Paths present in both revisions are compared with key and sequence
    /// order ignored. Removed methods are reported for deleted paths and for
    /// surviving paths alike.
    #[must_use]
    pub fn changes(&self, old: &SpecDocument, new: &SpecDocument) -> Vec<PathChange> {
        let old_paths = old.path_keys();
        let new_paths = new.path_keys();
        let mut changes = Vec::new();

        for path in new_paths.difference(&old_paths) {
            tracing::debug!(path = %path, "path added");
            changes.push(PathChange::Added {
                path: path.clone(),
                methods: new.methods(path),
            });
        }

        for path in old_paths.difference(&new_paths) {
            for method in old.methods(path) {
                tracing::debug!(path = %path, %method, "path removed");
                changes.push(PathChange::MethodRemoved {
                    operation: OperationId::new(path.clone(), method),
                    path_deleted: true,
                });
            }
        }

        for path in old_paths.intersection(&new_paths) {
            let surviving = new.methods(path);
            let removed: BTreeSet<MethodKey> =
                old.methods(path).difference(&surviving).cloned().collect();

            // Removed methods are reported as deletions, not as an update
            let before = old
                .path_item(path)
                .map(|item| without_methods(item, &removed))
                .unwrap_or(Cow::Owned(Value::Null));
            let after = new.path_item(path).unwrap_or(&Value::Null);
            if !structurally_equal(&before, after) {
                tracing::debug!(path = %path, "path updated");
                changes.push(PathChange::Updated {
                    path: path.clone(),
                    before: ContentHash::of_structure(&before),
                    after: ContentHash::of_structure(after),
                });
            }

            for method in removed {
                tracing::debug!(path = %path, %method, "method removed");
                changes.push(PathChange::MethodRemoved {
                    operation: OperationId::new(path.clone(), method),
                    path_deleted: false,
                });
            }
        }

        changes.sort_by(|a, b| a.path().cmp(b.path()));
        changes
    }
}

/// Path item with the given operations dropped
fn without_methods<'a>(item: &'a Value, methods: &BTreeSet<MethodKey>) -> Cow<'a, Value> {
    match item {
        Value::Object(map) if !methods.is_empty() => Cow::Owned(Value::Object(
            map.iter()
                .filter(|(key, _)| !methods.contains(&MethodKey::new(key.as_str())))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )),
        _ => Cow::Borrowed(item),
    }
}
