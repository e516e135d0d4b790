//! Aggregated diff outcome

use crate::change::PathChange;
use apidelta_spec::PathKey;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Three-way classification of changes between two revisions
///
/// # Invariants
/// - `added` and `updated` are disjoint
/// - `deleted` holds operation slugs, not path templates; a path may appear
///   in `updated` while some of its methods appear in `deleted`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// Paths only in the newer revision
    pub added: BTreeSet<PathKey>,
    /// Slugs of operations removed from the newer revision
    pub deleted: BTreeSet<String>,
    /// Paths in both revisions whose subtree changed
    pub updated: BTreeSet<PathKey>,
}

impl DiffResult {
    /// Fold a change listing into the three sets
    #[must_use]
    pub fn from_changes<'a>(changes: impl IntoIterator<Item = &'a PathChange>) -> Self {
        let mut result = Self::default();
        for change in changes {
            match change {
                PathChange::Added { path, .. } => {
                    result.added.insert(path.clone());
                }
                PathChange::Updated { path, .. } => {
                    result.updated.insert(path.clone());
                }
                PathChange::MethodRemoved { operation, .. } => {
                    result.deleted.insert(operation.slug());
                }
            }
        }
        result
    }

    /// No changes of any kind
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }

    /// Whether any path needs fragments re-extracted
    #[inline]
    #[must_use]
    pub fn needs_extraction(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty()
    }

    /// `added ∪ updated`
    #[must_use]
    pub fn paths_to_extract(&self) -> BTreeSet<PathKey> {
        self.added.union(&self.updated).cloned().collect()
    }
}

impl Display for DiffResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} updated, {} deleted",
            self.added.len(),
            self.updated.len(),
            self.deleted.len()
        )
    }
}
