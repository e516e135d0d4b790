//! Stale artifact removal
//!
//! Removes generated files whose name starts with the slug of a deleted
//! operation. Deleted slugs are indexed in a radix trie so each file name
//! needs a single ancestor lookup regardless of how many slugs there are.

use radix_trie::{Trie, TrieCommon};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Files removed
    pub removed: Vec<PathBuf>,
    /// Files that matched but could not be removed, with the error
    pub failed: Vec<(PathBuf, String)>,
}

/// Deletes artifacts of removed operations from one directory
#[derive(Debug)]
pub struct ArtifactPruner {
    slugs: Trie<String, ()>,
}

impl ArtifactPruner {
    /// Index the slugs to prune
    #[must_use]
    pub fn new<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut trie = Trie::new();
        for slug in slugs {
            let slug = slug.into();
            if !slug.is_empty() {
                trie.insert(slug, ());
            }
        }
        Self { slugs: trie }
    }

    /// Whether any slug is indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    /// Whether `file_name` starts with an indexed slug
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.slugs.get_ancestor_value(file_name).is_some()
    }

    /// Remove matching regular files directly inside `dir`
    ///
    /// Subdirectories are skipped. A missing or unreadable directory is
    /// logged and yields an empty report; a file that cannot be removed is
    /// logged and the sweep continues.
    pub async fn prune(&self, dir: &Path) -> PruneReport {
        let mut report = PruneReport::default();
        if self.is_empty() {
            return report;
        }

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot read artifact directory, nothing pruned");
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "artifact listing interrupted");
                    break;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !self.matches(name) {
                continue;
            }
            match entry.file_type().await {
                Ok(kind) if kind.is_file() => {}
                _ => continue,
            }

            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::info!(file = %path.display(), "removed stale artifact");
                    report.removed.push(path);
                }
                Err(e) => {
                    tracing::error!(file = %path.display(), error = %e, "failed to remove stale artifact");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        report.removed.sort();
        report
    }
}
