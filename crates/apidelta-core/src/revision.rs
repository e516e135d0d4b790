//! Revision selection
//!
//! Picks the spec files to compare out of a folder of timestamped exports
//! named `<prefix>..._<YYYYMMDD>_<HHMMSS>.<json|yaml|yml>`.

use crate::error::RevisionError;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Accepted spec file extensions
pub const SPEC_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{8}_\d{6})").expect("timestamp pattern is valid"));

/// One timestamped spec file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    /// Spec file
    pub path: PathBuf,
    /// Timestamp embedded in the file name; absent only for a sole revision
    pub timestamp: Option<NaiveDateTime>,
}

impl Revision {
    /// Build a revision by parsing the file name
    ///
    /// # Errors
    /// Returns [`RevisionError::UnparseableTimestamp`] if the name carries no
    /// valid `YYYYMMDD_HHMMSS` stamp
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, RevisionError> {
        let path = path.into();
        match parse_timestamp(&path) {
            Some(timestamp) => Ok(Self {
                path,
                timestamp: Some(timestamp),
            }),
            None => Err(RevisionError::UnparseableTimestamp { path }),
        }
    }

    /// File name for logs and ordering ties
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Revisions chosen for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Latest revision
    pub current: Revision,
    /// Second-latest revision; `None` on a first run
    pub previous: Option<Revision>,
}

impl Selection {
    /// Whether only one revision exists
    #[inline]
    #[must_use]
    pub fn is_first_run(&self) -> bool {
        self.previous.is_none()
    }
}

/// Scans a spec folder for revisions
#[derive(Debug, Clone)]
pub struct RevisionSelector {
    prefix: String,
}

impl Default for RevisionSelector {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PREFIX)
    }
}

impl RevisionSelector {
    /// Create selector for files starting with `prefix`
    #[inline]
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// File name prefix
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Matching spec files in `folder`, sorted by file name
    ///
    /// # Errors
    /// Returns [`RevisionError::Io`] if the folder cannot be listed
    pub async fn candidates(&self, folder: &Path) -> Result<Vec<PathBuf>, RevisionError> {
        let io_err = |source| RevisionError::Io {
            folder: folder.to_path_buf(),
            source,
        };
        let mut entries = tokio::fs::read_dir(folder).await.map_err(io_err)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if !self.matches(&path) {
                continue;
            }
            let is_file = entry.file_type().await.map_err(io_err)?.is_file();
            if is_file {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Select the latest revision and, when present, the one before it
    ///
    /// A single matching file is returned as the sole revision whether or not
    /// its name carries a timestamp. With two or more, every file must carry
    /// one; files sharing a timestamp are ordered by name.
    ///
    /// # Errors
    /// - [`RevisionError::NoCandidates`] if nothing matches
    /// - [`RevisionError::UnparseableTimestamp`] if any of several files lacks a timestamp
    /// - [`RevisionError::Io`] if the folder cannot be listed
    pub async fn select(&self, folder: &Path) -> Result<Selection, RevisionError> {
        let mut files = self.candidates(folder).await?;
        tracing::debug!(folder = %folder.display(), count = files.len(), "spec candidates");

        if files.len() <= 1 {
            let Some(path) = files.pop() else {
                return Err(RevisionError::NoCandidates {
                    folder: folder.to_path_buf(),
                    prefix: self.prefix.clone(),
                });
            };
            tracing::info!(current = %path.display(), "single revision, full extraction");
            let timestamp = parse_timestamp(&path);
            return Ok(Selection {
                current: Revision { path, timestamp },
                previous: None,
            });
        }

        let mut revisions = files
            .into_iter()
            .map(Revision::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        revisions.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.file_name().cmp(b.file_name()))
        });

        let (Some(current), Some(previous)) = (revisions.pop(), revisions.pop()) else {
            return Err(RevisionError::NoCandidates {
                folder: folder.to_path_buf(),
                prefix: self.prefix.clone(),
            });
        };
        if current.timestamp == previous.timestamp {
            tracing::warn!(
                previous = previous.file_name(),
                current = current.file_name(),
                "revisions share a timestamp, ordering by file name"
            );
        }
        tracing::info!(
            previous = %previous.path.display(),
            current = %current.path.display(),
            "selected revisions"
        );
        Ok(Selection {
            current,
            previous: Some(previous),
        })
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.starts_with(&self.prefix)
            && apidelta_loader::parsers::extension_of(path)
                .is_some_and(|ext| SPEC_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Timestamp embedded in a file name
#[must_use]
pub fn parse_timestamp(path: &Path) -> Option<NaiveDateTime> {
    let name = path.file_name()?.to_str()?;
    let stamp = TIMESTAMP_RE.captures(name)?.get(1)?.as_str();
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "{}").unwrap();
        path
    }

    #[test]
    fn parses_embedded_timestamp() {
        let ts = parse_timestamp(Path::new("specs/Swagger_petstore_20240215_093000.yaml")).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 2, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(ts, expected);
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(parse_timestamp(Path::new("Swagger_20241399_000000.json")).is_none());
        assert!(parse_timestamp(Path::new("Swagger_latest.json")).is_none());
    }

    #[tokio::test]
    async fn empty_folder_has_no_candidates() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "README.md");
        touch(dir.path(), "Other_20240101_000000.json");
        let err = RevisionSelector::default().select(dir.path()).await.unwrap_err();
        assert!(matches!(err, RevisionError::NoCandidates { .. }));
    }

    #[tokio::test]
    async fn single_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let only = touch(dir.path(), "Swagger.yaml");
        let selection = RevisionSelector::default().select(dir.path()).await.unwrap();
        assert!(selection.is_first_run());
        assert_eq!(selection.current.path, only);
        assert_eq!(selection.current.timestamp, None);
    }

    #[tokio::test]
    async fn picks_two_latest_by_timestamp_not_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Swagger_b_20240101_000000.json");
        let older = touch(dir.path(), "Swagger_c_20240301_000000.yml");
        let newest = touch(dir.path(), "Swagger_a_20240401_120000.yaml");
        let selection = RevisionSelector::default().select(dir.path()).await.unwrap();
        assert_eq!(selection.current.path, newest);
        assert_eq!(selection.previous.unwrap().path, older);
    }

    #[tokio::test]
    async fn untimestamped_file_fails_selection() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Swagger_20240101_000000.json");
        touch(dir.path(), "Swagger_copy.json");
        let err = RevisionSelector::default().select(dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            RevisionError::UnparseableTimestamp { ref path } if path.ends_with("Swagger_copy.json")
        ));
    }

    #[tokio::test]
    async fn timestamp_tie_orders_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let first = touch(dir.path(), "Swagger_a_20240101_000000.json");
        let second = touch(dir.path(), "Swagger_b_20240101_000000.json");
        let selection = RevisionSelector::default().select(dir.path()).await.unwrap();
        assert_eq!(selection.current.path, second);
        assert_eq!(selection.previous.unwrap().path, first);
    }

    #[tokio::test]
    async fn custom_prefix_and_extension_case() {
        let dir = tempfile::tempdir().unwrap();
        let spec = touch(dir.path(), "api_20240101_000000.YAML");
        touch(dir.path(), "Swagger_20240102_000000.json");
        let selection = RevisionSelector::new("api").select(dir.path()).await.unwrap();
        assert_eq!(selection.current.path, spec);
    }

    #[tokio::test]
    async fn subdirectories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Swagger_20240101_000000.json")).unwrap();
        let err = RevisionSelector::default().select(dir.path()).await.unwrap_err();
        assert!(matches!(err, RevisionError::NoCandidates { .. }));
    }

    #[tokio::test]
    async fn missing_folder_is_io_error() {
        let err = RevisionSelector::default()
            .select(Path::new("/nonexistent/specs"))
            .await
            .unwrap_err();
        assert!(matches!(err, RevisionError::Io { .. }));
    }
}
