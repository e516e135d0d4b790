//! Fragment extraction
//!
//! Cuts a resolved document into one standalone JSON file per operation.
//! A run writes into its own fresh directory; a fragment that fails to
//! serialize or write is logged and recorded, and the batch continues.
//!
//! The run manifest is written next to the run directory, as
//! `<run dir>.manifest.json`, so the directory itself holds fragments only.

use crate::error::ExtractError;
use crate::run::RunId;
use apidelta_spec::{ContentHash, Fragment, FragmentContext, OperationId, PathKey, SpecDocument};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Which operations an extraction covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Every operation
    Full,
    /// Operations of added or updated paths
    Selective,
}

/// One fragment written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFragment {
    /// Source operation
    pub operation: OperationId,
    /// File name stem
    pub slug: String,
    /// Written file
    pub file: PathBuf,
    /// Blake3 checksum of the bytes written
    pub checksum: ContentHash,
}

/// One fragment that could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentFailure {
    /// Source operation
    pub operation: OperationId,
    /// Rendered error
    pub error: String,
}

/// Outcome of one extraction pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Run the fragments belong to
    pub run_id: String,
    /// Mode used
    pub mode: ExtractionMode,
    /// Directory holding the fragments
    pub output_dir: PathBuf,
    /// Fragments written, in document order
    pub written: Vec<WrittenFragment>,
    /// Fragments skipped after an error
    pub failed: Vec<FragmentFailure>,
}

impl ExtractionReport {
    /// Number of fragments written
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.written.len()
    }

    /// Nothing was written
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// Fragment files in write order
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.written.iter().map(|w| w.file.as_path())
    }

    /// A successful write replaces any earlier entry with the same slug;
    /// a failed one leaves it in place
    fn record(&mut self, operation: &OperationId, outcome: Result<WrittenFragment, ExtractError>) {
        match outcome {
            Ok(written) => {
                tracing::debug!(file = %written.file.display(), "wrote fragment");
                self.written.retain(|w| w.slug != written.slug);
                self.written.push(written);
            }
            Err(e) => {
                tracing::error!(operation = %operation, error = %e, "fragment skipped");
                self.failed.push(FragmentFailure {
                    operation: operation.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Writes per-operation fragments into one run directory
#[derive(Debug, Clone)]
pub struct FragmentExtractor {
    run_id: RunId,
    output_dir: PathBuf,
    context: FragmentContext,
}

impl FragmentExtractor {
    /// Create the run directory under `root`
    ///
    /// `root` is created if needed; the run directory itself must not exist.
    ///
    /// # Errors
    /// Returns [`ExtractError::OutputDir`] if either directory cannot be created
    pub async fn create(
        root: &Path,
        run_id: RunId,
        context: FragmentContext,
    ) -> Result<Self, ExtractError> {
        let output_dir = run_id.output_dir(root);
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|source| ExtractError::OutputDir {
                path: root.to_path_buf(),
                source,
            })?;
        tokio::fs::create_dir(&output_dir)
            .await
            .map_err(|source| ExtractError::OutputDir {
                path: output_dir.clone(),
                source,
            })?;
        tracing::debug!(dir = %output_dir.display(), "created run directory");
        Ok(Self {
            run_id,
            output_dir,
            context,
        })
    }

    /// Directory receiving fragments
    #[inline]
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the run manifest
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        let mut name = self.output_dir.as_os_str().to_os_string();
        name.push(".manifest.json");
        PathBuf::from(name)
    }

    /// Extract every operation in `doc`
    ///
    /// # Errors
    /// Returns [`ExtractError::Manifest`] if the manifest cannot be written;
    /// per-fragment failures are reported, not returned
    pub async fn extract_all(&self, doc: &SpecDocument) -> Result<ExtractionReport, ExtractError> {
        self.extract(doc, ExtractionMode::Full, |_| true).await
    }

    /// Extract operations of paths in `added ∪ updated`
    ///
    /// # Errors
    /// Same as [`FragmentExtractor::extract_all`]
    pub async fn extract_selected(
        &self,
        doc: &SpecDocument,
        added: &BTreeSet<PathKey>,
        updated: &BTreeSet<PathKey>,
    ) -> Result<ExtractionReport, ExtractError> {
        self.extract(doc, ExtractionMode::Selective, |path| {
            added.contains(path) || updated.contains(path)
        })
        .await
    }

    async fn extract(
        &self,
        doc: &SpecDocument,
        mode: ExtractionMode,
        include: impl Fn(&PathKey) -> bool,
    ) -> Result<ExtractionReport, ExtractError> {
        let mut report = ExtractionReport {
            run_id: self.run_id.to_string(),
            mode,
            output_dir: self.output_dir.clone(),
            written: Vec::new(),
            failed: Vec::new(),
        };
        let mut seen = HashSet::new();

        for op in doc.operations().into_iter().filter(|op| include(&op.id.path)) {
            let fragment = Fragment::from_operation(doc, &op, self.context);
            let slug = op.id.slug();
            if !seen.insert(slug.clone()) {
                tracing::warn!(slug = %slug, operation = %op.id, "slug collision, overwriting earlier fragment");
            }
            let outcome = self.write_fragment(&fragment).await;
            report.record(&op.id, outcome);
        }

        self.write_manifest(&report).await?;
        tracing::info!(
            mode = ?mode,
            written = report.written.len(),
            failed = report.failed.len(),
            dir = %self.output_dir.display(),
            "extraction finished"
        );
        Ok(report)
    }

    async fn write_fragment(&self, fragment: &Fragment) -> Result<WrittenFragment, ExtractError> {
        let slug = fragment.id().slug();
        let content = fragment
            .to_json_pretty()
            .map_err(|source| ExtractError::Serialize {
                slug: slug.clone(),
                source,
            })?;
        let file = self.output_dir.join(fragment.file_name());
        tokio::fs::write(&file, content.as_bytes())
            .await
            .map_err(|source| ExtractError::FragmentWrite {
                path: file.clone(),
                source,
            })?;
        Ok(WrittenFragment {
            operation: fragment.id().clone(),
            slug,
            file,
            checksum: ContentHash::compute(content.as_bytes()),
        })
    }

    async fn write_manifest(&self, report: &ExtractionReport) -> Result<(), ExtractError> {
        let path = self.manifest_path();
        let content = serde_json::to_string_pretty(report).map_err(|e| ExtractError::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ExtractError::Manifest {
                path,
                message: e.to_string(),
            })
    }
}
