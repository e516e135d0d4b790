//! Reconciliation driver
//!
//! One [`ReconciliationDriver::run`] walks the machine in [`crate::state`]:
//!
//! ```text
//! Init ──(sole revision)──▶ FullExtract ──▶ Done
//!   │                          ▲
//!   └──▶ Compare ──(--full)────┘
//!          ├──(added/updated)──▶ SelectiveExtract ──▶ Done
//!          └──(nothing to extract)───────────────────▶ Done
//! ```
//!
//! In `Done`, deleted operations are pruned from the tests directory first,
//! then every fragment written this run is handed to the generator once.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::extract::{ExtractionReport, FragmentExtractor};
use crate::generate::{GeneratedArtifact, TestGenerator};
use crate::prune::{ArtifactPruner, PruneReport};
use crate::revision::{RevisionSelector, Selection};
use crate::run::RunId;
use crate::state::{validate_transition, DriverState};
use apidelta_diff::{DiffResult, PathDiffer};
use apidelta_loader::SpecLoader;
use apidelta_spec::SpecDocument;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Generation failure for one fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationFailure {
    /// Fragment that failed
    pub fragment: PathBuf,
    /// Rendered error
    pub error: String,
}

/// Outcome of one pipeline execution
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Run identity
    pub run_id: RunId,
    /// States visited, starting with `Init`
    pub states: Vec<DriverState>,
    /// Revisions the run worked on
    pub selection: Selection,
    /// Diff, when two revisions were compared
    pub diff: Option<DiffResult>,
    /// Extraction, when fragments were written
    pub extraction: Option<ExtractionReport>,
    /// Stale artifacts removed
    pub pruned: PruneReport,
    /// Test artifacts produced
    pub generated: Vec<GeneratedArtifact>,
    /// Fragments the generator failed on
    pub generation_failures: Vec<GenerationFailure>,
}

impl RunReport {
    /// Last state reached
    #[must_use]
    pub fn final_state(&self) -> DriverState {
        self.states.last().copied().unwrap_or(DriverState::Init)
    }

    /// Fragments written this run
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.extraction.as_ref().map_or(0, ExtractionReport::len)
    }

    /// No per-item failure was recorded anywhere
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.extraction.as_ref().map_or(true, |e| e.failed.is_empty())
            && self.pruned.failed.is_empty()
            && self.generation_failures.is_empty()
    }
}

/// Visited states, every move checked against the transition table
#[derive(Debug)]
struct Trace {
    states: Vec<DriverState>,
}

impl Trace {
    fn new() -> Self {
        Self {
            states: vec![DriverState::Init],
        }
    }

    fn current(&self) -> DriverState {
        self.states.last().copied().unwrap_or(DriverState::Init)
    }

    fn advance(&mut self, to: DriverState) -> Result<(), PipelineError> {
        let from = self.current();
        validate_transition(from, to)?;
        tracing::debug!(?from, ?to, "driver transition");
        self.states.push(to);
        Ok(())
    }
}

/// Runs one reconciliation over a spec folder
pub struct ReconciliationDriver {
    config: PipelineConfig,
    loader: SpecLoader,
    differ: PathDiffer,
    generator: Option<Arc<dyn TestGenerator>>,
}

impl std::fmt::Debug for ReconciliationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationDriver")
            .field("config", &self.config)
            .field("loader", &self.loader)
            .field("generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}

impl ReconciliationDriver {
    /// Create driver without a generator
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            loader: SpecLoader::new(),
            differ: PathDiffer::new(),
            generator: None,
        }
    }

    /// Hand written fragments to `generator`
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TestGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replace the spec loader
    #[must_use]
    pub fn with_loader(mut self, loader: SpecLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run under a fresh [`RunId`]
    ///
    /// # Errors
    /// See [`ReconciliationDriver::run_as`]
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        self.run_as(RunId::new()).await
    }

    /// Run under `run_id`
    ///
    /// # Errors
    /// Fails on invalid configuration, revision selection, any spec load
    /// failure and when the run directory or manifest cannot be written.
    /// Per-fragment, per-file and per-artifact failures land in the report.
    pub async fn run_as(&self, run_id: RunId) -> Result<RunReport, PipelineError> {
        self.config.validate()?;
        tracing::info!(
            run = %run_id,
            specs = %self.config.spec_folder.display(),
            prefix = %self.config.prefix,
            "starting reconciliation"
        );

        let mut trace = Trace::new();
        let selection = RevisionSelector::new(self.config.prefix.clone())
            .select(&self.config.spec_folder)
            .await?;

        let mut diff = None;
        let extraction = match &selection.previous {
            None => {
                trace.advance(DriverState::FullExtract)?;
                tracing::info!(
                    spec = %selection.current.path.display(),
                    "no previous revision, extracting every operation"
                );
                let doc = self.loader.load(&selection.current.path).await?;
                Some(self.extract_full(run_id, &doc).await?)
            }
            Some(previous) => {
                trace.advance(DriverState::Compare)?;
                let old = self.loader.load(&previous.path).await?;
                let new = self.loader.load(&selection.current.path).await?;
                let result = self.differ.diff(&old, &new);
                let extraction = self.after_compare(&mut trace, run_id, &new, &result).await?;
                diff = Some(result);
                extraction
            }
        };
        trace.advance(DriverState::Done)?;

        let pruned = match &diff {
            Some(d) if !d.deleted.is_empty() => {
                ArtifactPruner::new(d.deleted.iter().map(String::as_str))
                    .prune(&self.config.tests_path())
                    .await
            }
            _ => PruneReport::default(),
        };

        let (generated, generation_failures) = match (&self.generator, &extraction) {
            (Some(generator), Some(extraction)) => {
                self.generate_all(generator.as_ref(), extraction).await
            }
            _ => (Vec::new(), Vec::new()),
        };

        let report = RunReport {
            run_id,
            states: trace.states,
            selection,
            diff,
            extraction,
            pruned,
            generated,
            generation_failures,
        };
        tracing::info!(
            run = %run_id,
            fragments = report.fragment_count(),
            pruned = report.pruned.removed.len(),
            generated = report.generated.len(),
            clean = report.is_clean(),
            "reconciliation finished"
        );
        Ok(report)
    }

    async fn after_compare(
        &self,
        trace: &mut Trace,
        run_id: RunId,
        new: &SpecDocument,
        diff: &DiffResult,
    ) -> Result<Option<ExtractionReport>, PipelineError> {
        if self.config.force_full {
            trace.advance(DriverState::FullExtract)?;
            tracing::info!("full extraction forced");
            return Ok(Some(self.extract_full(run_id, new).await?));
        }
        if !diff.needs_extraction() {
            tracing::info!(deleted = diff.deleted.len(), "no added or updated paths, nothing to extract");
            return Ok(None);
        }

        trace.advance(DriverState::SelectiveExtract)?;
        let extractor =
            FragmentExtractor::create(&self.config.fragment_root, run_id, self.config.fragment_context())
                .await?;
        Ok(Some(
            extractor
                .extract_selected(new, &diff.added, &diff.updated)
                .await?,
        ))
    }

    async fn extract_full(
        &self,
        run_id: RunId,
        doc: &SpecDocument,
    ) -> Result<ExtractionReport, PipelineError> {
        let extractor =
            FragmentExtractor::create(&self.config.fragment_root, run_id, self.config.fragment_context())
                .await?;
        Ok(extractor.extract_all(doc).await?)
    }

    async fn generate_all(
        &self,
        generator: &dyn TestGenerator,
        extraction: &ExtractionReport,
    ) -> (Vec<GeneratedArtifact>, Vec<GenerationFailure>) {
        let mut generated = Vec::with_capacity(extraction.len());
        let mut failures = Vec::new();

        for fragment in extraction.files() {
            match generator.generate(fragment, self.config.language).await {
                Ok(artifact) => generated.push(artifact),
                Err(e) => {
                    tracing::error!(fragment = %fragment.display(), error = %e, "test generation failed");
                    failures.push(GenerationFailure {
                        fragment: fragment.to_path_buf(),
                        error: e.to_string(),
                    });
                }
            }
        }
        (generated, failures)
    }
}
