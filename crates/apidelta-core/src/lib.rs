//! apidelta core - incremental reconciliation of API specs
//!
//! Given a folder of timestamped OpenAPI revisions, a run:
//! - picks the two latest revisions (or the sole one on a first run)
//! - loads and diffs them path by path
//! - writes one standalone fragment per added or updated operation
//! - prunes generated tests of operations that disappeared
//! - hands each new fragment to a test generator
//!
//! # Example
//!
//! ```rust,no_run
//! use apidelta_core::{PipelineConfig, ReconciliationDriver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new()
//!     .with_spec_folder("specs")
//!     .with_target_folder("api-tests");
//!
//! let report = ReconciliationDriver::new(config).run().await?;
//! println!("{} fragments written", report.fragment_count());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod generate;
pub mod prune;
pub mod revision;
pub mod run;
pub mod state;

pub use config::{PipelineConfig, TargetLanguage, DEFAULT_PREFIX, DEFAULT_TESTS_DIR};
pub use driver::{GenerationFailure, ReconciliationDriver, RunReport};
pub use error::{ConfigError, ExtractError, GenerateError, PipelineError, RevisionError};
pub use extract::{
    ExtractionMode, ExtractionReport, FragmentExtractor, FragmentFailure, WrittenFragment,
};
pub use generate::{
    build_prompt, strip_code_fences, CommandLlmClient, GeneratedArtifact, LlmClient,
    LlmTestGenerator, TestGenerator, DEFAULT_LLM_TIMEOUT_SECS,
};
pub use prune::{ArtifactPruner, PruneReport};
pub use revision::{parse_timestamp, Revision, RevisionSelector, Selection, SPEC_EXTENSIONS};
pub use run::RunId;
pub use state::{allowed_transitions, validate_transition, DriverState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a reconciliation
    pub use crate::{
        ArtifactPruner, DriverState, FragmentExtractor, LlmClient, LlmTestGenerator,
        PipelineConfig, ReconciliationDriver, RevisionSelector, RunId, RunReport,
        TargetLanguage, TestGenerator,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
