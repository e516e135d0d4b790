//! Error types for the reconciliation pipeline
//!
//! Fatal errors abort the run:
//! - revision selection failures
//! - spec load failures (re-exported from `apidelta-loader`)
//! - run directory creation failures
//! - configuration errors
//!
//! Per-fragment write and generation failures are recorded in the run
//! report instead of being propagated.

use crate::state::DriverState;
use apidelta_loader::LoadError;
use std::path::PathBuf;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Revision selection failed
    #[error("revision selection failed: {0}")]
    Revision(#[from] RevisionError),

    /// A spec could not be loaded
    #[error("spec load failed: {0}")]
    Load(#[from] LoadError),

    /// Extraction could not start
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Driver attempted a move its transition table forbids
    #[error("illegal driver transition {from:?} -> {to:?}")]
    IllegalTransition { from: DriverState, to: DriverState },
}

/// Errors choosing revisions from a spec folder
#[derive(Debug, thiserror::Error)]
pub enum RevisionError {
    /// Folder holds no matching spec files
    #[error("no spec files matching '{prefix}*.{{json,yaml,yml}}' in {folder}")]
    NoCandidates { folder: PathBuf, prefix: String },

    /// File name lacks a `YYYYMMDD_HHMMSS` timestamp
    #[error("cannot parse a YYYYMMDD_HHMMSS timestamp from {path}")]
    UnparseableTimestamp { path: PathBuf },

    /// Folder could not be listed
    #[error("cannot read spec folder {folder}: {source}")]
    Io {
        folder: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fragment extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Run directory could not be created (fatal)
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One fragment could not be written (recovered)
    #[error("failed to write fragment {path}: {source}")]
    FragmentWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One fragment could not be serialized (recovered)
    #[error("failed to serialize fragment {slug}: {source}")]
    Serialize {
        slug: String,
        #[source]
        source: serde_json::Error,
    },

    /// Run manifest could not be written (fatal)
    #[error("failed to write manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },
}

impl ExtractError {
    /// Whether the batch continues past this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FragmentWrite { .. } | Self::Serialize { .. })
    }
}

/// Test generation errors, recovered per fragment
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Fragment file unreadable
    #[error("cannot read fragment {path}: {source}")]
    ReadFragment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// LLM command could not be started
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Talking to the LLM command over its pipes failed
    #[error("i/o with '{command}' failed: {source}")]
    Pipe {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// LLM command exited unsuccessfully
    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// LLM command exceeded its time limit
    #[error("'{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// Model-side failure reported by a client
    #[error("llm request failed: {0}")]
    Llm(String),

    /// Completion had no code in it
    #[error("empty completion for {slug}")]
    EmptyCompletion { slug: String },

    /// Generated file could not be written
    #[error("cannot write test artifact {path}: {source}")]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`PipelineConfig`](crate::PipelineConfig)
    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Required setting left empty
    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    /// Language name outside the supported set
    #[error("unknown target language '{0}' (expected javascript or typescript)")]
    UnknownLanguage(String),
}
