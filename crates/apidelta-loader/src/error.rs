//! Error types for spec loading
//!
//! Every load failure is fatal to the run that requested it, so each variant
//! names the offending file.

use std::path::PathBuf;

/// Errors turning a file into a [`SpecDocument`](apidelta_spec::SpecDocument)
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Extension outside the accepted set
    #[error("unsupported spec format '{extension}' for {path} (expected json, yaml or yml)")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Content is not valid JSON/YAML
    #[error("syntax error in {path}: {message}")]
    Syntax { path: PathBuf, message: String },

    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parsed root is null, empty or not a mapping
    #[error("spec {path} is empty or invalid: {reason}")]
    EmptyOrInvalidSpec { path: PathBuf, reason: String },

    /// Internal `$ref` points at nothing
    #[error("unresolved reference '{reference}' in {path}")]
    UnresolvedReference { path: PathBuf, reference: String },

    /// File exceeds the configured size cap
    #[error("spec {path} is too large: {size} bytes (max: {max})")]
    TooLarge { path: PathBuf, size: usize, max: usize },
}

impl LoadError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create syntax error for path
    pub fn syntax_error(path: impl Into<PathBuf>, failure: ParseFailure) -> Self {
        Self::Syntax {
            path: path.into(),
            message: failure.0,
        }
    }
}

/// Parser-level failure; the loader attaches the file path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseFailure(pub String);

/// Reference resolution failure; the loader attaches the file path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Pointer does not name a node in the document
    #[error("unresolved reference '{0}'")]
    Unresolved(String),
}
