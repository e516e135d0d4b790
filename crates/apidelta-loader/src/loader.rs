//! Spec loader - main entry point
//!
//! File → parser (by extension) → plain tree → `$ref` resolution →
//! [`SpecDocument`].

use crate::error::{LoadError, ResolveError};
use crate::parsers::{extension_of, ParserRegistry, SpecParser};
use crate::resolve::resolve_refs;
use apidelta_spec::{DocumentError, SpecDocument};
use std::path::Path;

/// Default size cap for a single spec file (bytes)
pub const DEFAULT_MAX_FILE_SIZE: usize = 32 * 1024 * 1024;

/// Loads spec files into reference-resolved documents
#[derive(Debug, Clone)]
pub struct SpecLoader {
    /// Registered parsers by file extension
    parsers: ParserRegistry,
    /// Maximum file size to parse (bytes)
    max_file_size: usize,
}

impl Default for SpecLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecLoader {
    /// Create loader with the JSON and YAML parsers
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: crate::parsers::default_parsers(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Override the file size cap
    #[inline]
    #[must_use]
    pub fn with_max_file_size(mut self, max: usize) -> Self {
        self.max_file_size = max;
        self
    }

    /// Extensions this loader accepts
    #[must_use]
    pub fn extensions(&self) -> Vec<&str> {
        self.parsers.all_extensions()
    }

    /// Read and resolve a spec file
    ///
    /// # Errors
    /// - `LoadError::UnsupportedFormat` if no parser handles the extension
    /// - `LoadError::Io` if the file cannot be read
    /// - `LoadError::Syntax` if the content is not valid JSON/YAML
    /// - `LoadError::EmptyOrInvalidSpec` if the root is null or empty
    /// - `LoadError::UnresolvedReference` if an internal `$ref` names nothing
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<SpecDocument, LoadError> {
        let path = path.as_ref();
        // Reject by extension before touching the disk
        self.check_format(path)?;

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LoadError::io_error(path, e))?;

        let doc = self.load_str(path, &content)?;
        tracing::info!(
            path = %path.display(),
            paths = doc.path_keys().len(),
            "loaded spec"
        );
        Ok(doc)
    }

    /// Parse and resolve already-read content; `path` selects the parser
    /// and labels errors
    ///
    /// # Errors
    /// Same as [`SpecLoader::load`], minus IO
    pub fn load_str(&self, path: &Path, content: &str) -> Result<SpecDocument, LoadError> {
        if content.len() > self.max_file_size {
            return Err(LoadError::TooLarge {
                path: path.to_path_buf(),
                size: content.len(),
                max: self.max_file_size,
            });
        }

        let parser = self.check_format(path)?;
        let raw = parser
            .parse(content)
            .map_err(|failure| LoadError::syntax_error(path, failure))?;

        // Checked before resolution so the error reads as "empty", not "unresolved"
        SpecDocument::new(raw.clone()).map_err(|e| invalid(path, &e))?;

        let resolved = resolve_refs(&raw).map_err(|e| match e {
            ResolveError::Unresolved(reference) => LoadError::UnresolvedReference {
                path: path.to_path_buf(),
                reference,
            },
        })?;
        if resolved.cycles > 0 {
            tracing::warn!(
                path = %path.display(),
                cycles = resolved.cycles,
                "self-referential schemas left as $ref back-edges"
            );
        }
        if resolved.external > 0 {
            tracing::debug!(
                path = %path.display(),
                external = resolved.external,
                "external references left untouched"
            );
        }

        SpecDocument::new(resolved.value).map_err(|e| invalid(path, &e))
    }

    fn check_format(&self, path: &Path) -> Result<&dyn SpecParser, LoadError> {
        self.parsers
            .find_for_path(path)
            .ok_or_else(|| LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension_of(path).unwrap_or_default(),
            })
    }
}

fn invalid(path: &Path, err: &DocumentError) -> LoadError {
    LoadError::EmptyOrInvalidSpec {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
