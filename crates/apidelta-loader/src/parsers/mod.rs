//! Spec parsers for the accepted file formats
//!
//! Both formats produce a plain `serde_json::Value` tree:
//! - JSON (`.json`) via serde_json, falling back to YAML
//! - YAML (`.yaml`, `.yml`) via serde_yaml

use crate::error::ParseFailure;
use serde_json::Value;
use std::path::Path;

mod json;
mod yaml;

pub use json::JsonParser;
pub use yaml::{yaml_to_json, YamlParser};

/// Parser trait for turning file content into a document tree
///
/// An empty input parses to `Value::Null`; deciding whether that is an
/// acceptable document is the loader's job.
pub trait SpecParser: Send + Sync + 'static {
    /// Parse content string into a tree
    fn parse(&self, content: &str) -> Result<Value, ParseFailure>;

    /// Supported file extensions (without dot, lowercase)
    fn extensions(&self) -> &[&str];

    /// Check if this parser can handle the given path
    fn can_parse(&self, path: &Path) -> bool {
        extension_of(path)
            .map(|ext| self.extensions().contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// Lowercased extension of `path`
#[must_use]
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Parsers keyed by extension
pub struct ParserRegistry {
    parsers: Vec<Box<dyn SpecParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        default_parsers()
    }
}

impl Clone for ParserRegistry {
    fn clone(&self) -> Self {
        // Parsers are stateless
        default_parsers()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("extensions", &self.all_extensions())
            .finish()
    }
}

impl ParserRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Register a parser
    pub fn register<P: SpecParser>(&mut self, parser: P) {
        self.parsers.push(Box::new(parser));
    }

    /// Find parser for path
    #[must_use]
    pub fn find_for_path(&self, path: &Path) -> Option<&dyn SpecParser> {
        self.parsers.iter().find(|p| p.can_parse(path)).map(|p| &**p)
    }

    /// Get all registered extensions
    #[must_use]
    pub fn all_extensions(&self) -> Vec<&str> {
        self.parsers
            .iter()
            .flat_map(|p| p.extensions())
            .copied()
            .collect()
    }
}

/// Registry with the JSON and YAML parsers
#[inline]
#[must_use]
pub fn default_parsers() -> ParserRegistry {
    let mut registry = ParserRegistry::new();
    registry.register(JsonParser);
    registry.register(YamlParser);
    registry
}
